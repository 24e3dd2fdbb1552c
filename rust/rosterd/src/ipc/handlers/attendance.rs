use crate::calc;
use crate::dataset::Dataset;
use crate::ipc::error::HandlerErr;
use crate::ipc::handlers::records::{self, respond};
use crate::ipc::helpers::{
    optional_date, optional_enum, optional_i64, optional_str, required_date, required_i64,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{AttendanceRecord, AttendanceStatus};
use crate::query::{self, AttendanceFilter};
use crate::resolve::{self, AttendanceKey};
use crate::store::RecordStore;
use serde_json::json;

fn attendance(ds: &mut Dataset) -> &mut dyn RecordStore<AttendanceRecord> {
    ds.attendance.as_mut()
}

fn attendance_list(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let p = &req.params;
    let filter = AttendanceFilter {
        student_id: optional_i64(p, "studentId")?,
        class_id: optional_i64(p, "classId")?,
        date: optional_date(p, "date")?,
        from: optional_date(p, "from")?,
        to: optional_date(p, "to")?,
    };
    let out = query::filter_attendance(state.dataset.attendance.list()?, &filter);
    Ok(json!({
        "attendance": out,
        "revision": state.dataset.revision()
    }))
}

fn attendance_mark(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let p = &req.params;
    let key = AttendanceKey {
        student_id: required_i64(p, "studentId")?,
        class_id: required_i64(p, "classId")?,
        date: required_date(p, "date")?,
    };
    let Some(status) = optional_enum(p, "status", AttendanceStatus::parse, "present, absent, late")?
    else {
        return Err(HandlerErr::bad_params("missing status"));
    };
    let notes = optional_str(p, "notes")?;

    let upserted = resolve::mark_attendance(state.dataset.attendance.as_mut(), key, status, notes)?;
    let revision = state.dataset.touch();
    Ok(json!({
        "record": upserted.record,
        "created": upserted.created,
        "revision": revision
    }))
}

fn attendance_daily_stats(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let date = required_date(&req.params, "date")?;
    let class_id = optional_i64(&req.params, "classId")?;
    let records = state.dataset.attendance.list()?;
    let stats = calc::tally_attendance(
        records
            .iter()
            .filter(|r| r.date == date)
            .filter(|r| class_id.map_or(true, |id| r.class_id == id)),
    );
    Ok(json!({
        "date": date,
        "classId": class_id,
        "stats": stats,
        "rate": calc::attendance_rate(&stats)
    }))
}

fn handle_attendance_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(req, attendance_list(state, req))
}

fn handle_attendance_mark(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(req, attendance_mark(state, req))
}

fn handle_attendance_daily_stats(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(req, attendance_daily_stats(state, req))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.list" => Some(handle_attendance_list(state, req)),
        "attendance.get" => Some(records::handle_get(state, req, "record", attendance)),
        "attendance.create" => Some(records::handle_create(state, req, "record", attendance)),
        "attendance.update" => Some(records::handle_update(state, req, "record", attendance)),
        "attendance.delete" => Some(records::handle_delete(state, req, "record", attendance)),
        "attendance.mark" => Some(handle_attendance_mark(state, req)),
        "attendance.dailyStats" => Some(handle_attendance_daily_stats(state, req)),
        _ => None,
    }
}

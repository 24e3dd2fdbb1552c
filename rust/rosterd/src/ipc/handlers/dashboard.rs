use crate::calc::{self, Snapshot};
use crate::ipc::error::HandlerErr;
use crate::ipc::handlers::records::respond;
use crate::ipc::helpers::today;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn dashboard_summary(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let today = today(&req.params)?;
    let ds = &state.dataset;
    let students = ds.students.list()?;
    let classes = ds.classes.list()?;
    let assignments = ds.assignments.list()?;
    let grades = ds.grades.list()?;
    let attendance = ds.attendance.list()?;
    let summary = calc::dashboard_summary(
        &Snapshot {
            students: &students,
            classes: &classes,
            assignments: &assignments,
            grades: &grades,
            attendance: &attendance,
        },
        today,
    );
    Ok(json!({
        "summary": summary,
        "revision": ds.revision()
    }))
}

fn handle_dashboard_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(req, dashboard_summary(state, req))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "dashboard.summary" => Some(handle_dashboard_summary(state, req)),
        _ => None,
    }
}

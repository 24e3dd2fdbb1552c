use crate::dataset::Dataset;
use crate::ipc::error::HandlerErr;
use crate::ipc::handlers::records::{self, respond};
use crate::ipc::helpers::{optional_bool, optional_enum, optional_i64, optional_str, required_i64};
use crate::ipc::types::{AppState, Request};
use crate::model::{Student, StudentStatus};
use crate::query::{self, SortDirection, StudentFilter, StudentSortField};
use crate::resolve;
use crate::store::RecordStore;
use serde_json::json;

fn students(ds: &mut Dataset) -> &mut dyn RecordStore<Student> {
    ds.students.as_mut()
}

fn students_list(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let p = &req.params;
    let grade_level = match optional_i64(p, "gradeLevel")? {
        Some(level) => Some(
            u8::try_from(level)
                .map_err(|_| HandlerErr::bad_params("gradeLevel out of range"))?,
        ),
        None => None,
    };
    let filter = StudentFilter {
        query: optional_str(p, "query")?,
        grade_level,
        status: optional_enum(
            p,
            "status",
            StudentStatus::parse,
            "active, inactive, graduated",
        )?,
    };
    let sort_by = optional_enum(
        p,
        "sortBy",
        StudentSortField::parse,
        "firstName, lastName, studentId, gradeLevel, enrollmentDate, status, email",
    )?
    .unwrap_or_default();
    let direction =
        optional_enum(p, "direction", SortDirection::parse, "asc, desc")?.unwrap_or_default();

    let mut out = query::filter_students(state.dataset.students.list()?, &filter);
    query::sort_students(&mut out, sort_by, direction);
    Ok(json!({
        "students": out,
        "revision": state.dataset.revision()
    }))
}

fn students_delete(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let id = required_i64(&req.params, "id")?;
    let cascade = optional_bool(&req.params, "cascade")?.unwrap_or(false);
    let removal = resolve::delete_student(&mut state.dataset, id, cascade)?;
    log::info!("deleted student {} (cascade: {})", id, cascade);
    let revision = state.dataset.touch();
    Ok(json!({
        "student": removal.student,
        "gradesRemoved": removal.grades_removed,
        "attendanceRemoved": removal.attendance_removed,
        "classesUpdated": removal.classes_updated,
        "revision": revision
    }))
}

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(req, students_list(state, req))
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(req, students_delete(state, req))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.get" => Some(records::handle_get(state, req, "student", students)),
        "students.create" => Some(records::handle_create(state, req, "student", students)),
        "students.update" => Some(records::handle_update(state, req, "student", students)),
        "students.delete" => Some(handle_students_delete(state, req)),
        _ => None,
    }
}

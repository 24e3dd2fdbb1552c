use crate::dataset::Dataset;
use crate::ipc::error::HandlerErr;
use crate::ipc::handlers::records::{self, respond};
use crate::ipc::helpers::{optional_enum, optional_i64};
use crate::ipc::types::{AppState, Request};
use crate::model::{Assignment, AssignmentCategory};
use crate::query;
use crate::store::RecordStore;
use serde_json::json;

pub(crate) const CATEGORIES: &str = "homework, quiz, exam, project, participation";

fn assignments(ds: &mut Dataset) -> &mut dyn RecordStore<Assignment> {
    ds.assignments.as_mut()
}

fn assignments_list(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = optional_i64(&req.params, "classId")?;
    let category = optional_enum(&req.params, "category", AssignmentCategory::parse, CATEGORIES)?;
    let out = query::assignments_for_class(state.dataset.assignments.list()?, class_id, category);
    Ok(json!({
        "assignments": out,
        "revision": state.dataset.revision()
    }))
}

fn handle_assignments_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(req, assignments_list(state, req))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "assignments.list" => Some(handle_assignments_list(state, req)),
        "assignments.get" => Some(records::handle_get(state, req, "assignment", assignments)),
        "assignments.create" => Some(records::handle_create(state, req, "assignment", assignments)),
        "assignments.update" => Some(records::handle_update(state, req, "assignment", assignments)),
        "assignments.delete" => Some(records::handle_delete(state, req, "assignment", assignments)),
        _ => None,
    }
}

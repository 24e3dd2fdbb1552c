use crate::calc;
use crate::dataset::Dataset;
use crate::ipc::error::HandlerErr;
use crate::ipc::handlers::assignments::CATEGORIES;
use crate::ipc::handlers::records::{self, respond};
use crate::ipc::helpers::{optional_enum, optional_i64, required_f64, required_i64, today};
use crate::ipc::types::{AppState, Request};
use crate::model::{AssignmentCategory, Grade};
use crate::query;
use crate::resolve::{self, GradeKey};
use crate::store::{RecordStore, StoreError};
use serde_json::json;

fn grades(ds: &mut Dataset) -> &mut dyn RecordStore<Grade> {
    ds.grades.as_mut()
}

fn grades_list(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let student_id = optional_i64(&req.params, "studentId")?;
    let class_id = optional_i64(&req.params, "classId")?;
    let assignments = state.dataset.assignments.list()?;
    let out = query::filter_grades(state.dataset.grades.list()?, &assignments, student_id, class_id);
    Ok(json!({
        "grades": out,
        "revision": state.dataset.revision()
    }))
}

fn grades_upsert(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let key = GradeKey {
        student_id: required_i64(&req.params, "studentId")?,
        assignment_id: required_i64(&req.params, "assignmentId")?,
    };
    let score = required_f64(&req.params, "score")?;
    let today = today(&req.params)?;

    // An unknown assignment still takes a grade, on the default scale.
    let assignment = match state.dataset.assignments.get(key.assignment_id) {
        Ok(a) => Some(a),
        Err(StoreError::NotFound { .. }) => None,
        Err(e) => return Err(e.into()),
    };
    let upserted = resolve::upsert_grade(
        state.dataset.grades.as_mut(),
        key,
        score,
        assignment.as_ref(),
        today,
    )?;
    let revision = state.dataset.touch();
    Ok(json!({
        "grade": upserted.record,
        "created": upserted.created,
        "revision": revision
    }))
}

fn grades_average(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let student_id = required_i64(&req.params, "studentId")?;
    let class_id = optional_i64(&req.params, "classId")?;
    let assignments = state.dataset.assignments.list()?;
    let scoped = query::filter_grades(
        state.dataset.grades.list()?,
        &assignments,
        Some(student_id),
        class_id,
    );
    let average = calc::average_percent(&scoped);
    Ok(json!({
        "studentId": student_id,
        "classId": class_id,
        "average": average,
        "letter": average.map(|a| calc::letter_grade(a as f64)),
        "gradeCount": scoped.len()
    }))
}

fn grades_grid(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = required_i64(&req.params, "classId")?;
    let category = optional_enum(&req.params, "category", AssignmentCategory::parse, CATEGORIES)?;
    let class = state.dataset.classes.get(class_id)?;
    let grid = calc::class_grade_grid(
        &class,
        &state.dataset.students.list()?,
        &state.dataset.assignments.list()?,
        &state.dataset.grades.list()?,
        category,
    );
    Ok(json!({
        "grid": grid,
        "revision": state.dataset.revision()
    }))
}

fn handle_grades_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(req, grades_list(state, req))
}

fn handle_grades_upsert(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(req, grades_upsert(state, req))
}

fn handle_grades_average(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(req, grades_average(state, req))
}

fn handle_grades_grid(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(req, grades_grid(state, req))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.list" => Some(handle_grades_list(state, req)),
        "grades.get" => Some(records::handle_get(state, req, "grade", grades)),
        "grades.create" => Some(records::handle_create(state, req, "grade", grades)),
        "grades.update" => Some(records::handle_update(state, req, "grade", grades)),
        "grades.delete" => Some(records::handle_delete(state, req, "grade", grades)),
        "grades.upsert" => Some(handle_grades_upsert(state, req)),
        "grades.average" => Some(handle_grades_average(state, req)),
        "grades.grid" => Some(handle_grades_grid(state, req)),
        _ => None,
    }
}

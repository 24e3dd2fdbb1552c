use crate::dataset::Dataset;
use crate::ipc::error::HandlerErr;
use crate::ipc::handlers::records::{self, respond};
use crate::ipc::helpers::{optional_str, required_i64};
use crate::ipc::types::{AppState, Request};
use crate::model::SchoolClass;
use crate::query::{self, ClassFilter, SortDirection, StudentSortField};
use crate::resolve::{self, Enrollment};
use crate::store::RecordStore;
use serde_json::json;

fn classes(ds: &mut Dataset) -> &mut dyn RecordStore<SchoolClass> {
    ds.classes.as_mut()
}

fn classes_list(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let filter = ClassFilter {
        query: optional_str(&req.params, "query")?,
        term: optional_str(&req.params, "term")?,
        subject: optional_str(&req.params, "subject")?,
    };
    let out = query::filter_classes(state.dataset.classes.list()?, &filter);
    Ok(json!({
        "classes": out,
        "revision": state.dataset.revision()
    }))
}

fn enrollment_reply(state: &mut AppState, enrollment: Enrollment) -> serde_json::Value {
    // A no-op leaves the revision where it was.
    let revision = if enrollment.changed {
        state.dataset.touch()
    } else {
        state.dataset.revision()
    };
    json!({
        "class": enrollment.class,
        "changed": enrollment.changed,
        "revision": revision
    })
}

fn classes_add_student(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = required_i64(&req.params, "classId")?;
    let student_id = required_i64(&req.params, "studentId")?;
    let enrollment = resolve::enroll_student(
        state.dataset.classes.as_mut(),
        state.dataset.students.as_ref(),
        class_id,
        student_id,
    )?;
    Ok(enrollment_reply(state, enrollment))
}

fn classes_remove_student(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let class_id = required_i64(&req.params, "classId")?;
    let student_id = required_i64(&req.params, "studentId")?;
    let enrollment =
        resolve::withdraw_student(state.dataset.classes.as_mut(), class_id, student_id)?;
    Ok(enrollment_reply(state, enrollment))
}

/// Enrolled students that still exist, by last name. Enrollments pointing at
/// deleted students come back as `missingStudentIds`.
fn classes_students(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = required_i64(&req.params, "classId")?;
    let class = state.dataset.classes.get(class_id)?;
    let mut enrolled: Vec<_> = state
        .dataset
        .students
        .list()?
        .into_iter()
        .filter(|s| class.student_ids.contains(&s.id))
        .collect();
    query::sort_students(&mut enrolled, StudentSortField::LastName, SortDirection::Asc);
    let missing: Vec<i64> = class
        .student_ids
        .iter()
        .copied()
        .filter(|id| !enrolled.iter().any(|s| s.id == *id))
        .collect();
    Ok(json!({
        "classId": class_id,
        "students": enrolled,
        "missingStudentIds": missing,
        "revision": state.dataset.revision()
    }))
}

fn handle_classes_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(req, classes_list(state, req))
}

fn handle_classes_add_student(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(req, classes_add_student(state, req))
}

fn handle_classes_remove_student(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(req, classes_remove_student(state, req))
}

fn handle_classes_students(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(req, classes_students(state, req))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "classes.list" => Some(handle_classes_list(state, req)),
        "classes.get" => Some(records::handle_get(state, req, "class", classes)),
        "classes.create" => Some(records::handle_create(state, req, "class", classes)),
        "classes.update" => Some(records::handle_update(state, req, "class", classes)),
        "classes.delete" => Some(records::handle_delete(state, req, "class", classes)),
        "classes.addStudent" => Some(handle_classes_add_student(state, req)),
        "classes.removeStudent" => Some(handle_classes_remove_student(state, req)),
        "classes.students" => Some(handle_classes_students(state, req)),
        _ => None,
    }
}

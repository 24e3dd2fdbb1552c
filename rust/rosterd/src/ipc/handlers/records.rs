//! get / create / update / delete, shared by every collection.
//!
//! Each collection module passes a `pick` fn selecting its store on the
//! dataset and the key its records are returned under.

use serde_json::Value;

use crate::dataset::Dataset;
use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{parse_draft, required_i64, required_object, with_revision};
use crate::ipc::types::{AppState, Request};
use crate::store::{Record, RecordStore};

pub type Pick<R> = fn(&mut Dataset) -> &mut dyn RecordStore<R>;

/// Renders a handler body into a reply envelope.
pub fn respond(req: &Request, result: Result<Value, HandlerErr>) -> Value {
    match result {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn get<R: Record>(state: &mut AppState, req: &Request, key: &str, pick: Pick<R>) -> Result<Value, HandlerErr> {
    let id = required_i64(&req.params, "id")?;
    let record = pick(&mut state.dataset).get(id)?;
    with_revision(key, &record, state.dataset.revision())
}

fn create<R: Record>(state: &mut AppState, req: &Request, key: &str, pick: Pick<R>) -> Result<Value, HandlerErr> {
    let draft: R = parse_draft(&req.params)?;
    let record = pick(&mut state.dataset).create(draft)?;
    log::info!("created {} {}", R::KIND, record.id());
    let revision = state.dataset.touch();
    with_revision(key, &record, revision)
}

fn update<R: Record>(state: &mut AppState, req: &Request, key: &str, pick: Pick<R>) -> Result<Value, HandlerErr> {
    let id = required_i64(&req.params, "id")?;
    let patch = required_object(&req.params, "patch")?;
    let record = pick(&mut state.dataset).update(id, patch)?;
    let revision = state.dataset.touch();
    with_revision(key, &record, revision)
}

fn delete<R: Record>(state: &mut AppState, req: &Request, key: &str, pick: Pick<R>) -> Result<Value, HandlerErr> {
    let id = required_i64(&req.params, "id")?;
    let record = pick(&mut state.dataset).delete(id)?;
    log::info!("deleted {} {}", R::KIND, id);
    let revision = state.dataset.touch();
    with_revision(key, &record, revision)
}

pub fn handle_get<R: Record>(state: &mut AppState, req: &Request, key: &str, pick: Pick<R>) -> Value {
    respond(req, get(state, req, key, pick))
}

pub fn handle_create<R: Record>(state: &mut AppState, req: &Request, key: &str, pick: Pick<R>) -> Value {
    respond(req, create(state, req, key, pick))
}

pub fn handle_update<R: Record>(state: &mut AppState, req: &Request, key: &str, pick: Pick<R>) -> Value {
    respond(req, update(state, req, key, pick))
}

pub fn handle_delete<R: Record>(state: &mut AppState, req: &Request, key: &str, pick: Pick<R>) -> Value {
    respond(req, delete(state, req, key, pick))
}


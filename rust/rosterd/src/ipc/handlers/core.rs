use crate::dataset::{Backend, Dataset};
use crate::ipc::error::{err, ok, HandlerErr};
use crate::ipc::handlers::records::respond;
use crate::ipc::helpers::today;
use crate::ipc::types::{AppState, Request};
use crate::seed;
use serde_json::json;
use std::path::PathBuf;

fn workspace_path(state: &AppState) -> Option<String> {
    match state.dataset.backend() {
        Backend::Memory => None,
        Backend::Sqlite { workspace } => Some(workspace.to_string_lossy().to_string()),
    }
}

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "backend": state.dataset.backend().label(),
            "workspacePath": workspace_path(state),
            "revision": state.dataset.revision()
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match Dataset::open_workspace(&path) {
        Ok(mut dataset) => {
            log::info!("workspace opened at {}", path.display());
            dataset.succeed(state.dataset.revision());
            state.dataset = dataset;
            ok(
                &req.id,
                json!({
                    "workspacePath": path.to_string_lossy(),
                    "backend": state.dataset.backend().label(),
                    "revision": state.dataset.revision()
                }),
            )
        }
        Err(e) => {
            log::warn!("workspace open failed for {}: {:?}", path.display(), e);
            err(&req.id, "db_open_failed", format!("{e:?}"), None)
        }
    }
}

fn demo_seed(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let today = today(&req.params)?;
    let summary = seed::load_demo(&mut state.dataset, today)?;
    let revision = state.dataset.touch();
    Ok(json!({ "seeded": summary, "revision": revision }))
}

fn handle_demo_seed(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(req, demo_seed(state, req))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "demo.seed" => Some(handle_demo_seed(state, req)),
        _ => None,
    }
}

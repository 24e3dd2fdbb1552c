use serde_json::json;

use crate::store::StoreError;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// Failure of a single handler, rendered into the `error` object of a reply.
#[derive(Debug)]
pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn bad_params(message: impl Into<String>) -> Self {
        HandlerErr {
            code: "bad_params",
            message: message.into(),
            details: None,
        }
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<StoreError> for HandlerErr {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { kind, id } => HandlerErr {
                code: "not_found",
                message: format!("{} not found", kind),
                details: Some(json!({ "kind": kind, "id": id })),
            },
            StoreError::Validation { field, message } => HandlerErr {
                code: "bad_params",
                message,
                details: Some(json!({ "field": field })),
            },
            StoreError::Duplicate { kind, existing } => HandlerErr {
                code: "bad_params",
                message: format!("{} {} already holds this key", kind, existing),
                details: Some(json!({ "kind": kind, "existingId": existing })),
            },
            other => {
                log::error!("store failure: {}", other);
                HandlerErr {
                    code: "store_failed",
                    message: other.to_string(),
                    details: None,
                }
            }
        }
    }
}

impl From<serde_json::Error> for HandlerErr {
    fn from(e: serde_json::Error) -> Self {
        HandlerErr {
            code: "store_failed",
            message: e.to_string(),
            details: None,
        }
    }
}

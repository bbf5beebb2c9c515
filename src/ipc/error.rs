use serde_json::json;

use crate::error::AppError;

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

/// Error envelope for a failed use case. The message is the error's Display;
/// `details` carries the machine-readable part where there is one.
pub fn from_app_error(id: &str, e: &AppError) -> serde_json::Value {
    let details = match e {
        AppError::NotFound(kind) | AppError::Conflict(kind) => Some(json!({ "kind": kind.as_str() })),
        AppError::Forbidden(reason) => Some(json!({ "reason": reason.as_str() })),
        _ => None,
    };
    if let AppError::Internal(msg) = e {
        tracing::error!(request_id = id, error = %msg, "request failed");
    }
    err(id, e.code(), e.to_string(), details)
}

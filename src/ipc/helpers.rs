use serde::Serialize;
use serde_json::Value;

use crate::auth::{ClaimResolver, TokenTable};
use crate::error::{AppError, AppResult};
use crate::ipc::error::{err, from_app_error, ok};
use crate::ipc::types::{AppState, Request};
use crate::usecases::RequestCtx;

/// Runs one authenticated use case against the open workspace and wraps the
/// outcome in a response envelope.
pub fn with_ctx<F>(state: &AppState, req: &Request, f: F) -> Value
where
    F: FnOnce(&RequestCtx<'_>) -> AppResult<Value>,
{
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let claim = match req.token.as_deref() {
        Some(token) => match TokenTable::new(conn).resolve_claim(token) {
            Ok(c) => c,
            Err(e) => return from_app_error(&req.id, &e),
        },
        None => None,
    };
    let ctx = RequestCtx::new(conn, &state.config, claim.as_ref());
    // Authentication is settled before any params are looked at.
    if let Err(e) = ctx.principal() {
        return from_app_error(&req.id, &e);
    }
    match f(&ctx) {
        Ok(v) => ok(&req.id, v),
        Err(e) => {
            tracing::debug!(method = %req.method, code = e.code(), "request rejected");
            from_app_error(&req.id, &e)
        }
    }
}

pub fn to_json<T: Serialize>(value: T) -> AppResult<Value> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.to_string()))
}

fn missing(key: &str) -> AppError {
    AppError::invalid(format!("missing params.{}", key))
}

pub fn required_str<'a>(params: &'a Value, key: &str) -> AppResult<&'a str> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| missing(key))
}

pub fn required_i64(params: &Value, key: &str) -> AppResult<i64> {
    params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| missing(key))
}

pub fn optional_str<'a>(params: &'a Value, key: &str) -> AppResult<Option<&'a str>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(AppError::invalid(format!("params.{} must be a string", key))),
    }
}

pub fn optional_i64(params: &Value, key: &str) -> AppResult<Option<i64>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_i64()
            .map(Some)
            .ok_or_else(|| AppError::invalid(format!("params.{} must be an integer", key))),
    }
}

/// Distinguishes an absent key (leave unchanged) from an explicit `null`
/// (clear the field).
pub fn nullable_str(params: &Value, key: &str) -> AppResult<Option<Option<String>>> {
    match params.get(key) {
        None => Ok(None),
        Some(Value::Null) => Ok(Some(None)),
        Some(Value::String(s)) => Ok(Some(Some(s.clone()))),
        Some(_) => Err(AppError::invalid(format!("params.{} must be a string or null", key))),
    }
}

use serde_json::json;

use crate::ipc::helpers::{required_str, with_ctx};
use crate::ipc::types::{AppState, Request};
use crate::usecases::degrees;

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_ctx(state, req, |ctx| {
        Ok(json!({ "degrees": degrees::list_degrees(ctx)? }))
    })
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_ctx(state, req, |ctx| {
        let id = degrees::create_degree(
            ctx,
            required_str(&req.params, "code")?,
            required_str(&req.params, "name")?,
        )?;
        Ok(json!({ "degreeId": id }))
    })
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_ctx(state, req, |ctx| {
        degrees::delete_degree(ctx, required_str(&req.params, "code")?)?;
        Ok(json!({ "ok": true }))
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "degrees.list" => Some(handle_list(state, req)),
        "degrees.create" => Some(handle_create(state, req)),
        "degrees.delete" => Some(handle_delete(state, req)),
        _ => None,
    }
}

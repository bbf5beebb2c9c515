use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::ipc::helpers::{required_i64, required_str, with_ctx};
use crate::ipc::types::{AppState, Request};
use crate::store::users::{NewUser, Role};
use crate::usecases::users;

fn role_param(params: &serde_json::Value) -> AppResult<Role> {
    let raw = required_str(params, "role")?;
    Role::parse(raw).ok_or_else(|| AppError::invalid(format!("unknown role: {}", raw)))
}

fn bool_param(params: &serde_json::Value, key: &str) -> AppResult<bool> {
    match params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(false),
        Some(v) => v
            .as_bool()
            .ok_or_else(|| AppError::invalid(format!("params.{} must be a boolean", key))),
    }
}

fn handle_me(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_ctx(state, req, |ctx| Ok(json!({ "user": users::me(ctx)? })))
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_ctx(state, req, |ctx| Ok(json!({ "users": users::list_users(ctx)? })))
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_ctx(state, req, |ctx| {
        let p = &req.params;
        let input = NewUser {
            email: required_str(p, "email")?.to_string(),
            first_name: required_str(p, "firstName")?.to_string(),
            last_name: required_str(p, "lastName")?.to_string(),
            is_admin: bool_param(p, "isAdmin")?,
            is_lecturer: bool_param(p, "isLecturer")?,
        };
        Ok(json!({ "user": users::create_user(ctx, input)? }))
    })
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_ctx(state, req, |ctx| {
        let id = required_i64(&req.params, "userId")?;
        users::delete_user(ctx, id)?;
        Ok(json!({ "ok": true }))
    })
}

fn handle_update_profile(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_ctx(state, req, |ctx| {
        let p = &req.params;
        let id = required_i64(p, "userId")?;
        let user = users::update_profile(
            ctx,
            id,
            required_str(p, "firstName")?,
            required_str(p, "lastName")?,
        )?;
        Ok(json!({ "user": user }))
    })
}

fn handle_role(state: &mut AppState, req: &Request, granted: bool) -> serde_json::Value {
    with_ctx(state, req, |ctx| {
        let id = required_i64(&req.params, "userId")?;
        let role = role_param(&req.params)?;
        let user = if granted {
            users::assign_role(ctx, id, role)?
        } else {
            users::remove_role(ctx, id, role)?
        };
        Ok(json!({ "user": user }))
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "users.me" => Some(handle_me(state, req)),
        "users.list" => Some(handle_list(state, req)),
        "users.create" => Some(handle_create(state, req)),
        "users.delete" => Some(handle_delete(state, req)),
        "users.updateProfile" => Some(handle_update_profile(state, req)),
        "roles.assign" => Some(handle_role(state, req, true)),
        "roles.remove" => Some(handle_role(state, req, false)),
        _ => None,
    }
}

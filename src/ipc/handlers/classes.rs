use serde_json::json;

use crate::ipc::helpers::{
    nullable_str, optional_i64, optional_str, required_i64, required_str, with_ctx,
};
use crate::ipc::types::{AppState, Request};
use crate::usecases::classes::{self, ClassChanges, ClassInput};

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_ctx(state, req, |ctx| {
        Ok(json!({ "classes": classes::list_classes(ctx)? }))
    })
}

fn handle_mine(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_ctx(state, req, |ctx| {
        let email = optional_str(&req.params, "lecturerEmail")?;
        Ok(json!({ "classes": classes::list_lecturer_classes(ctx, email)? }))
    })
}

fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_ctx(state, req, |ctx| {
        let class = classes::get_class(ctx, required_str(&req.params, "code")?)?;
        Ok(json!({ "class": class }))
    })
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_ctx(state, req, |ctx| {
        let p = &req.params;
        let input = ClassInput {
            code: required_str(p, "code")?.to_string(),
            name: required_str(p, "name")?.to_string(),
            credit: required_i64(p, "credit")?,
            lecturer_email: optional_str(p, "lecturerEmail")?.map(str::to_string),
        };
        Ok(json!({ "class": classes::create_class(ctx, input)? }))
    })
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_ctx(state, req, |ctx| {
        let p = &req.params;
        let code = required_str(p, "code")?;
        let changes = ClassChanges {
            name: optional_str(p, "name")?.map(str::to_string),
            credit: optional_i64(p, "credit")?,
            lecturer_email: nullable_str(p, "lecturerEmail")?,
        };
        Ok(json!({ "class": classes::update_class(ctx, code, changes)? }))
    })
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_ctx(state, req, |ctx| {
        classes::delete_class(ctx, required_str(&req.params, "code")?)?;
        Ok(json!({ "ok": true }))
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "classes.list" => Some(handle_list(state, req)),
        "classes.mine" => Some(handle_mine(state, req)),
        "classes.get" => Some(handle_get(state, req)),
        "classes.create" => Some(handle_create(state, req)),
        "classes.update" => Some(handle_update(state, req)),
        "classes.delete" => Some(handle_delete(state, req)),
        _ => None,
    }
}

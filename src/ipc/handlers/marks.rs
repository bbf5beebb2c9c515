use serde_json::json;

use crate::error::AppResult;
use crate::ipc::helpers::{optional_i64, optional_str, required_i64, required_str, with_ctx};
use crate::ipc::types::{AppState, Request};
use crate::usecases::marks::{self, MarkInput};

/// `value` and `code` are both optional; leaving both out records a
/// no-submission.
fn mark_input(params: &serde_json::Value) -> AppResult<MarkInput> {
    Ok(MarkInput {
        value: optional_i64(params, "value")?,
        code: optional_str(params, "code")?.map(str::to_string),
        notes: optional_str(params, "notes")?.map(str::to_string),
    })
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_ctx(state, req, |ctx| {
        let p = &req.params;
        let student_id = required_i64(p, "studentId")?;
        let class_id = required_i64(p, "classId")?;
        let mark = marks::create_mark(ctx, student_id, class_id, mark_input(p)?)?;
        Ok(json!({ "mark": mark }))
    })
}

fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_ctx(state, req, |ctx| {
        let mark = marks::get_mark(ctx, required_i64(&req.params, "markId")?)?;
        Ok(json!({ "mark": mark }))
    })
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_ctx(state, req, |ctx| {
        let p = &req.params;
        let id = required_i64(p, "markId")?;
        let mark = marks::edit_mark(ctx, id, mark_input(p)?)?;
        Ok(json!({ "mark": mark }))
    })
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_ctx(state, req, |ctx| {
        marks::delete_mark(ctx, required_i64(&req.params, "markId")?)?;
        Ok(json!({ "ok": true }))
    })
}

fn handle_list_for_class(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_ctx(state, req, |ctx| {
        let rows = marks::list_class_marks(ctx, required_str(&req.params, "classCode")?)?;
        Ok(json!({ "marks": rows }))
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "marks.create" => Some(handle_create(state, req)),
        "marks.get" => Some(handle_get(state, req)),
        "marks.update" => Some(handle_update(state, req)),
        "marks.delete" => Some(handle_delete(state, req)),
        "marks.listForClass" => Some(handle_list_for_class(state, req)),
        _ => None,
    }
}

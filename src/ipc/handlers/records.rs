use serde_json::json;

use crate::ipc::helpers::{optional_str, required_i64, required_str, with_ctx};
use crate::ipc::types::{AppState, Request};
use crate::usecases::records::{self, CircumstanceInput, MisconductInput};

fn handle_misconduct_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_ctx(state, req, |ctx| {
        let p = &req.params;
        let student_id = required_i64(p, "studentId")?;
        let input = MisconductInput {
            class_code: optional_str(p, "classCode")?.map(str::to_string),
            date: required_str(p, "date")?.to_string(),
            outcome: required_str(p, "outcome")?.to_string(),
            details: optional_str(p, "details")?.map(str::to_string),
        };
        let id = records::create_misconduct(ctx, student_id, input)?;
        Ok(json!({ "misconductId": id }))
    })
}

fn handle_misconduct_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_ctx(state, req, |ctx| {
        let rows = records::list_misconducts(ctx, required_i64(&req.params, "studentId")?)?;
        Ok(json!({ "misconduct": rows }))
    })
}

fn handle_misconduct_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_ctx(state, req, |ctx| {
        records::delete_misconduct(ctx, required_i64(&req.params, "misconductId")?)?;
        Ok(json!({ "ok": true }))
    })
}

fn handle_circumstance_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_ctx(state, req, |ctx| {
        let p = &req.params;
        let student_id = required_i64(p, "studentId")?;
        let input = CircumstanceInput {
            details: required_str(p, "details")?.to_string(),
            sensitivity: required_i64(p, "sensitivity")?,
            date: required_str(p, "date")?.to_string(),
        };
        let id = records::create_circumstance(ctx, student_id, input)?;
        Ok(json!({ "circumstanceId": id }))
    })
}

fn handle_circumstance_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_ctx(state, req, |ctx| {
        let rows = records::list_circumstances(ctx, required_i64(&req.params, "studentId")?)?;
        Ok(json!({ "circumstances": rows }))
    })
}

fn handle_circumstance_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_ctx(state, req, |ctx| {
        records::delete_circumstance(ctx, required_i64(&req.params, "circumstanceId")?)?;
        Ok(json!({ "ok": true }))
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "misconduct.create" => Some(handle_misconduct_create(state, req)),
        "misconduct.list" => Some(handle_misconduct_list(state, req)),
        "misconduct.delete" => Some(handle_misconduct_delete(state, req)),
        "circumstances.create" => Some(handle_circumstance_create(state, req)),
        "circumstances.list" => Some(handle_circumstance_list(state, req)),
        "circumstances.delete" => Some(handle_circumstance_delete(state, req)),
        _ => None,
    }
}

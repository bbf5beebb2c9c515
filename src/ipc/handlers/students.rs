use serde_json::json;

use crate::ipc::helpers::{nullable_str, optional_str, required_i64, required_str, with_ctx};
use crate::ipc::types::{AppState, Request};
use crate::usecases::students::{self, StudentChanges, StudentInput};

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_ctx(state, req, |ctx| {
        Ok(json!({ "students": students::list_students(ctx)? }))
    })
}

fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_ctx(state, req, |ctx| {
        let student = students::get_student(ctx, required_i64(&req.params, "studentId")?)?;
        Ok(json!({ "student": student }))
    })
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_ctx(state, req, |ctx| {
        let p = &req.params;
        let input = StudentInput {
            student_no: required_str(p, "studentNo")?.to_string(),
            first_name: required_str(p, "firstName")?.to_string(),
            last_name: required_str(p, "lastName")?.to_string(),
            email: optional_str(p, "email")?.map(str::to_string),
            degree_code: optional_str(p, "degreeCode")?.map(str::to_string),
        };
        Ok(json!({ "student": students::create_student(ctx, input)? }))
    })
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_ctx(state, req, |ctx| {
        let p = &req.params;
        let id = required_i64(p, "studentId")?;
        let changes = StudentChanges {
            first_name: optional_str(p, "firstName")?.map(str::to_string),
            last_name: optional_str(p, "lastName")?.map(str::to_string),
            email: nullable_str(p, "email")?,
            degree_code: nullable_str(p, "degreeCode")?,
        };
        Ok(json!({ "student": students::update_student(ctx, id, changes)? }))
    })
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_ctx(state, req, |ctx| {
        students::delete_student(ctx, required_i64(&req.params, "studentId")?)?;
        Ok(json!({ "ok": true }))
    })
}

fn handle_weighted_mean(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_ctx(state, req, |ctx| {
        let mean = students::weighted_mean(ctx, required_i64(&req.params, "studentId")?)?;
        Ok(json!(mean))
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_list(state, req)),
        "students.get" => Some(handle_get(state, req)),
        "students.create" => Some(handle_create(state, req)),
        "students.update" => Some(handle_update(state, req)),
        "students.delete" => Some(handle_delete(state, req)),
        "students.weightedMean" => Some(handle_weighted_mean(state, req)),
        _ => None,
    }
}

use crate::error::AppError;
use crate::ipc::helpers::{optional_i64, optional_str, required_str, to_json, with_ctx};
use crate::ipc::types::{AppState, Request};
use crate::usecases::statistics;

fn handle_class(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_ctx(state, req, |ctx| {
        to_json(statistics::class_statistics(
            ctx,
            required_str(&req.params, "classCode")?,
        )?)
    })
}

fn handle_global(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_ctx(state, req, |ctx| to_json(statistics::global_statistics(ctx)?))
}

fn handle_lecturer(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_ctx(state, req, |ctx| {
        let email = optional_str(&req.params, "lecturerEmail")?;
        to_json(statistics::lecturer_metrics(ctx, email)?)
    })
}

fn handle_rank_classes(state: &mut AppState, req: &Request) -> serde_json::Value {
    with_ctx(state, req, |ctx| {
        let n = match optional_i64(&req.params, "n")? {
            Some(n) => Some(
                usize::try_from(n).map_err(|_| AppError::invalid("params.n must not be negative"))?,
            ),
            None => None,
        };
        to_json(statistics::rank_classes(ctx, n)?)
    })
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "stats.class" => Some(handle_class(state, req)),
        "stats.global" => Some(handle_global(state, req)),
        "stats.lecturer" => Some(handle_lecturer(state, req)),
        "stats.rankClasses" => Some(handle_rank_classes(state, req)),
        _ => None,
    }
}

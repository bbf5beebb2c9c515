//! Personal circumstances and academic misconduct cases.

use crate::error::{AppError, AppResult, EntityKind};
use crate::policy::{authorize, Operation, ResourceFacts};
use crate::store::records::{self as repo, CircumstanceRow, MisconductRow};
use crate::usecases::classes::load_class;
use crate::usecases::students::load_student;
use crate::usecases::{optional_text, parse_date, require_text, RequestCtx};

const MAX_SENSITIVITY: i64 = 3;

#[derive(Debug, Clone)]
pub struct CircumstanceInput {
    pub details: String,
    pub sensitivity: i64,
    pub date: String,
}

#[derive(Debug, Clone)]
pub struct MisconductInput {
    pub class_code: Option<String>,
    pub date: String,
    pub outcome: String,
    pub details: Option<String>,
}

pub fn list_circumstances(ctx: &RequestCtx<'_>, student_id: i64) -> AppResult<Vec<CircumstanceRow>> {
    let principal = ctx.principal()?;
    load_student(ctx, student_id)?;
    authorize(&principal, Operation::ListCircumstances, &ResourceFacts::none())?;
    repo::list_circumstances(ctx.conn, student_id)
}

pub fn create_circumstance(
    ctx: &RequestCtx<'_>,
    student_id: i64,
    input: CircumstanceInput,
) -> AppResult<i64> {
    let principal = ctx.principal()?;
    load_student(ctx, student_id)?;
    authorize(&principal, Operation::CreateCircumstance, &ResourceFacts::none())?;

    let details = require_text("details", &input.details)?;
    if !(0..=MAX_SENSITIVITY).contains(&input.sensitivity) {
        return Err(AppError::invalid(format!(
            "sensitivity must be between 0 and {}",
            MAX_SENSITIVITY
        )));
    }
    let date = parse_date("date", &input.date)?;
    let id = repo::insert_circumstance(ctx.conn, student_id, &details, input.sensitivity, &date)?;
    tracing::info!(circumstance_id = id, student_id, by = principal.id, "circumstance recorded");
    Ok(id)
}

pub fn delete_circumstance(ctx: &RequestCtx<'_>, id: i64) -> AppResult<()> {
    let principal = ctx.principal()?;
    if !repo::circumstance_exists(ctx.conn, id)? {
        return Err(AppError::NotFound(EntityKind::Circumstance));
    }
    authorize(&principal, Operation::DeleteCircumstance, &ResourceFacts::none())?;
    repo::delete_circumstance(ctx.conn, id)?;
    Ok(())
}

pub fn list_misconducts(ctx: &RequestCtx<'_>, student_id: i64) -> AppResult<Vec<MisconductRow>> {
    let principal = ctx.principal()?;
    load_student(ctx, student_id)?;
    authorize(&principal, Operation::ListMisconduct, &ResourceFacts::none())?;
    repo::list_misconducts(ctx.conn, student_id)
}

pub fn create_misconduct(
    ctx: &RequestCtx<'_>,
    student_id: i64,
    input: MisconductInput,
) -> AppResult<i64> {
    let principal = ctx.principal()?;
    load_student(ctx, student_id)?;
    let class_id = match input.class_code.as_deref() {
        Some(code) => Some(load_class(ctx, code)?.id),
        None => None,
    };
    authorize(&principal, Operation::CreateMisconduct, &ResourceFacts::none())?;

    let date = parse_date("date", &input.date)?;
    let outcome = require_text("outcome", &input.outcome)?;
    let details = optional_text(input.details.as_deref());
    let id = repo::insert_misconduct(
        ctx.conn,
        student_id,
        class_id,
        &date,
        &outcome,
        details.as_deref(),
    )?;
    tracing::info!(misconduct_id = id, student_id, by = principal.id, "misconduct recorded");
    Ok(id)
}

pub fn delete_misconduct(ctx: &RequestCtx<'_>, id: i64) -> AppResult<()> {
    let principal = ctx.principal()?;
    if !repo::misconduct_exists(ctx.conn, id)? {
        return Err(AppError::NotFound(EntityKind::Misconduct));
    }
    authorize(&principal, Operation::DeleteMisconduct, &ResourceFacts::none())?;
    repo::delete_misconduct(ctx.conn, id)?;
    Ok(())
}

use serde::Serialize;

use crate::calc;
use crate::error::{AppError, AppResult, EntityKind};
use crate::policy::{authorize, Operation, ResourceFacts};
use crate::store::degrees;
use crate::store::marks;
use crate::store::students::{self as repo, NewStudent, StudentRow};
use crate::usecases::{optional_text, require_text, RequestCtx};

#[derive(Debug, Clone)]
pub struct StudentInput {
    pub student_no: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub degree_code: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct StudentChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<Option<String>>,
    pub degree_code: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentMean {
    pub student_id: i64,
    pub weighted_mean: i64,
    pub total_credit: i64,
    pub class_count: usize,
}

pub(crate) fn load_student(ctx: &RequestCtx<'_>, id: i64) -> AppResult<StudentRow> {
    repo::find_student_by_id(ctx.conn, id)?.ok_or(AppError::NotFound(EntityKind::Student))
}

fn resolve_degree(ctx: &RequestCtx<'_>, code: Option<&str>) -> AppResult<Option<i64>> {
    let Some(code) = code.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };
    let id = degrees::find_degree_id_by_code(ctx.conn, &code.to_ascii_uppercase())?
        .ok_or(AppError::NotFound(EntityKind::Degree))?;
    Ok(Some(id))
}

pub fn list_students(ctx: &RequestCtx<'_>) -> AppResult<Vec<StudentRow>> {
    let principal = ctx.principal()?;
    authorize(&principal, Operation::ListStudents, &ResourceFacts::none())?;
    repo::list_students(ctx.conn)
}

pub fn get_student(ctx: &RequestCtx<'_>, id: i64) -> AppResult<StudentRow> {
    let principal = ctx.principal()?;
    let student = load_student(ctx, id)?;
    authorize(&principal, Operation::ReadStudent, &ResourceFacts::none())?;
    Ok(student)
}

pub fn create_student(ctx: &RequestCtx<'_>, input: StudentInput) -> AppResult<StudentRow> {
    let principal = ctx.principal()?;
    authorize(&principal, Operation::CreateStudent, &ResourceFacts::none())?;

    let student = NewStudent {
        student_no: require_text("studentNo", &input.student_no)?,
        first_name: require_text("firstName", &input.first_name)?,
        last_name: require_text("lastName", &input.last_name)?,
        email: optional_text(input.email.as_deref()),
        degree_id: resolve_degree(ctx, input.degree_code.as_deref())?,
    };
    let id = repo::insert_student(ctx.conn, &student)?;
    tracing::info!(student_id = id, by = principal.id, "student created");
    load_student(ctx, id)
}

pub fn update_student(
    ctx: &RequestCtx<'_>,
    id: i64,
    changes: StudentChanges,
) -> AppResult<StudentRow> {
    let principal = ctx.principal()?;
    let current = load_student(ctx, id)?;
    authorize(&principal, Operation::UpdateStudent, &ResourceFacts::none())?;

    let first_name = match changes.first_name.as_deref() {
        Some(v) => require_text("firstName", v)?,
        None => current.first_name.clone(),
    };
    let last_name = match changes.last_name.as_deref() {
        Some(v) => require_text("lastName", v)?,
        None => current.last_name.clone(),
    };
    let email = match changes.email {
        Some(v) => optional_text(v.as_deref()),
        None => current.email.clone(),
    };
    let degree_id = match changes.degree_code {
        Some(v) => resolve_degree(ctx, v.as_deref())?,
        None => current.degree_id,
    };
    repo::update_student(ctx.conn, id, &first_name, &last_name, email.as_deref(), degree_id)?;
    load_student(ctx, id)
}

pub fn delete_student(ctx: &RequestCtx<'_>, id: i64) -> AppResult<()> {
    let principal = ctx.principal()?;
    load_student(ctx, id)?;
    authorize(&principal, Operation::DeleteStudent, &ResourceFacts::none())?;
    repo::delete_student(ctx.conn, id)?;
    tracing::info!(student_id = id, by = principal.id, "student deleted");
    Ok(())
}

/// Credit-weighted mean of a student's numeric marks across their classes.
pub fn weighted_mean(ctx: &RequestCtx<'_>, id: i64) -> AppResult<StudentMean> {
    let principal = ctx.principal()?;
    load_student(ctx, id)?;
    authorize(&principal, Operation::StudentWeightedMean, &ResourceFacts::none())?;

    let pairs: Vec<(i64, i64)> = marks::find_marks_for_student(ctx.conn, id)?
        .into_iter()
        .filter_map(|m| m.mark.mark_value().numeric().map(|v| (v, m.credit)))
        .collect();
    let mean = calc::compute_weighted_mean(&pairs)?;
    Ok(StudentMean {
        student_id: id,
        weighted_mean: mean,
        total_credit: pairs.iter().map(|(_, c)| c).sum(),
        class_count: pairs.len(),
    })
}

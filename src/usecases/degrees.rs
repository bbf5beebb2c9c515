use crate::error::{AppError, AppResult, EntityKind};
use crate::policy::{authorize, Operation, ResourceFacts};
use crate::store::degrees::{self as repo, DegreeRow};
use crate::usecases::{require_text, RequestCtx};

pub fn list_degrees(ctx: &RequestCtx<'_>) -> AppResult<Vec<DegreeRow>> {
    let principal = ctx.principal()?;
    authorize(&principal, Operation::ListDegrees, &ResourceFacts::none())?;
    repo::list_degrees(ctx.conn)
}

pub fn create_degree(ctx: &RequestCtx<'_>, code: &str, name: &str) -> AppResult<i64> {
    let principal = ctx.principal()?;
    authorize(&principal, Operation::CreateDegree, &ResourceFacts::none())?;
    let code = require_text("code", code)?.to_ascii_uppercase();
    let name = require_text("name", name)?;
    let id = repo::insert_degree(ctx.conn, &code, &name)?;
    tracing::info!(degree = %code, by = principal.id, "degree created");
    Ok(id)
}

pub fn delete_degree(ctx: &RequestCtx<'_>, code: &str) -> AppResult<()> {
    let principal = ctx.principal()?;
    let code = code.trim().to_ascii_uppercase();
    let Some(id) = repo::find_degree_id_by_code(ctx.conn, &code)? else {
        return Err(AppError::NotFound(EntityKind::Degree));
    };
    authorize(&principal, Operation::DeleteDegree, &ResourceFacts::none())?;
    repo::delete_degree(ctx.conn, id)?;
    tracing::info!(degree = %code, by = principal.id, "degree deleted");
    Ok(())
}

use crate::error::{AppError, AppResult, EntityKind};
use crate::policy::{authorize, Operation, ResourceFacts};
use crate::store::users::{self as repo, NewUser, Role, UserRow};
use crate::usecases::{require_text, RequestCtx};

fn load_user(ctx: &RequestCtx<'_>, user_id: i64) -> AppResult<UserRow> {
    repo::find_user_by_id(ctx.conn, user_id)?.ok_or(AppError::NotFound(EntityKind::User))
}

pub fn me(ctx: &RequestCtx<'_>) -> AppResult<UserRow> {
    let principal = ctx.principal()?;
    authorize(&principal, Operation::ReadOwnProfile, &ResourceFacts::target_user(principal.id))?;
    load_user(ctx, principal.id)
}

pub fn list_users(ctx: &RequestCtx<'_>) -> AppResult<Vec<UserRow>> {
    let principal = ctx.principal()?;
    authorize(&principal, Operation::ListUsers, &ResourceFacts::none())?;
    repo::list_users(ctx.conn)
}

pub fn create_user(ctx: &RequestCtx<'_>, input: NewUser) -> AppResult<UserRow> {
    let principal = ctx.principal()?;
    authorize(&principal, Operation::CreateUser, &ResourceFacts::none())?;

    let email = require_text("email", &input.email)?.to_ascii_lowercase();
    if !email.contains('@') {
        return Err(AppError::invalid("email must contain '@'"));
    }
    let user = NewUser {
        email,
        first_name: require_text("firstName", &input.first_name)?,
        last_name: require_text("lastName", &input.last_name)?,
        ..input
    };
    let id = repo::insert_user(ctx.conn, &user)?;
    tracing::info!(user_id = id, by = principal.id, "user created");
    load_user(ctx, id)
}

pub fn delete_user(ctx: &RequestCtx<'_>, user_id: i64) -> AppResult<()> {
    let principal = ctx.principal()?;
    load_user(ctx, user_id)?;
    authorize(&principal, Operation::DeleteUser, &ResourceFacts::target_user(user_id))?;
    if user_id == principal.id {
        return Err(AppError::invalid("cannot delete your own account"));
    }
    repo::delete_user(ctx.conn, user_id)?;
    tracing::info!(user_id, by = principal.id, "user deleted");
    Ok(())
}

/// Self-service profile edit.
pub fn update_profile(
    ctx: &RequestCtx<'_>,
    user_id: i64,
    first_name: &str,
    last_name: &str,
) -> AppResult<UserRow> {
    let principal = ctx.principal()?;
    load_user(ctx, user_id)?;
    authorize(&principal, Operation::EditOwnProfile, &ResourceFacts::target_user(user_id))?;
    let first_name = require_text("firstName", first_name)?;
    let last_name = require_text("lastName", last_name)?;
    repo::update_profile(ctx.conn, user_id, &first_name, &last_name)?;
    load_user(ctx, user_id)
}

fn set_role(ctx: &RequestCtx<'_>, user_id: i64, role: Role, granted: bool) -> AppResult<UserRow> {
    let principal = ctx.principal()?;
    load_user(ctx, user_id)?;
    let op = if granted {
        Operation::AssignRole
    } else {
        Operation::RemoveRole
    };
    authorize(&principal, op, &ResourceFacts::target_user(user_id))?;
    repo::set_role(ctx.conn, user_id, role, granted)?;
    tracing::info!(user_id, role = ?role, granted, by = principal.id, "role changed");
    load_user(ctx, user_id)
}

pub fn assign_role(ctx: &RequestCtx<'_>, user_id: i64, role: Role) -> AppResult<UserRow> {
    set_role(ctx, user_id, role, true)
}

pub fn remove_role(ctx: &RequestCtx<'_>, user_id: i64, role: Role) -> AppResult<UserRow> {
    set_role(ctx, user_id, role, false)
}

use crate::calc::MarkValue;
use crate::error::{AppError, AppResult, EntityKind};
use crate::policy::{authorize, Operation, ResourceFacts};
use crate::store::classes::ClassRow;
use crate::store::marks::{self as repo, MarkRow};
use crate::usecases::classes::{load_class, load_class_by_id};
use crate::usecases::students::load_student;
use crate::usecases::{optional_text, RequestCtx};

#[derive(Debug, Clone, Default)]
pub struct MarkInput {
    pub value: Option<i64>,
    pub code: Option<String>,
    pub notes: Option<String>,
}

impl MarkInput {
    fn mark_value(&self) -> AppResult<MarkValue> {
        Ok(MarkValue::from_parts(self.value, self.code.as_deref())?)
    }
}

fn load_mark(ctx: &RequestCtx<'_>, id: i64) -> AppResult<MarkRow> {
    repo::find_mark_by_id(ctx.conn, id)?.ok_or(AppError::NotFound(EntityKind::Mark))
}

/// Loads a mark and the class it belongs to, then checks the caller may act
/// on it. Existence is settled before ownership.
fn load_owned_mark(
    ctx: &RequestCtx<'_>,
    id: i64,
    op: Operation,
) -> AppResult<(MarkRow, ClassRow)> {
    let principal = ctx.principal()?;
    let mark = load_mark(ctx, id)?;
    let class = load_class_by_id(ctx, mark.class_id)?;
    authorize(&principal, op, &ResourceFacts::class(class.lecturer_id))?;
    Ok((mark, class))
}

pub fn create_mark(
    ctx: &RequestCtx<'_>,
    student_id: i64,
    class_id: i64,
    input: MarkInput,
) -> AppResult<MarkRow> {
    let principal = ctx.principal()?;
    load_student(ctx, student_id)?;
    let class = load_class_by_id(ctx, class_id)?;
    authorize(&principal, Operation::CreateMark, &ResourceFacts::class(class.lecturer_id))?;

    let value = input.mark_value()?;
    let notes = optional_text(input.notes.as_deref());
    let id = repo::insert_mark(ctx.conn, student_id, class_id, value, notes.as_deref())?;
    tracing::info!(mark_id = id, class = %class.code, by = principal.id, "mark created");
    load_mark(ctx, id)
}

pub fn get_mark(ctx: &RequestCtx<'_>, id: i64) -> AppResult<MarkRow> {
    let (mark, _) = load_owned_mark(ctx, id, Operation::ReadMark)?;
    Ok(mark)
}

pub fn edit_mark(ctx: &RequestCtx<'_>, id: i64, input: MarkInput) -> AppResult<MarkRow> {
    let (mark, class) = load_owned_mark(ctx, id, Operation::EditMark)?;
    let value = input.mark_value()?;
    // Notes are kept unless the edit supplies new ones.
    let notes = match input.notes.as_deref() {
        Some(n) => optional_text(Some(n)),
        None => mark.notes.clone(),
    };
    repo::update_mark(ctx.conn, id, value, notes.as_deref())?;
    tracing::info!(mark_id = id, class = %class.code, "mark edited");
    load_mark(ctx, id)
}

pub fn delete_mark(ctx: &RequestCtx<'_>, id: i64) -> AppResult<()> {
    let (_, class) = load_owned_mark(ctx, id, Operation::DeleteMark)?;
    repo::delete_mark(ctx.conn, id)?;
    tracing::info!(mark_id = id, class = %class.code, "mark deleted");
    Ok(())
}

pub fn list_class_marks(ctx: &RequestCtx<'_>, class_code: &str) -> AppResult<Vec<MarkRow>> {
    let principal = ctx.principal()?;
    let class = load_class(ctx, class_code)?;
    authorize(&principal, Operation::ListClassMarks, &ResourceFacts::class(class.lecturer_id))?;
    repo::find_marks_for_class(ctx.conn, class.id)
}

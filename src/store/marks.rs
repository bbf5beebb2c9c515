use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::calc::{AdminCode, MarkValue};
use crate::error::{conflict_on_unique, AppResult, EntityKind};
use crate::store::now_stamp;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkRow {
    pub id: i64,
    pub student_id: i64,
    pub class_id: i64,
    pub value: Option<i64>,
    pub code: Option<String>,
    pub notes: Option<String>,
    pub updated_at: Option<String>,
}

impl MarkRow {
    /// Reads the stored columns back as a [`MarkValue`]. Rows written by this
    /// daemon never hold both; a numeric value wins if an older row does.
    /// An unrecognised code reads as a no-submission and is logged.
    pub fn mark_value(&self) -> MarkValue {
        if let Some(v) = self.value {
            return MarkValue::Scored(v);
        }
        match self.code.as_deref() {
            None => MarkValue::NoSubmission,
            Some(raw) => match AdminCode::parse(raw) {
                Some(c) => MarkValue::Code(c),
                None => {
                    tracing::warn!(
                        mark_id = self.id,
                        code = raw,
                        "unrecognised mark code, treating as no submission"
                    );
                    MarkValue::NoSubmission
                }
            },
        }
    }
}

/// A mark together with the class it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMark {
    pub class_code: String,
    pub credit: i64,
    pub mark: MarkRow,
}

const MARK_COLUMNS: &str = "m.id, m.student_id, m.class_id, m.value, m.code, m.notes, m.updated_at";

fn map_mark(r: &Row<'_>) -> rusqlite::Result<MarkRow> {
    Ok(MarkRow {
        id: r.get(0)?,
        student_id: r.get(1)?,
        class_id: r.get(2)?,
        value: r.get(3)?,
        code: r.get(4)?,
        notes: r.get(5)?,
        updated_at: r.get(6)?,
    })
}

fn map_class_mark(r: &Row<'_>) -> rusqlite::Result<ClassMark> {
    Ok(ClassMark {
        mark: map_mark(r)?,
        class_code: r.get(7)?,
        credit: r.get(8)?,
    })
}

fn query_class_marks<P: rusqlite::Params>(
    conn: &Connection,
    where_clause: &str,
    params: P,
) -> AppResult<Vec<ClassMark>> {
    let sql = format!(
        "SELECT {}, c.code, c.credit
         FROM marks m
         JOIN classes c ON c.id = m.class_id
         {}
         ORDER BY c.code, m.student_id",
        MARK_COLUMNS, where_clause
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params, map_class_mark)
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())?;
    Ok(rows)
}

pub fn find_mark_by_id(conn: &Connection, id: i64) -> AppResult<Option<MarkRow>> {
    let sql = format!("SELECT {} FROM marks m WHERE m.id = ?", MARK_COLUMNS);
    Ok(conn.query_row(&sql, [id], map_mark).optional()?)
}

pub fn find_marks_for_class(conn: &Connection, class_id: i64) -> AppResult<Vec<MarkRow>> {
    let sql = format!(
        "SELECT {} FROM marks m WHERE m.class_id = ? ORDER BY m.student_id",
        MARK_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([class_id], map_mark)
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())?;
    Ok(rows)
}

/// Marks across every class the given lecturer teaches.
pub fn find_marks_for_principal(conn: &Connection, lecturer_id: i64) -> AppResult<Vec<ClassMark>> {
    query_class_marks(conn, "WHERE c.lecturer_id = ?", [lecturer_id])
}

pub fn find_all_marks(conn: &Connection) -> AppResult<Vec<ClassMark>> {
    query_class_marks(conn, "", rusqlite::params![])
}

pub fn find_marks_for_student(conn: &Connection, student_id: i64) -> AppResult<Vec<ClassMark>> {
    query_class_marks(conn, "WHERE m.student_id = ?", [student_id])
}

pub fn insert_mark(
    conn: &Connection,
    student_id: i64,
    class_id: i64,
    value: MarkValue,
    notes: Option<&str>,
) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO marks(student_id, class_id, value, code, notes, updated_at)
         VALUES(?, ?, ?, ?, ?, ?)",
        (
            student_id,
            class_id,
            value.numeric(),
            value.code(),
            notes,
            now_stamp(),
        ),
    )
    .map_err(|e| conflict_on_unique(e, EntityKind::Mark))?;
    Ok(conn.last_insert_rowid())
}

pub fn update_mark(
    conn: &Connection,
    id: i64,
    value: MarkValue,
    notes: Option<&str>,
) -> AppResult<bool> {
    let changed = conn.execute(
        "UPDATE marks SET value = ?, code = ?, notes = ?, updated_at = ? WHERE id = ?",
        (value.numeric(), value.code(), notes, now_stamp(), id),
    )?;
    Ok(changed > 0)
}

pub fn delete_mark(conn: &Connection, id: i64) -> AppResult<bool> {
    let changed = conn.execute("DELETE FROM marks WHERE id = ?", [id])?;
    Ok(changed > 0)
}

use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;

use crate::error::AppResult;
use crate::store::now_stamp;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircumstanceRow {
    pub id: i64,
    pub student_id: i64,
    pub details: String,
    pub sensitivity: i64,
    pub date: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MisconductRow {
    pub id: i64,
    pub student_id: i64,
    pub class_id: Option<i64>,
    pub date: String,
    pub outcome: String,
    pub details: Option<String>,
    pub created_at: String,
}

pub fn list_circumstances(conn: &Connection, student_id: i64) -> AppResult<Vec<CircumstanceRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, student_id, details, sensitivity, date, created_at
         FROM personal_circumstances
         WHERE student_id = ?
         ORDER BY date, id",
    )?;
    let rows = stmt
        .query_map([student_id], |r| {
            Ok(CircumstanceRow {
                id: r.get(0)?,
                student_id: r.get(1)?,
                details: r.get(2)?,
                sensitivity: r.get(3)?,
                date: r.get(4)?,
                created_at: r.get(5)?,
            })
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())?;
    Ok(rows)
}

pub fn insert_circumstance(
    conn: &Connection,
    student_id: i64,
    details: &str,
    sensitivity: i64,
    date: &str,
) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO personal_circumstances(student_id, details, sensitivity, date, created_at)
         VALUES(?, ?, ?, ?, ?)",
        (student_id, details, sensitivity, date, now_stamp()),
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn delete_circumstance(conn: &Connection, id: i64) -> AppResult<bool> {
    let changed = conn.execute("DELETE FROM personal_circumstances WHERE id = ?", [id])?;
    Ok(changed > 0)
}

pub fn list_misconducts(conn: &Connection, student_id: i64) -> AppResult<Vec<MisconductRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, student_id, class_id, date, outcome, details, created_at
         FROM academic_misconducts
         WHERE student_id = ?
         ORDER BY date, id",
    )?;
    let rows = stmt
        .query_map([student_id], |r| {
            Ok(MisconductRow {
                id: r.get(0)?,
                student_id: r.get(1)?,
                class_id: r.get(2)?,
                date: r.get(3)?,
                outcome: r.get(4)?,
                details: r.get(5)?,
                created_at: r.get(6)?,
            })
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())?;
    Ok(rows)
}

pub fn insert_misconduct(
    conn: &Connection,
    student_id: i64,
    class_id: Option<i64>,
    date: &str,
    outcome: &str,
    details: Option<&str>,
) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO academic_misconducts(student_id, class_id, date, outcome, details, created_at)
         VALUES(?, ?, ?, ?, ?, ?)",
        (student_id, class_id, date, outcome, details, now_stamp()),
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn delete_misconduct(conn: &Connection, id: i64) -> AppResult<bool> {
    let changed = conn.execute("DELETE FROM academic_misconducts WHERE id = ?", [id])?;
    Ok(changed > 0)
}

pub fn circumstance_exists(conn: &Connection, id: i64) -> AppResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM personal_circumstances WHERE id = ?",
            [id],
            |r| r.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn misconduct_exists(conn: &Connection, id: i64) -> AppResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM academic_misconducts WHERE id = ?",
            [id],
            |r| r.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

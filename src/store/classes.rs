use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::error::{conflict_on_unique, AppResult, EntityKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRow {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub credit: i64,
    pub lecturer_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewClass {
    pub code: String,
    pub name: String,
    pub credit: i64,
    pub lecturer_id: Option<i64>,
}

const CLASS_COLUMNS: &str = "id, code, name, credit, lecturer_id";

fn map_class(r: &Row<'_>) -> rusqlite::Result<ClassRow> {
    Ok(ClassRow {
        id: r.get(0)?,
        code: r.get(1)?,
        name: r.get(2)?,
        credit: r.get(3)?,
        lecturer_id: r.get(4)?,
    })
}

pub fn find_class_by_code(conn: &Connection, code: &str) -> AppResult<Option<ClassRow>> {
    let sql = format!("SELECT {} FROM classes WHERE code = ?", CLASS_COLUMNS);
    let code = code.trim().to_ascii_uppercase();
    Ok(conn.query_row(&sql, [code], map_class).optional()?)
}

pub fn find_class_by_id(conn: &Connection, id: i64) -> AppResult<Option<ClassRow>> {
    let sql = format!("SELECT {} FROM classes WHERE id = ?", CLASS_COLUMNS);
    Ok(conn.query_row(&sql, [id], map_class).optional()?)
}

pub fn list_classes(conn: &Connection) -> AppResult<Vec<ClassRow>> {
    let sql = format!("SELECT {} FROM classes ORDER BY code", CLASS_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], map_class)
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())?;
    Ok(rows)
}

pub fn list_classes_for_lecturer(conn: &Connection, lecturer_id: i64) -> AppResult<Vec<ClassRow>> {
    let sql = format!(
        "SELECT {} FROM classes WHERE lecturer_id = ? ORDER BY code",
        CLASS_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([lecturer_id], map_class)
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())?;
    Ok(rows)
}

pub fn insert_class(conn: &Connection, class: &NewClass) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO classes(code, name, credit, lecturer_id) VALUES(?, ?, ?, ?)",
        (&class.code, &class.name, class.credit, class.lecturer_id),
    )
    .map_err(|e| conflict_on_unique(e, EntityKind::Class))?;
    Ok(conn.last_insert_rowid())
}

pub fn update_class(
    conn: &Connection,
    id: i64,
    name: &str,
    credit: i64,
    lecturer_id: Option<i64>,
) -> AppResult<bool> {
    let changed = conn.execute(
        "UPDATE classes SET name = ?, credit = ?, lecturer_id = ? WHERE id = ?",
        (name, credit, lecturer_id, id),
    )?;
    Ok(changed > 0)
}

/// Deletes a class and its marks. Misconduct records that referenced the
/// class stay on the student's file without it.
pub fn delete_class(conn: &Connection, id: i64) -> AppResult<bool> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM marks WHERE class_id = ?", [id])?;
    tx.execute(
        "UPDATE academic_misconducts SET class_id = NULL WHERE class_id = ?",
        [id],
    )?;
    let changed = tx.execute("DELETE FROM classes WHERE id = ?", [id])?;
    tx.commit()?;
    Ok(changed > 0)
}

use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;

use crate::error::{conflict_on_unique, AppResult, EntityKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DegreeRow {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub student_count: i64,
}

pub fn list_degrees(conn: &Connection) -> AppResult<Vec<DegreeRow>> {
    let mut stmt = conn.prepare(
        "SELECT
           d.id,
           d.code,
           d.name,
           (SELECT COUNT(*) FROM students s WHERE s.degree_id = d.id) AS student_count
         FROM degrees d
         ORDER BY d.code",
    )?;
    let rows = stmt
        .query_map([], |r| {
            Ok(DegreeRow {
                id: r.get(0)?,
                code: r.get(1)?,
                name: r.get(2)?,
                student_count: r.get(3)?,
            })
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())?;
    Ok(rows)
}

pub fn find_degree_id_by_code(conn: &Connection, code: &str) -> AppResult<Option<i64>> {
    Ok(conn
        .query_row("SELECT id FROM degrees WHERE code = ?", [code], |r| r.get(0))
        .optional()?)
}

pub fn insert_degree(conn: &Connection, code: &str, name: &str) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO degrees(code, name) VALUES(?, ?)",
        (code, name),
    )
    .map_err(|e| conflict_on_unique(e, EntityKind::Degree))?;
    Ok(conn.last_insert_rowid())
}

/// Deletes a degree; students enrolled on it keep their records with no degree.
pub fn delete_degree(conn: &Connection, id: i64) -> AppResult<bool> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("UPDATE students SET degree_id = NULL WHERE degree_id = ?", [id])?;
    let changed = tx.execute("DELETE FROM degrees WHERE id = ?", [id])?;
    tx.commit()?;
    Ok(changed > 0)
}

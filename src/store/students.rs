use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::error::{conflict_on_unique, AppResult, EntityKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRow {
    pub id: i64,
    pub student_no: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub degree_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewStudent {
    pub student_no: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub degree_id: Option<i64>,
}

const STUDENT_COLUMNS: &str = "id, student_no, first_name, last_name, email, degree_id";

fn map_student(r: &Row<'_>) -> rusqlite::Result<StudentRow> {
    Ok(StudentRow {
        id: r.get(0)?,
        student_no: r.get(1)?,
        first_name: r.get(2)?,
        last_name: r.get(3)?,
        email: r.get(4)?,
        degree_id: r.get(5)?,
    })
}

pub fn find_student_by_id(conn: &Connection, id: i64) -> AppResult<Option<StudentRow>> {
    let sql = format!("SELECT {} FROM students WHERE id = ?", STUDENT_COLUMNS);
    Ok(conn.query_row(&sql, [id], map_student).optional()?)
}

pub fn list_students(conn: &Connection) -> AppResult<Vec<StudentRow>> {
    let sql = format!(
        "SELECT {} FROM students ORDER BY last_name, first_name, id",
        STUDENT_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], map_student)
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())?;
    Ok(rows)
}

pub fn insert_student(conn: &Connection, student: &NewStudent) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO students(student_no, first_name, last_name, email, degree_id)
         VALUES(?, ?, ?, ?, ?)",
        (
            &student.student_no,
            &student.first_name,
            &student.last_name,
            &student.email,
            student.degree_id,
        ),
    )
    .map_err(|e| conflict_on_unique(e, EntityKind::Student))?;
    Ok(conn.last_insert_rowid())
}

pub fn update_student(
    conn: &Connection,
    id: i64,
    first_name: &str,
    last_name: &str,
    email: Option<&str>,
    degree_id: Option<i64>,
) -> AppResult<bool> {
    let changed = conn.execute(
        "UPDATE students SET first_name = ?, last_name = ?, email = ?, degree_id = ? WHERE id = ?",
        (first_name, last_name, email, degree_id, id),
    )?;
    Ok(changed > 0)
}

/// Deletes a student together with their marks and case records.
pub fn delete_student(conn: &Connection, id: i64) -> AppResult<bool> {
    let tx = conn.unchecked_transaction()?;
    // Explicit dependency order; the schema has no ON DELETE CASCADE.
    tx.execute("DELETE FROM marks WHERE student_id = ?", [id])?;
    tx.execute(
        "DELETE FROM personal_circumstances WHERE student_id = ?",
        [id],
    )?;
    tx.execute("DELETE FROM academic_misconducts WHERE student_id = ?", [id])?;
    let changed = tx.execute("DELETE FROM students WHERE id = ?", [id])?;
    tx.commit()?;
    Ok(changed > 0)
}

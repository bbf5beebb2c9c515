use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::error::{conflict_on_unique, AppResult, EntityKind};
use crate::store::now_stamp;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_admin: bool,
    pub is_lecturer: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Lecturer,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "lecturer" => Some(Role::Lecturer),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            Role::Admin => "is_admin",
            Role::Lecturer => "is_lecturer",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_admin: bool,
    pub is_lecturer: bool,
}

const USER_COLUMNS: &str = "id, email, first_name, last_name, is_admin, is_lecturer, created_at";

fn map_user(r: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: r.get(0)?,
        email: r.get(1)?,
        first_name: r.get(2)?,
        last_name: r.get(3)?,
        is_admin: r.get::<_, i64>(4)? != 0,
        is_lecturer: r.get::<_, i64>(5)? != 0,
        created_at: r.get(6)?,
    })
}

/// Directory lookup by claim subject (the user's email, case-insensitive).
pub fn find_principal_by_subject(conn: &Connection, subject: &str) -> AppResult<Option<UserRow>> {
    let sql = format!(
        "SELECT {} FROM users WHERE lower(email) = lower(?)",
        USER_COLUMNS
    );
    Ok(conn.query_row(&sql, [subject.trim()], map_user).optional()?)
}

pub fn find_user_by_id(conn: &Connection, id: i64) -> AppResult<Option<UserRow>> {
    let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
    Ok(conn.query_row(&sql, [id], map_user).optional()?)
}

pub fn list_users(conn: &Connection) -> AppResult<Vec<UserRow>> {
    let sql = format!("SELECT {} FROM users ORDER BY email", USER_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], map_user)
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())?;
    Ok(rows)
}

pub fn insert_user(conn: &Connection, user: &NewUser) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO users(email, first_name, last_name, is_admin, is_lecturer, created_at)
         VALUES(?, ?, ?, ?, ?, ?)",
        (
            &user.email,
            &user.first_name,
            &user.last_name,
            user.is_admin as i64,
            user.is_lecturer as i64,
            now_stamp(),
        ),
    )
    .map_err(|e| conflict_on_unique(e, EntityKind::User))?;
    Ok(conn.last_insert_rowid())
}

pub fn update_profile(
    conn: &Connection,
    id: i64,
    first_name: &str,
    last_name: &str,
) -> AppResult<bool> {
    let changed = conn.execute(
        "UPDATE users SET first_name = ?, last_name = ? WHERE id = ?",
        (first_name, last_name, id),
    )?;
    Ok(changed > 0)
}

pub fn set_role(conn: &Connection, id: i64, role: Role, granted: bool) -> AppResult<bool> {
    let sql = format!("UPDATE users SET {} = ? WHERE id = ?", role.column());
    let changed = conn.execute(&sql, (granted as i64, id))?;
    Ok(changed > 0)
}

/// Deletes a user, detaching them from any classes they lecture.
pub fn delete_user(conn: &Connection, id: i64) -> AppResult<bool> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "UPDATE classes SET lecturer_id = NULL WHERE lecturer_id = ?",
        [id],
    )?;
    let changed = tx.execute("DELETE FROM users WHERE id = ?", [id])?;
    tx.commit()?;
    Ok(changed > 0)
}

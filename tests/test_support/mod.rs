#![allow(dead_code)]

use rusqlite::Connection;
use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

pub fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_marksd");
    let mut child = Command::new(exe)
        .env_remove("MARKSD_WORKSPACE")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn marksd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

pub fn read_response(reader: &mut BufReader<ChildStdout>) -> serde_json::Value {
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response");
    serde_json::from_str(line.trim()).expect("parse response json")
}

/// Sends one request and returns the whole envelope.
pub fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    token: Option<&str>,
    params: serde_json::Value,
) -> serde_json::Value {
    let mut payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    if let Some(t) = token {
        payload["token"] = json!(t);
    }
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let value = read_response(reader);
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

pub fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    token: Option<&str>,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, token, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

/// Sends a request that must fail and returns its `error` object.
pub fn request_err(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    token: Option<&str>,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, token, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(false),
        "{} unexpectedly succeeded: {}",
        method,
        value
    );
    value.get("error").cloned().expect("error object")
}

pub fn error_code(error: &serde_json::Value) -> &str {
    error.get("code").and_then(|v| v.as_str()).unwrap_or("")
}

pub fn db_path(workspace: &Path) -> PathBuf {
    workspace.join("marks.sqlite3")
}

/// Inserts a directory user plus a token that claims the same roles.
pub fn seed_user(
    workspace: &Path,
    email: &str,
    is_admin: bool,
    is_lecturer: bool,
    token: &str,
) -> i64 {
    let conn = Connection::open(db_path(workspace)).expect("open db");
    conn.execute(
        "INSERT INTO users(email, first_name, last_name, is_admin, is_lecturer, created_at)
         VALUES(?, 'Test', 'User', ?, ?, '2024-01-01T00:00:00Z')",
        (email, is_admin as i64, is_lecturer as i64),
    )
    .expect("insert user");
    let id = conn.last_insert_rowid();
    conn.execute(
        "INSERT INTO access_tokens(token, subject, is_admin, is_lecturer) VALUES(?, ?, ?, ?)",
        (token, email, is_admin as i64, is_lecturer as i64),
    )
    .expect("insert token");
    id
}

/// Spawns the daemon on a fresh workspace seeded with the usual cast:
/// `admin-token`, `lect-token` (lee@uni.ac.uk), `other-token`
/// (kim@uni.ac.uk, also a lecturer) and `plain-token`.
pub fn seeded_sidecar(prefix: &str) -> (PathBuf, Child, ChildStdin, BufReader<ChildStdout>) {
    let workspace = temp_dir(prefix);
    let (child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(
        &mut stdin,
        &mut reader,
        "ws",
        "workspace.select",
        None,
        json!({ "path": workspace.to_string_lossy() }),
    );
    seed_user(&workspace, "admin@uni.ac.uk", true, false, "admin-token");
    seed_user(&workspace, "lee@uni.ac.uk", false, true, "lect-token");
    seed_user(&workspace, "kim@uni.ac.uk", false, true, "other-token");
    seed_user(&workspace, "pat@uni.ac.uk", false, false, "plain-token");
    (workspace, child, stdin, reader)
}

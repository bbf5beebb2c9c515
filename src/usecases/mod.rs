//! Use-case orchestrators.
//!
//! Each operation runs the same sequence: resolve the principal, load the
//! target (not found wins over forbidden), consult [`crate::policy`], then
//! mutate or aggregate. Failures propagate unchanged as [`AppError`].

pub mod classes;
pub mod degrees;
pub mod marks;
pub mod records;
pub mod statistics;
pub mod students;
pub mod users;

use chrono::NaiveDate;
use rusqlite::Connection;

use crate::auth::{self, Claim, Principal};
use crate::config::Config;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy)]
pub struct RequestCtx<'a> {
    pub conn: &'a Connection,
    pub config: &'a Config,
    pub claim: Option<&'a Claim>,
}

impl<'a> RequestCtx<'a> {
    pub fn new(conn: &'a Connection, config: &'a Config, claim: Option<&'a Claim>) -> Self {
        Self {
            conn,
            config,
            claim,
        }
    }

    pub fn principal(&self) -> AppResult<Principal> {
        auth::resolve_principal(self.conn, self.claim)
    }
}

pub(crate) fn require_text(field: &str, value: &str) -> AppResult<String> {
    let t = value.trim();
    if t.is_empty() {
        return Err(AppError::invalid(format!("{} must not be empty", field)));
    }
    Ok(t.to_string())
}

pub(crate) fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Normalizes a `YYYY-MM-DD` date.
pub(crate) fn parse_date(field: &str, raw: &str) -> AppResult<String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| AppError::invalid(format!("{} must be a YYYY-MM-DD date", field)))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_are_normalized() {
        assert_eq!(parse_date("date", " 2024-03-07 ").expect("date"), "2024-03-07");
        assert!(parse_date("date", "07/03/2024").is_err());
    }

    #[test]
    fn text_helpers_trim() {
        assert_eq!(require_text("name", "  Maths ").expect("text"), "Maths");
        assert!(require_text("name", "   ").is_err());
        assert_eq!(optional_text(Some("  ")), None);
        assert_eq!(optional_text(Some(" x ")), Some("x".to_string()));
    }
}

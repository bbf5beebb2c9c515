//! Repository functions over the workspace database.
//!
//! Everything here returns plain rows or `None`; authorization and
//! validation happen in the use cases.

pub mod classes;
pub mod degrees;
pub mod marks;
pub mod records;
pub mod students;
pub mod users;

use chrono::{SecondsFormat, Utc};

pub fn now_stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

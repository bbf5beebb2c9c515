//! Identity claims and principal resolution.
//!
//! Tokens are issued and verified elsewhere. By the time a token reaches this
//! daemon the issuer has recorded the claim it stands for in `access_tokens`;
//! we only look it up.

use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;

use crate::error::{AppError, AppResult, EntityKind};
use crate::store;

/// An already-verified identity claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub subject: String,
    pub is_admin: bool,
    pub is_lecturer: bool,
}

/// The acting user for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: i64,
    pub email: String,
    pub is_admin: bool,
    pub is_lecturer: bool,
}

pub trait ClaimResolver {
    fn resolve_claim(&self, token: &str) -> AppResult<Option<Claim>>;
}

/// Looks tokens up in the workspace's `access_tokens` table.
pub struct TokenTable<'a> {
    conn: &'a Connection,
}

impl<'a> TokenTable<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl ClaimResolver for TokenTable<'_> {
    fn resolve_claim(&self, token: &str) -> AppResult<Option<Claim>> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(None);
        }
        let claim = self
            .conn
            .query_row(
                "SELECT subject, is_admin, is_lecturer FROM access_tokens WHERE token = ?",
                [token],
                |r| {
                    Ok(Claim {
                        subject: r.get(0)?,
                        is_admin: r.get::<_, i64>(1)? != 0,
                        is_lecturer: r.get::<_, i64>(2)? != 0,
                    })
                },
            )
            .optional()?;
        Ok(claim)
    }
}

/// Turns a claim into a principal via the user directory.
///
/// A flag is effective only when both the claim and the directory grant it,
/// so a role removed after the token was issued stops working immediately.
pub fn resolve_principal(conn: &Connection, claim: Option<&Claim>) -> AppResult<Principal> {
    let Some(claim) = claim else {
        return Err(AppError::NotAuthenticated);
    };
    let Some(user) = store::users::find_principal_by_subject(conn, &claim.subject)? else {
        tracing::debug!(subject = %claim.subject, "claim subject not in directory");
        return Err(AppError::NotFound(EntityKind::User));
    };
    Ok(Principal {
        id: user.id,
        email: user.email,
        is_admin: claim.is_admin && user.is_admin,
        is_lecturer: claim.is_lecturer && user.is_lecturer,
    })
}

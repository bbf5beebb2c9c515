use std::fmt;

use thiserror::Error;

use crate::calc::StatsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Degree,
    Class,
    Student,
    Mark,
    Misconduct,
    Circumstance,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Degree => "degree",
            EntityKind::Class => "class",
            EntityKind::Student => "student",
            EntityKind::Mark => "mark",
            EntityKind::Misconduct => "misconduct",
            EntityKind::Circumstance => "circumstance",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the policy evaluator refused an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForbiddenReason {
    AdminRequired,
    LecturerRequired,
    LecturerOrAdminRequired,
    NotClassLecturer,
    NotSelf,
}

impl ForbiddenReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ForbiddenReason::AdminRequired => "admin_required",
            ForbiddenReason::LecturerRequired => "lecturer_required",
            ForbiddenReason::LecturerOrAdminRequired => "lecturer_or_admin_required",
            ForbiddenReason::NotClassLecturer => "not_class_lecturer",
            ForbiddenReason::NotSelf => "not_self",
        }
    }
}

impl fmt::Display for ForbiddenReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("missing or unrecognised access token")]
    NotAuthenticated,
    #[error("{0} not found")]
    NotFound(EntityKind),
    #[error("forbidden: {0}")]
    Forbidden(ForbiddenReason),
    #[error("{0} already exists")]
    Conflict(EntityKind),
    #[error("no numeric marks to aggregate")]
    NoData,
    #[error("{0}")]
    InvalidInput(String),
    #[error("internal failure: {0}")]
    Internal(String),
}

impl AppError {
    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::InvalidInput(message.into())
    }

    /// Wire code used by the IPC layer.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotAuthenticated => "not_authenticated",
            AppError::NotFound(_) => "not_found",
            AppError::Forbidden(_) => "forbidden",
            AppError::Conflict(_) => "conflict",
            AppError::NoData => "no_data",
            AppError::InvalidInput(_) => "bad_params",
            AppError::Internal(_) => "internal",
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StatsError> for AppError {
    fn from(err: StatsError) -> Self {
        match err {
            StatsError::NoData => AppError::NoData,
            other => AppError::InvalidInput(other.to_string()),
        }
    }
}

/// Maps a UNIQUE constraint violation on insert to `Conflict(kind)`.
pub fn conflict_on_unique(err: rusqlite::Error, kind: EntityKind) -> AppError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            AppError::Conflict(kind)
        }
        _ => AppError::from(err),
    }
}

pub type AppResult<T> = Result<T, AppError>;

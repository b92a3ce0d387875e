//! Repository Module
//!
//! CRUD operations over the SQLite pool. Plain async functions taking
//! `&SqlitePool`; handlers convert [`RepoError`] into `AppError` via `?`.

// Auth
pub mod role;
pub mod user;

// CRM aggregates
pub mod customer;
pub mod order;
pub mod proposal;
pub mod support_case;

// Delivery
pub mod project;

// SLA
pub mod sla;

// Attachments
pub mod entity_file;

// Dashboard projection
pub mod dashboard;

use crate::utils::AppError;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Business rule: {0}")]
    Business(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepoError::NotFound("Row not found".into()),
            other => RepoError::Database(other.to_string()),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::NotFound(msg),
            RepoError::Duplicate(msg) => AppError::Conflict(msg),
            RepoError::Database(msg) => AppError::Database(msg),
            RepoError::Validation(msg) => AppError::Validation(msg),
            RepoError::Business(msg) => AppError::BusinessRule(msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

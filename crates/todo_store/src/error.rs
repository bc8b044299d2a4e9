//! Store error types.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Entity not found.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Uniqueness constraint violation.
    #[error("{0}")]
    Conflict(String),

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Wraps a sqlx error after logging it for operator visibility. Raw backend
/// detail stays inside this layer.
pub(crate) fn db_err(op: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |e| {
        tracing::error!(error = %e, op, "database operation failed");
        StoreError::Database(e)
    }
}

/// True if the error is a uniqueness constraint violation.
pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

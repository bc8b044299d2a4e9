//! Auth error types.

use thiserror::Error;

/// Errors that can occur during credential or session handling.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Password hashing failed.
    #[error("password hashing failed: {0}")]
    Hashing(String),

    /// Session payload serialization failed.
    #[error("session serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

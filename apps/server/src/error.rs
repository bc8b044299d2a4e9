//! Server error types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use todo_store::StoreError;

/// Server error type, mapping the error taxonomy onto HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or out-of-range client input.
    #[error("{0}")]
    Validation(String),

    /// No valid session.
    #[error("{0}")]
    Unauthorized(String),

    /// Valid session, wrong owner.
    #[error("permission denied")]
    Forbidden,

    /// Entity absent.
    #[error("{0}")]
    NotFound(String),

    /// Uniqueness violation.
    #[error("{0}")]
    Conflict(String),

    /// Backend storage failure.
    #[error("storage error: {0}")]
    Storage(StoreError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// The standard rejection for requests without a valid session.
    pub fn unauthorized() -> Self {
        ApiError::Unauthorized("authentication required".to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::NotFound(entity) => ApiError::NotFound(format!("{entity} not found")),
            other => ApiError::Storage(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "permission denied".to_string()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            // Raw backend detail stays in the logs, never in the response.
            ApiError::Storage(e) => {
                tracing::error!(error = %e, "request failed on storage");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage error".to_string(),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
        };

        let body = json!({ "error": message });

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handler operations.
pub type ApiResult<T> = Result<T, ApiError>;

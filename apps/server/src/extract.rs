//! Session extraction.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use todo_store::TodoStore;

use crate::error::ApiError;
use crate::state::SharedState;

/// The authenticated user for the current request, read from the signed
/// session cookie. Extraction fails with 401 when the cookie is missing,
/// malformed, or tampered; use `Option<CurrentUser>` where an anonymous
/// request is acceptable.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// User ID.
    pub id: i64,
    /// Username.
    pub username: String,
}

#[async_trait]
impl<S> FromRequestParts<SharedState<S>> for CurrentUser
where
    S: TodoStore + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState<S>,
    ) -> Result<Self, Self::Rejection> {
        let token = auth::extract_cookie(&parts.headers, &state.cookies.name)
            .ok_or_else(ApiError::unauthorized)?;
        let session = state
            .sessions
            .decode(&token)
            .ok_or_else(ApiError::unauthorized)?;

        Ok(CurrentUser {
            id: session.user_id,
            username: session.username,
        })
    }
}

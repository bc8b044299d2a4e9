//! Authentication API endpoints.

use auth::{hash_password, validate_password, validate_username, verify_password, Session};
use axum::{
    extract::State,
    http::{header::SET_COOKIE, StatusCode},
    response::{AppendHeaders, IntoResponse},
    Json,
};
use entities::{User, UserInfo};
use serde::{Deserialize, Serialize};
use todo_store::{NewUser, TodoStore};

use crate::error::{ApiError, ApiResult};
use crate::extract::CurrentUser;
use crate::state::SharedState;

/// Register/login request body.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

/// Response carrying the authenticated user.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: UserInfo,
}

/// Session check response.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub is_logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,
}

/// Generic success response.
#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub success: bool,
}

/// Builds the Set-Cookie header logging the given user in.
fn login_cookie<S: TodoStore>(state: &SharedState<S>, user: &User) -> ApiResult<String> {
    let token = state
        .sessions
        .encode(&Session {
            user_id: user.id,
            username: user.username.clone(),
        })
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(state.cookies.build_set_cookie(&token))
}

/// Registers a new user and logs them in.
pub async fn register<S: TodoStore>(
    State(state): State<SharedState<S>>,
    Json(request): Json<CredentialsRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_username(&request.username).map_err(|e| ApiError::Validation(e.to_string()))?;
    validate_password(&request.password).map_err(|e| ApiError::Validation(e.to_string()))?;

    // Friendly pre-check; the unique constraint still backstops a
    // registration race at insert time.
    if state
        .store
        .get_user_by_username(&request.username)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("username is already taken".to_string()));
    }

    let password_hash =
        hash_password(&request.password).map_err(|e| ApiError::Internal(e.to_string()))?;

    let user = state
        .store
        .create_user(NewUser {
            username: request.username,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = user.id, "user registered");

    let cookie = login_cookie(&state, &user)?;
    Ok((
        StatusCode::CREATED,
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(UserResponse { user: user.info() }),
    ))
}

/// Logs an existing user in.
pub async fn login<S: TodoStore>(
    State(state): State<SharedState<S>>,
    Json(request): Json<CredentialsRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = state.store.get_user_by_username(&request.username).await?;

    // One rejection for both unknown username and wrong password
    let user = match user {
        Some(user) if verify_password(&request.password, &user.password_hash) => user,
        _ => {
            return Err(ApiError::Unauthorized(
                "invalid username or password".to_string(),
            ))
        }
    };

    tracing::info!(user_id = user.id, "user logged in");

    let cookie = login_cookie(&state, &user)?;
    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(UserResponse { user: user.info() }),
    ))
}

/// Logs the current user out by expiring the session cookie.
pub async fn logout<S: TodoStore>(State(state): State<SharedState<S>>) -> impl IntoResponse {
    let cookie = state.cookies.build_delete_cookie();
    (
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(OkResponse { success: true }),
    )
}

/// Reports whether the request carries a valid session.
pub async fn session<S: TodoStore>(
    State(state): State<SharedState<S>>,
    user: Option<CurrentUser>,
) -> ApiResult<Json<SessionResponse>> {
    let Some(user) = user else {
        return Ok(Json(SessionResponse {
            is_logged_in: false,
            user: None,
        }));
    };

    // The cookie is trusted only as far as the user still existing.
    match state.store.get_user_by_id(user.id).await? {
        Some(user) => Ok(Json(SessionResponse {
            is_logged_in: true,
            user: Some(user.info()),
        })),
        None => Ok(Json(SessionResponse {
            is_logged_in: false,
            user: None,
        })),
    }
}

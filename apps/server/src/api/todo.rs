//! Todo API endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use entities::{Todo, TodoStats};
use serde::Serialize;
use serde_json::Value;
use todo_store::TodoStore;

use crate::error::{ApiError, ApiResult};
use crate::extract::CurrentUser;
use crate::service;
use crate::state::SharedState;

/// Response carrying one todo.
#[derive(Debug, Serialize)]
pub struct TodoResponse {
    pub todo: Todo,
}

/// Response carrying a user's todos.
#[derive(Debug, Serialize)]
pub struct TodoListResponse {
    pub todos: Vec<Todo>,
}

/// Deletion response.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

fn parse_todo_id(raw: &str) -> ApiResult<i64> {
    raw.parse()
        .map_err(|_| ApiError::Validation("invalid todo id".to_string()))
}

/// Lists the session user's todos, most recent first.
pub async fn list_todos<S: TodoStore>(
    State(state): State<SharedState<S>>,
    user: CurrentUser,
) -> ApiResult<Json<TodoListResponse>> {
    let todos = state.store.list_todos(user.id).await?;
    Ok(Json(TodoListResponse { todos }))
}

/// Creates a todo owned by the session user.
pub async fn create_todo<S: TodoStore>(
    State(state): State<SharedState<S>>,
    user: CurrentUser,
    Json(payload): Json<service::CreateTodoPayload>,
) -> ApiResult<impl IntoResponse> {
    let new_todo = service::sanitize_new_todo(user.id, payload)?;
    let todo = state.store.create_todo(new_todo).await?;

    tracing::info!(todo_id = todo.id, user_id = user.id, "todo created");

    Ok((StatusCode::CREATED, Json(TodoResponse { todo })))
}

/// Applies a partial update to one of the session user's todos.
pub async fn update_todo<S: TodoStore>(
    State(state): State<SharedState<S>>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> ApiResult<Json<TodoResponse>> {
    let todo_id = parse_todo_id(&id)?;
    let payload = payload
        .as_object()
        .ok_or_else(|| ApiError::Validation("expected a JSON object".to_string()))?;

    let todo = service::load_owned_todo(&state.store, user.id, todo_id).await?;
    let changes = service::sanitize_update(&todo, payload)?;
    let todo = state.store.update_todo(todo_id, changes).await?;

    tracing::info!(todo_id, user_id = user.id, "todo updated");

    Ok(Json(TodoResponse { todo }))
}

/// Deletes one of the session user's todos.
pub async fn delete_todo<S: TodoStore>(
    State(state): State<SharedState<S>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    let todo_id = parse_todo_id(&id)?;

    service::load_owned_todo(&state.store, user.id, todo_id).await?;
    let deleted = state.store.delete_todo(todo_id).await?;

    tracing::info!(todo_id, user_id = user.id, "todo deleted");

    Ok(Json(DeleteResponse { deleted }))
}

/// Returns aggregate completion statistics for the session user.
pub async fn stats<S: TodoStore>(
    State(state): State<SharedState<S>>,
    user: CurrentUser,
) -> ApiResult<Json<TodoStats>> {
    let stats = state.store.completed_stats(user.id).await?;
    Ok(Json(stats))
}

//! API endpoints.

pub mod auth;
pub mod todo;

use axum::{
    routing::{get, post},
    Router,
};
use todo_store::TodoStore;

use crate::state::SharedState;

/// Creates the API router with all endpoints.
pub fn create_router<S: TodoStore + 'static>() -> Router<SharedState<S>> {
    Router::new()
        // Auth endpoints
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/session", get(auth::session))
        // Todo endpoints
        .route("/api/todos", get(todo::list_todos).post(todo::create_todo))
        .route("/api/todos/stats", get(todo::stats))
        .route(
            "/api/todos/:id",
            axum::routing::patch(todo::update_todo).delete(todo::delete_todo),
        )
        // Health check
        .route("/health", get(health_check))
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

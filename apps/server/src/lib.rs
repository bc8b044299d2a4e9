//! Todo service HTTP server.
//!
//! Thin request/response surface over the todo store: session-cookie
//! authentication, the todo authorization and update service, and the
//! backend-agnostic persistence trait underneath.

pub mod api;
pub mod config;
pub mod error;
pub mod extract;
pub mod service;
pub mod state;

use axum::Router;
use todo_store::TodoStore;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::state::{create_shared_state, SharedState};

/// Creates the application router with all routes configured.
pub fn create_app<S: TodoStore + 'static>(state: SharedState<S>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    api::create_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Creates the application state with the given configuration and store.
pub fn create_state<S: TodoStore>(config: Config, store: S) -> SharedState<S> {
    create_shared_state(config, store)
}

/// Initializes tracing with the given log level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

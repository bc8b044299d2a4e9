//! Application state.

use std::sync::Arc;

use auth::{CookieConfig, SessionCodec};
use todo_store::TodoStore;

use crate::config::Config;

/// Shared application state.
pub struct AppState<S: TodoStore> {
    /// Server configuration.
    pub config: Config,
    /// Todo and user store.
    pub store: S,
    /// Session token codec.
    pub sessions: SessionCodec,
    /// Session cookie configuration.
    pub cookies: CookieConfig,
}

impl<S: TodoStore> AppState<S> {
    /// Creates new application state.
    pub fn new(config: Config, store: S) -> Self {
        let sessions = SessionCodec::new(&config.session_secret);
        let cookies = config.cookie_config();
        Self {
            config,
            store,
            sessions,
            cookies,
        }
    }
}

/// Type alias for shared state.
pub type SharedState<S> = Arc<AppState<S>>;

/// Creates shared state from config and store.
pub fn create_shared_state<S: TodoStore>(config: Config, store: S) -> SharedState<S> {
    Arc::new(AppState::new(config, store))
}

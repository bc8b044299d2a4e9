//! Todo service server binary.

use std::net::SocketAddr;

use todo_server::{config::Config, config::DEV_SESSION_SECRET, create_app, create_state, init_tracing};
use todo_store::{PgStore, SqliteStore, TodoStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    if config.session_secret == DEV_SESSION_SECRET {
        tracing::warn!("TODO_SESSION_SECRET not set; using insecure development secret");
    }

    // The backend is selected once here; everything behind the store trait
    // is backend-agnostic. Schema bootstrap runs inside connect(), before
    // the listener starts.
    match config.database_url.clone() {
        Some(url) => {
            tracing::info!("starting with PostgreSQL backend");
            let store = PgStore::connect(&url).await?;
            serve(config, store).await
        }
        None => {
            tracing::info!(path = %config.sqlite_path.display(), "starting with SQLite backend");
            let store = SqliteStore::connect(&config.sqlite_path).await?;
            serve(config, store).await
        }
    }
}

async fn serve<S: TodoStore + 'static>(config: Config, store: S) -> anyhow::Result<()> {
    // Parse server address
    let addr: SocketAddr = config.server_addr().parse()?;

    let state = create_state(config, store);
    let app = create_app(state);

    tracing::info!(addr = %addr, "server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

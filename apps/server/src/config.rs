//! Server configuration.

use std::env;
use std::path::PathBuf;

use auth::{CookieConfig, SameSite};

/// Fallback session secret for local development. The server refuses to
/// start without an explicit secret when the networked backend is selected.
pub const DEV_SESSION_SECRET: &str = "insecure-dev-session-secret";

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// PostgreSQL connection URL. Presence selects the networked backend;
    /// absence selects the embedded SQLite backend.
    pub database_url: Option<String>,
    /// SQLite database file path (embedded backend only).
    pub sqlite_path: PathBuf,
    /// Secret used to sign session cookies.
    pub session_secret: String,
    /// Whether the session cookie carries the Secure attribute.
    pub cookie_secure: bool,
    /// Session cookie lifetime in seconds.
    pub session_ttl_secs: i64,
    /// Log level.
    pub log_level: String,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut database_url = env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());

        // TLS options for the networked backend ride in the connection URL,
        // applied once here at startup.
        if let (Some(url), Ok(mode)) = (&database_url, env::var("DATABASE_SSL_MODE")) {
            database_url = Some(apply_ssl_mode(url, &mode));
        }

        let session_secret = match env::var("TODO_SESSION_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ if database_url.is_some() => {
                anyhow::bail!("TODO_SESSION_SECRET is required when DATABASE_URL is set")
            }
            _ => DEV_SESSION_SECRET.to_string(),
        };

        let cookie_secure = env::var("TODO_COOKIE_SECURE")
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(database_url.is_some());

        Ok(Self {
            host: env::var("TODO_SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("TODO_SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            database_url,
            sqlite_path: env::var("TODO_DB_PATH")
                .unwrap_or_else(|_| "data/todos.db".to_string())
                .into(),
            session_secret,
            cookie_secure,
            session_ttl_secs: env::var("TODO_SESSION_TTL_SECS")
                .unwrap_or_else(|_| "604800".to_string())
                .parse()
                .unwrap_or(604_800),
            log_level: env::var("TODO_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Returns the server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the session cookie configuration.
    pub fn cookie_config(&self) -> CookieConfig {
        CookieConfig {
            name: "session".to_string(),
            secure: self.cookie_secure,
            http_only: true,
            same_site: SameSite::Lax,
            path: "/".to_string(),
            max_age_secs: Some(self.session_ttl_secs),
        }
    }
}

/// Appends an sslmode parameter to a connection URL that lacks one.
fn apply_ssl_mode(url: &str, mode: &str) -> String {
    if url.contains("sslmode=") {
        url.to_string()
    } else if url.contains('?') {
        format!("{url}&sslmode={mode}")
    } else {
        format!("{url}?sslmode={mode}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_ssl_mode() {
        assert_eq!(
            apply_ssl_mode("postgres://localhost/todos", "require"),
            "postgres://localhost/todos?sslmode=require"
        );
        assert_eq!(
            apply_ssl_mode("postgres://localhost/todos?user=x", "require"),
            "postgres://localhost/todos?user=x&sslmode=require"
        );
        // Existing sslmode wins
        assert_eq!(
            apply_ssl_mode("postgres://localhost/todos?sslmode=disable", "require"),
            "postgres://localhost/todos?sslmode=disable"
        );
    }
}

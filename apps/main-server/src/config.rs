//! Server configuration.

use std::env;
use std::time::Duration;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Database URL.
    pub database_url: String,
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Upper bound on a single store call.
    pub store_timeout: Duration,
    /// Whether startup may fall back to a disposable in-memory store.
    pub store_fallback: bool,
    /// Log level.
    pub log_level: String,
}

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_STORE_TIMEOUT_MS: u64 = 5000;

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = env::var("REPAIRDESK_JWT_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("REPAIRDESK_JWT_SECRET is required"))?;

        let port = match env::var("REPAIRDESK_SERVER_PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| anyhow::anyhow!("REPAIRDESK_SERVER_PORT is not a valid port: {raw}"))?,
            Err(_) => DEFAULT_PORT,
        };

        let store_timeout_ms = env::var("REPAIRDESK_STORE_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|ms| *ms > 0)
            .unwrap_or(DEFAULT_STORE_TIMEOUT_MS);

        Ok(Self {
            host: env::var("REPAIRDESK_SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:repairdesk.db?mode=rwc".to_string()),
            jwt_secret,
            store_timeout: Duration::from_millis(store_timeout_ms),
            store_fallback: env::var("REPAIRDESK_STORE_FALLBACK")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
            log_level: env::var("REPAIRDESK_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Builds a configuration for tests and embedding, with defaults for
    /// everything but the secret.
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: jwt_secret.into(),
            store_timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
            store_fallback: false,
            log_level: "info".to_string(),
        }
    }

    /// Returns the server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

//! Application configuration loaded from environment variables.

use std::time::Duration;

use domain::TransitionPolicy;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `DATABASE_URL` — PostgreSQL connection string; orders are kept in memory
///   when unset
/// - `DB_MAX_CONNECTIONS` — pool size (default: `5`)
/// - `DB_RETRY_BASE_DELAY_MS` — first backoff between connection retries
///   (default: `100`)
/// - `ORDER_STRICT_TRANSITIONS` — only allow lifecycle status edges
///   (default: `false`)
///
/// Mail settings are read separately by `notify::MailConfig`.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_retry_base_delay_ms: u64,
    pub strict_transitions: bool,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: parsed_var("PORT").unwrap_or(defaults.port),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            db_max_connections: parsed_var("DB_MAX_CONNECTIONS")
                .unwrap_or(defaults.db_max_connections),
            db_retry_base_delay_ms: parsed_var("DB_RETRY_BASE_DELAY_MS")
                .unwrap_or(defaults.db_retry_base_delay_ms),
            strict_transitions: std::env::var("ORDER_STRICT_TRANSITIONS")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.strict_transitions),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.db_retry_base_delay_ms)
    }

    pub fn transition_policy(&self) -> TransitionPolicy {
        TransitionPolicy::from_flag(self.strict_transitions)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            db_max_connections: 5,
            db_retry_base_delay_ms: 100,
            strict_transitions: false,
        }
    }
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

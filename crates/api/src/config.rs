use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use newsdesk_core::recycle_bin::RetentionPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host to bind to.
    pub host: String,
    /// Server port to bind to.
    pub port: u16,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Maximum database connections in the pool.
    pub db_max_connections: u32,
    /// Minimum database connections in the pool.
    pub db_min_connections: u32,
    /// HS256 secret used to verify bearer tokens.
    pub jwt_secret: String,
    /// Event bus channel capacity.
    pub event_bus_capacity: usize,
    /// Log level (e.g., "info", "debug", "trace").
    pub log_level: String,
    /// Days a deleted item stays in the recycle bin.
    pub retention_days: u32,
    /// Seconds between expiry sweeps.
    pub sweep_interval: Duration,
    /// Upper bound on handling a single request.
    pub request_timeout: Duration,
    /// Largest accepted request body.
    pub max_body_bytes: usize,
    /// Origins allowed by CORS; empty means any.
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parsed("PORT", 3030)?,
            database_url: env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            db_max_connections: parsed("DB_MAX_CONNECTIONS", 20)?,
            db_min_connections: parsed("DB_MIN_CONNECTIONS", 5)?,
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "dev-secret-change-me-in-production".to_string()),
            event_bus_capacity: nonzero("EVENT_BUS_CAPACITY", 1024)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            retention_days: retention_days()?,
            sweep_interval: Duration::from_secs(nonzero("SWEEP_INTERVAL_SECS", 3600)?),
            request_timeout: Duration::from_secs(nonzero("REQUEST_TIMEOUT_SECS", 30)?),
            max_body_bytes: nonzero("MAX_BODY_BYTES", 1024 * 1024)?,
            cors_origins: env::var("CORS_ORIGINS")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
        })
    }

    /// Build the socket address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parsed<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}

/// Like [`parsed`], but zero is rejected. Intervals, capacities and windows
/// of zero panic deep inside tokio or chrono instead of failing here.
fn nonzero<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialEq + Default + ToString,
{
    let value = parsed(key, default)?;
    if value == T::default() {
        return Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        });
    }
    Ok(value)
}

fn retention_days() -> Result<u32, ConfigError> {
    let days = parsed("RETENTION_DAYS", RetentionPolicy::DEFAULT_DAYS)?;
    RetentionPolicy::days(days).map_err(|_| ConfigError::Invalid {
        key: "RETENTION_DAYS",
        value: days.to_string(),
    })?;
    Ok(days)
}

#[cfg(test)]
impl AppConfig {
    /// Defaults without touching the process environment.
    pub fn for_tests() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            database_url: String::new(),
            db_max_connections: 1,
            db_min_connections: 1,
            jwt_secret: "test-secret".to_string(),
            event_bus_capacity: 16,
            log_level: "debug".to_string(),
            retention_days: 30,
            sweep_interval: Duration::from_secs(3600),
            request_timeout: Duration::from_secs(5),
            max_body_bytes: 64 * 1024,
            cors_origins: Vec::new(),
        }
    }
}

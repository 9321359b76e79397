use std::path::PathBuf;

use chrono::{FixedOffset, Offset, Utc};
use routinely_core::calendar::parse_utc_offset;

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Offset used to turn completion instants into local calendar dates
    /// and to resolve "today" (default: `+00:00`).
    pub utc_offset: FixedOffset,
    /// Optional JSON seed file loaded into the in-memory store at startup.
    pub seed_path: Option<PathBuf>,
    /// Maximum number of memoized query results per cache (default: `1024`).
    pub cache_capacity: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                 |
    /// |------------------------|-------------------------|
    /// | `HOST`                 | `0.0.0.0`               |
    /// | `PORT`                 | `3000`                  |
    /// | `CORS_ORIGINS`         | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                    |
    /// | `UTC_OFFSET`           | `+00:00`                |
    /// | `SEED_PATH`            | unset                   |
    /// | `CACHE_CAPACITY`       | `1024`                  |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());

        let port = parse_var(&lookup, "PORT", 3000u16)?;

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = parse_var(&lookup, "REQUEST_TIMEOUT_SECS", 30u64)?;

        let utc_offset = match lookup("UTC_OFFSET") {
            Some(value) => parse_utc_offset(&value).map_err(|e| ConfigError::Invalid {
                var: "UTC_OFFSET",
                value,
                reason: e.to_string(),
            })?,
            None => Utc.fix(),
        };

        let seed_path = lookup("SEED_PATH")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let cache_capacity = parse_var(&lookup, "CACHE_CAPACITY", 1024usize)?;

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            utc_offset,
            seed_path,
            cache_capacity,
        })
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}

//! Environment configuration.
//!
//! Everything is read once at startup. Each struct has a `from_lookup`
//! constructor taking a key lookup function so tests never touch the process
//! environment.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|v| !v.trim().is_empty())
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match non_empty(lookup, key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name: key,
            value: raw,
        }),
    }
}

/// Postgres connection settings.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub max_lifetime: Duration,
    pub idle_timeout: Duration,
    /// Bound on acquiring the first connection and the startup ping.
    pub connect_timeout: Duration,
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// `DATABASE_URL` wins; otherwise the URL is assembled from `DB_*` parts.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let url = match non_empty(&lookup, "DATABASE_URL") {
            Some(url) => url,
            None => {
                let user = non_empty(&lookup, "DB_USER").ok_or(ConfigError::Missing("DB_USER"))?;
                let password = lookup("DB_PASSWORD").unwrap_or_default();
                let host = non_empty(&lookup, "DB_HOST").unwrap_or_else(|| "localhost".to_string());
                let port: u16 = parse_or(&lookup, "DB_PORT", 5432)?;
                let name = non_empty(&lookup, "DB_NAME").ok_or(ConfigError::Missing("DB_NAME"))?;
                let sslmode = non_empty(&lookup, "DB_SSLMODE").unwrap_or_else(|| "disable".to_string());
                format!("postgres://{user}:{password}@{host}:{port}/{name}?sslmode={sslmode}")
            }
        };

        let max_connections = parse_or(&lookup, "DB_MAX_CONNS", 25u32)?;
        let min_connections = parse_or(&lookup, "DB_MIN_CONNS", 5u32)?;
        if max_connections == 0 || min_connections > max_connections {
            return Err(ConfigError::Invalid {
                name: "DB_MIN_CONNS",
                value: format!("{min_connections} (max {max_connections})"),
            });
        }

        Ok(Self {
            url,
            max_connections,
            min_connections,
            max_lifetime: Duration::from_secs(60 * 60),
            idle_timeout: Duration::from_secs(30 * 60),
            connect_timeout: Duration::from_secs(10),
        })
    }

    /// Connection URL. Contains the password; do not log.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"<redacted>")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("max_lifetime", &self.max_lifetime)
            .field("idle_timeout", &self.idle_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
}

impl ServerConfig {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            port: parse_or(&lookup, "PORT", 3000)?,
        })
    }
}

/// Fixed-window rate limit per client address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let max_requests = parse_or(&lookup, "RATE_LIMIT_MAX", 100u32)?;
        let window_secs = parse_or(&lookup, "RATE_LIMIT_WINDOW_SECS", 60u64)?;
        if max_requests == 0 || window_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "RATE_LIMIT_MAX",
                value: format!("{max_requests} per {window_secs}s"),
            });
        }
        Ok(Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        })
    }
}

/// Per-operation execution deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTimeouts {
    pub aggregate: Duration,
    pub summary: Duration,
    pub dimensions: Duration,
    pub health: Duration,
}

impl Default for QueryTimeouts {
    fn default() -> Self {
        Self {
            aggregate: Duration::from_secs(30),
            summary: Duration::from_secs(10),
            dimensions: Duration::from_secs(5),
            health: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub rate_limit: RateLimitConfig,
    pub timeouts: QueryTimeouts,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            database: DatabaseConfig::from_lookup(&lookup)?,
            server: ServerConfig::from_lookup(&lookup)?,
            rate_limit: RateLimitConfig::from_lookup(&lookup)?,
            timeouts: QueryTimeouts::default(),
        })
    }
}

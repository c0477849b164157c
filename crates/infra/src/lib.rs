//! Infrastructure layer: configuration, query execution, report service.

pub mod config;
pub mod executor;
pub mod reports;

pub use config::{AppConfig, ConfigError, DatabaseConfig, QueryTimeouts, RateLimitConfig, ServerConfig};
pub use executor::{ExecError, PgExecutor, QueryExecutor, ScriptedExecutor};
pub use reports::{ReportError, ReportService};

//! Tracing/logging initialization.
//!
//! JSON lines to stdout, filtered by `RUST_LOG`. `LOG_FORMAT=text` switches to
//! the human-readable formatter for local runs.

use tracing_subscriber::EnvFilter;

/// Used when `RUST_LOG` is unset or unparsable. SQL statements are logged at
/// `debug` by the report service, so they stay quiet here.
pub const DEFAULT_FILTER: &str = "info,sqlx=warn,tower_http=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    /// Anything other than `text` (case-insensitive) means JSON.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(v) if v.trim().eq_ignore_ascii_case("text") => LogFormat::Text,
            _ => LogFormat::Json,
        }
    }
}

fn filter(default_directives: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives))
}

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(default_directives: &str) {
    let format = LogFormat::parse(std::env::var("LOG_FORMAT").ok().as_deref());

    let _ = match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter(default_directives))
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .with_current_span(true)
            .with_target(false)
            .try_init(),
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter(default_directives))
            .with_target(false)
            .try_init(),
    };
}

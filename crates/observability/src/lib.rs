//! Tracing and logging setup shared by the binaries.

/// Initialize process-wide tracing with the service's default filter.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init(tracing::DEFAULT_FILTER);
}

/// Tracing configuration (filters, formats).
pub mod tracing;

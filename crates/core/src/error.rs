//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic request failures (bad shape, bad values,
/// impossible dimension combinations). Execution failures belong to infra.
///
/// The `Display` output is the bare message: it is surfaced verbatim to API
/// callers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A request field failed validation (missing, out of range, not in an allow-list).
    #[error("{0}")]
    Validation(String),

    /// The requested dimensions cannot be served by a single fact table.
    #[error("{0}")]
    StructuralConflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn structural_conflict(msg: impl Into<String>) -> Self {
        Self::StructuralConflict(msg.into())
    }

    /// Stable machine-readable kind, used for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation_error",
            DomainError::StructuralConflict(_) => "structural_conflict",
        }
    }
}

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use tradewh_core::{DecodeError, SqlRow, Statement};

/// Failure running a statement.
///
/// Never shown to API callers verbatim; the HTTP layer logs it and answers with
/// a generic message.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("query timed out after {0:?}")]
    Timeout(Duration),

    #[error("database error: {0}")]
    Database(String),

    #[error("unsupported column type {type_name} at index {index}")]
    UnsupportedType { index: usize, type_name: String },

    #[error("failed to decode row: {0}")]
    Decode(#[from] DecodeError),
}

/// Runs positional statements (`$1`, `$2`, ...) with their bound arguments.
#[async_trait::async_trait]
pub trait QueryExecutor: Send + Sync {
    /// All rows, columns in select-list order.
    async fn fetch_all(&self, stmt: &Statement) -> Result<Vec<SqlRow>, ExecError>;

    /// First column of the single result row, as a 64-bit integer.
    async fn fetch_scalar(&self, stmt: &Statement) -> Result<i64, ExecError>;

    /// Round-trip to the database.
    async fn ping(&self) -> Result<(), ExecError>;
}

#[async_trait::async_trait]
impl<E> QueryExecutor for Arc<E>
where
    E: QueryExecutor + ?Sized,
{
    async fn fetch_all(&self, stmt: &Statement) -> Result<Vec<SqlRow>, ExecError> {
        (**self).fetch_all(stmt).await
    }

    async fn fetch_scalar(&self, stmt: &Statement) -> Result<i64, ExecError> {
        (**self).fetch_scalar(stmt).await
    }

    async fn ping(&self) -> Result<(), ExecError> {
        (**self).ping().await
    }
}

/// Bound `fut` by `limit`, mapping expiry to [`ExecError::Timeout`].
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T, ExecError>
where
    F: Future<Output = Result<T, ExecError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(ExecError::Timeout(limit)),
    }
}

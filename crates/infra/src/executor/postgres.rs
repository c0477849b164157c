//! Postgres-backed executor.
//!
//! Arguments are bound in order; array arguments go over the wire as
//! `BIGINT[]` / `TEXT[]` for `= ANY($n)` predicates.
//!
//! Rows are decoded generically by column type:
//!
//! | Postgres type | `SqlValue` |
//! |---------------|------------|
//! | `INT2`, `INT4`, `INT8` | `Int` |
//! | `TEXT`, `VARCHAR`, `BPCHAR`, `NAME` | `Text` |
//! | NULL of any of the above | `Null` |
//!
//! Anything else is an [`ExecError::UnsupportedType`]; statements cast sums to
//! `BIGINT` so `NUMERIC` never reaches this decoder.

use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{Column, Connection, PgPool, Postgres, Row, TypeInfo};
use tracing::instrument;

use tradewh_core::{SqlArg, SqlRow, SqlValue, Statement};

use super::r#trait::{with_timeout, ExecError, QueryExecutor};
use crate::config::DatabaseConfig;

/// Executor over a shared sqlx connection pool.
#[derive(Debug, Clone)]
pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open the pool and verify it with a ping, both within `connect_timeout`.
    #[instrument(skip(config), fields(max = config.max_connections, min = config.min_connections), err)]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, ExecError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .max_lifetime(config.max_lifetime)
            .idle_timeout(config.idle_timeout)
            .acquire_timeout(config.connect_timeout)
            .connect(config.url())
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        let executor = Self::new(pool);
        with_timeout(config.connect_timeout, executor.ping()).await?;
        Ok(executor)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait::async_trait]
impl QueryExecutor for PgExecutor {
    async fn fetch_all(&self, stmt: &Statement) -> Result<Vec<SqlRow>, ExecError> {
        let rows = bind_args(sqlx::query(&stmt.sql), &stmt.args)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch_all", e))?;

        rows.iter().map(decode_row).collect()
    }

    async fn fetch_scalar(&self, stmt: &Statement) -> Result<i64, ExecError> {
        let row = bind_args(sqlx::query(&stmt.sql), &stmt.args)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch_scalar", e))?;

        let value = decode_row(&row)?;
        Ok(value.i64(0)?)
    }

    async fn ping(&self) -> Result<(), ExecError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error("ping", e))?;
        conn.ping().await.map_err(|e| map_sqlx_error("ping", e))
    }
}

fn bind_args<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    args: &'q [SqlArg],
) -> Query<'q, Postgres, PgArguments> {
    for arg in args {
        query = match arg {
            SqlArg::Int(v) => query.bind(*v),
            SqlArg::BigInt(v) => query.bind(*v),
            SqlArg::Text(v) => query.bind(v.as_str()),
            SqlArg::BigIntArray(v) => query.bind(v.as_slice()),
            SqlArg::TextArray(v) => query.bind(v.as_slice()),
        };
    }
    query
}

fn decode_row(row: &PgRow) -> Result<SqlRow, ExecError> {
    let mut values = Vec::with_capacity(row.len());
    for column in row.columns() {
        let index = column.ordinal();
        let value = match column.type_info().name() {
            "INT2" => SqlValue::from(try_get::<Option<i16>>(row, index)?.map(i64::from)),
            "INT4" => SqlValue::from(try_get::<Option<i32>>(row, index)?),
            "INT8" => SqlValue::from(try_get::<Option<i64>>(row, index)?),
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => SqlValue::from(try_get::<Option<String>>(row, index)?),
            other => {
                return Err(ExecError::UnsupportedType {
                    index,
                    type_name: other.to_string(),
                });
            }
        };
        values.push(value);
    }
    Ok(SqlRow::new(values))
}

fn try_get<'r, T>(row: &'r PgRow, index: usize) -> Result<T, ExecError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(index)
        .map_err(|e| ExecError::Database(format!("column {index}: {e}")))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> ExecError {
    match err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(|c| c.to_string()).unwrap_or_default();
            ExecError::Database(format!("database error in {operation} [{code}]: {}", db_err.message()))
        }
        sqlx::Error::PoolTimedOut => {
            ExecError::Database(format!("timed out acquiring a connection in {operation}"))
        }
        sqlx::Error::PoolClosed => {
            ExecError::Database(format!("connection pool closed in {operation}"))
        }
        _ => ExecError::Database(format!("sqlx error in {operation}: {err}")),
    }
}

//! Query execution capability.
//!
//! Domain crates build [`tradewh_core::Statement`]s; an executor runs them and
//! hands back generic [`tradewh_core::SqlRow`]s. Postgres in production, a
//! scripted in-memory executor in tests.

mod postgres;
mod scripted;
mod r#trait;

pub use postgres::PgExecutor;
pub use r#trait::{with_timeout, ExecError, QueryExecutor};
pub use scripted::{CallKind, RecordedCall, ScriptedExecutor};

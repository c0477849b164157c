//! `tradewh-core`: shared building blocks for the reporting API.
//!
//! This crate contains **pure** primitives (no I/O): the domain error model and
//! the positional-statement types exchanged between statement builders and
//! query executors.

pub mod error;
pub mod sql;

pub use error::{DomainError, DomainResult};
pub use sql::{DecodeError, SqlArg, SqlRow, SqlValue, Statement};

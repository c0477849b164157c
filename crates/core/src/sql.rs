//! Positional SQL statements and the row values that come back from them.
//!
//! Statement builders in the domain crates produce a [`Statement`]; an executor
//! in infra binds the [`SqlArg`]s in order (`$1`, `$2`, ...) and returns
//! [`SqlRow`]s decoded into the small [`SqlValue`] set below.

use core::fmt;

use thiserror::Error;

/// A bound positional argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlArg {
    /// 32-bit integer (years).
    Int(i32),
    /// 64-bit integer (limits, offsets).
    BigInt(i64),
    /// Scalar text.
    Text(String),
    /// `BIGINT[]`, used with `= ANY($n)`.
    BigIntArray(Vec<i64>),
    /// `TEXT[]`, used with `= ANY($n)`.
    TextArray(Vec<String>),
}

/// A parameterized statement: SQL text with `$n` placeholders plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<SqlArg>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, args: Vec<SqlArg>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }

    /// Append an argument and return its 1-based placeholder (`$n`).
    pub fn push_arg(&mut self, arg: SqlArg) -> String {
        self.args.push(arg);
        format!("${}", self.args.len())
    }
}

/// A decoded column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Null,
    Int(i64),
    Text(String),
}

impl SqlValue {
    fn type_name(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Int(_) => "integer",
            SqlValue::Text(_) => "text",
        }
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(v.into())
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// Failure converting a column into the Rust type the caller asked for.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("column {index} out of range (row has {len} columns)")]
    OutOfRange { index: usize, len: usize },

    #[error("column {index}: expected {expected}, found {found}")]
    TypeMismatch {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    #[error("row has {found} columns, expected {expected}")]
    Arity { expected: usize, found: usize },
}

/// One result row, columns in select-list order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SqlRow(Vec<SqlValue>);

impl SqlRow {
    pub fn new(values: Vec<SqlValue>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&SqlValue, DecodeError> {
        self.0.get(index).ok_or(DecodeError::OutOfRange {
            index,
            len: self.0.len(),
        })
    }

    pub fn opt_i64(&self, index: usize) -> Result<Option<i64>, DecodeError> {
        match self.get(index)? {
            SqlValue::Null => Ok(None),
            SqlValue::Int(v) => Ok(Some(*v)),
            other => Err(mismatch(index, "integer", other)),
        }
    }

    pub fn i64(&self, index: usize) -> Result<i64, DecodeError> {
        match self.get(index)? {
            SqlValue::Int(v) => Ok(*v),
            other => Err(mismatch(index, "integer", other)),
        }
    }

    pub fn opt_i32(&self, index: usize) -> Result<Option<i32>, DecodeError> {
        match self.opt_i64(index)? {
            None => Ok(None),
            Some(v) => i32::try_from(v).map(Some).map_err(|_| DecodeError::TypeMismatch {
                index,
                expected: "32-bit integer",
                found: "64-bit integer",
            }),
        }
    }

    pub fn i32(&self, index: usize) -> Result<i32, DecodeError> {
        self.opt_i32(index)?
            .ok_or_else(|| mismatch(index, "integer", &SqlValue::Null))
    }

    pub fn opt_text(&self, index: usize) -> Result<Option<String>, DecodeError> {
        match self.get(index)? {
            SqlValue::Null => Ok(None),
            SqlValue::Text(v) => Ok(Some(v.clone())),
            other => Err(mismatch(index, "text", other)),
        }
    }

    pub fn text(&self, index: usize) -> Result<String, DecodeError> {
        match self.get(index)? {
            SqlValue::Text(v) => Ok(v.clone()),
            other => Err(mismatch(index, "text", other)),
        }
    }
}

impl From<Vec<SqlValue>> for SqlRow {
    fn from(values: Vec<SqlValue>) -> Self {
        Self(values)
    }
}

fn mismatch(index: usize, expected: &'static str, found: &SqlValue) -> DecodeError {
    DecodeError::TypeMismatch {
        index,
        expected,
        found: found.type_name(),
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

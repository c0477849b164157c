use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use tradewh_core::{SqlRow, Statement};

use super::r#trait::{ExecError, QueryExecutor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    FetchAll,
    FetchScalar,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub kind: CallKind,
    pub statement: Statement,
}

#[derive(Debug, Default)]
struct Script {
    rows: VecDeque<Result<Vec<SqlRow>, String>>,
    scalars: VecDeque<Result<i64, String>>,
    ping_error: Option<String>,
    delay: Option<Duration>,
    calls: Vec<RecordedCall>,
}

/// In-memory executor with canned responses.
///
/// Intended for tests/dev. Responses are consumed in FIFO order per call kind;
/// an exhausted queue yields no rows / a zero scalar. Every statement is
/// recorded for later inspection.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    script: Mutex<Script>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_rows(&self, rows: Vec<SqlRow>) -> &Self {
        self.lock().rows.push_back(Ok(rows));
        self
    }

    pub fn push_scalar(&self, value: i64) -> &Self {
        self.lock().scalars.push_back(Ok(value));
        self
    }

    /// Fail the next `fetch_all` with a database error.
    pub fn fail_next_fetch(&self, message: impl Into<String>) -> &Self {
        self.lock().rows.push_back(Err(message.into()));
        self
    }

    pub fn fail_ping(&self, message: impl Into<String>) -> &Self {
        self.lock().ping_error = Some(message.into());
        self
    }

    /// Sleep before answering every call.
    pub fn with_delay(&self, delay: Duration) -> &Self {
        self.lock().delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        // A poisoned script only means another test thread panicked mid-call.
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, kind: CallKind, stmt: &Statement) -> Option<Duration> {
        let mut script = self.lock();
        script.calls.push(RecordedCall {
            kind,
            statement: stmt.clone(),
        });
        script.delay
    }

    async fn pause(delay: Option<Duration>) {
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait::async_trait]
impl QueryExecutor for ScriptedExecutor {
    async fn fetch_all(&self, stmt: &Statement) -> Result<Vec<SqlRow>, ExecError> {
        let delay = self.record(CallKind::FetchAll, stmt);
        Self::pause(delay).await;
        let next = self.lock().rows.pop_front();
        match next {
            Some(Ok(rows)) => Ok(rows),
            Some(Err(message)) => Err(ExecError::Database(message)),
            None => Ok(Vec::new()),
        }
    }

    async fn fetch_scalar(&self, stmt: &Statement) -> Result<i64, ExecError> {
        let delay = self.record(CallKind::FetchScalar, stmt);
        Self::pause(delay).await;
        let next = self.lock().scalars.pop_front();
        match next {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(ExecError::Database(message)),
            None => Ok(0),
        }
    }

    async fn ping(&self) -> Result<(), ExecError> {
        let (delay, error) = {
            let script = self.lock();
            (script.delay, script.ping_error.clone())
        };
        Self::pause(delay).await;
        match error {
            Some(message) => Err(ExecError::Database(message)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradewh_core::{SqlArg, SqlValue};

    #[tokio::test]
    async fn responses_are_consumed_in_order_and_calls_recorded() {
        let exec = ScriptedExecutor::new();
        exec.push_rows(vec![SqlRow::new(vec![SqlValue::Int(1)])])
            .fail_next_fetch("boom")
            .push_scalar(42);

        let stmt = Statement::new("SELECT 1", vec![SqlArg::Int(7)]);
        assert_eq!(exec.fetch_all(&stmt).await.unwrap().len(), 1);
        assert!(matches!(exec.fetch_all(&stmt).await, Err(ExecError::Database(m)) if m == "boom"));
        assert!(exec.fetch_all(&stmt).await.unwrap().is_empty());
        assert_eq!(exec.fetch_scalar(&stmt).await.unwrap(), 42);
        assert_eq!(exec.fetch_scalar(&stmt).await.unwrap(), 0);

        let calls = exec.calls();
        assert_eq!(calls.len(), 5);
        assert_eq!(calls[3].kind, CallKind::FetchScalar);
        assert_eq!(calls[0].statement, stmt);
    }

    #[tokio::test]
    async fn ping_reports_configured_failure() {
        let exec = ScriptedExecutor::new();
        assert!(exec.ping().await.is_ok());
        exec.fail_ping("connection refused");
        assert!(exec.ping().await.is_err());
    }
}

//! Report service: the read-only operations exposed over HTTP.
//!
//! Each operation validates its input, builds statements with the domain
//! crates, and runs them through a [`QueryExecutor`] under a per-operation
//! deadline. No retries and no partial results.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, instrument};

use tradewh_core::{DecodeError, DomainError, SqlRow, Statement};
use tradewh_dimensions::{
    countries_statement, ports_statement, products_statement, Country, LookupQuery, Port, Product,
};
use tradewh_trade::{
    balance_statement, build_aggregate_query, summary_statement, validate, AggregateRequestBody,
    AggregateResult, PaginatedResponse, PaginationMeta, TradeBalance, TradeSummary, YearRange,
};

use crate::config::QueryTimeouts;
use crate::executor::{with_timeout, ExecError, QueryExecutor};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Execution(#[from] ExecError),
}

pub struct ReportService {
    executor: Arc<dyn QueryExecutor>,
    timeouts: QueryTimeouts,
}

impl ReportService {
    pub fn new(executor: Arc<dyn QueryExecutor>, timeouts: QueryTimeouts) -> Self {
        Self { executor, timeouts }
    }

    /// Grouped, filtered, sorted and paginated totals.
    ///
    /// Count and data statements run concurrently under one deadline; either
    /// failing fails the request.
    #[instrument(skip_all)]
    pub async fn aggregate(
        &self,
        body: AggregateRequestBody,
    ) -> Result<PaginatedResponse<AggregateResult>, ReportError> {
        let req = validate(body)
            .inspect_err(|e| debug!(kind = e.kind(), error = %e, "aggregate request rejected"))?;
        let query = build_aggregate_query(&req)?;
        debug!(sql = %query.count, args = ?query.count.args, "aggregate count statement");
        debug!(sql = %query.data, args = ?query.data.args, "aggregate data statement");

        let (total, rows) = with_timeout(self.timeouts.aggregate, async {
            tokio::try_join!(
                self.executor.fetch_scalar(&query.count),
                self.executor.fetch_all(&query.data),
            )
        })
        .await
        .inspect_err(|e| error!(error = %e, "aggregate query failed"))?;

        let data = decode_all(&rows, |row| AggregateResult::from_row(query.columns(), row))
            .inspect_err(|e| error!(error = %e, "aggregate rows failed to decode"))?;

        // COUNT(*) is never negative.
        let total = u64::try_from(total).unwrap_or(0);
        Ok(PaginatedResponse {
            data,
            pagination: PaginationMeta::new(&req.page, total),
        })
    }

    #[instrument(skip(self))]
    pub async fn summary(
        &self,
        start_year: Option<i32>,
        end_year: Option<i32>,
    ) -> Result<Vec<TradeSummary>, ReportError> {
        let years = YearRange::parse(start_year, end_year, "")?;
        let rows = self
            .run(summary_statement(years), "summary", self.timeouts.summary)
            .await?;
        Ok(decode_all(&rows, TradeSummary::from_row)?)
    }

    #[instrument(skip(self))]
    pub async fn balance(
        &self,
        start_year: Option<i32>,
        end_year: Option<i32>,
    ) -> Result<TradeBalance, ReportError> {
        let years = YearRange::parse(start_year, end_year, "")?;
        let rows = self
            .run(balance_statement(years), "balance", self.timeouts.summary)
            .await?;
        // An aggregate without GROUP BY always yields one row.
        let row = rows.first().ok_or(ExecError::Decode(DecodeError::Arity {
            expected: 1,
            found: 0,
        }))?;
        Ok(TradeBalance::from_row(years, row).map_err(ExecError::from)?)
    }

    #[instrument(skip(self))]
    pub async fn products(&self, query: LookupQuery) -> Result<Vec<Product>, ReportError> {
        let rows = self
            .run(products_statement(&query), "products", self.timeouts.dimensions)
            .await?;
        Ok(decode_all(&rows, Product::from_row)?)
    }

    #[instrument(skip(self))]
    pub async fn countries(&self, query: LookupQuery) -> Result<Vec<Country>, ReportError> {
        let rows = self
            .run(countries_statement(&query), "countries", self.timeouts.dimensions)
            .await?;
        Ok(decode_all(&rows, Country::from_row)?)
    }

    #[instrument(skip(self))]
    pub async fn ports(
        &self,
        query: LookupQuery,
        port_type: Option<String>,
    ) -> Result<Vec<Port>, ReportError> {
        let stmt = ports_statement(&query, port_type.as_deref());
        let rows = self.run(stmt, "ports", self.timeouts.dimensions).await?;
        Ok(decode_all(&rows, Port::from_row)?)
    }

    /// Ping the database within the health deadline.
    pub async fn health(&self) -> Result<(), ExecError> {
        with_timeout(self.timeouts.health, self.executor.ping()).await
    }

    async fn run(
        &self,
        stmt: Statement,
        operation: &'static str,
        limit: std::time::Duration,
    ) -> Result<Vec<SqlRow>, ExecError> {
        debug!(operation, sql = %stmt, args = ?stmt.args, "statement");
        with_timeout(limit, self.executor.fetch_all(&stmt))
            .await
            .inspect_err(|e| error!(operation, error = %e, "query failed"))
    }
}

fn decode_all<T>(
    rows: &[SqlRow],
    decode: impl Fn(&SqlRow) -> Result<T, DecodeError>,
) -> Result<Vec<T>, ExecError> {
    rows.iter()
        .map(|row| decode(row).map_err(ExecError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use serde_json::json;
    use tradewh_core::{SqlArg, SqlValue};

    use crate::executor::{CallKind, ScriptedExecutor};

    fn service(exec: Arc<ScriptedExecutor>) -> ReportService {
        ReportService::new(exec, QueryTimeouts::default())
    }

    fn body(v: serde_json::Value) -> AggregateRequestBody {
        serde_json::from_value(v).unwrap()
    }

    #[tokio::test]
    async fn aggregate_runs_count_and_data_and_paginates() {
        let exec = Arc::new(ScriptedExecutor::new());
        exec.push_scalar(101).push_rows(vec![
            SqlRow::new(vec![SqlValue::Int(2021), SqlValue::Int(900)]),
            SqlRow::new(vec![SqlValue::Int(2020), SqlValue::Int(500)]),
        ]);

        let page = service(exec.clone())
            .aggregate(body(json!({
                "date_range": { "start_year": 2020, "end_year": 2022 },
                "group_by": ["year"],
                "pagination": { "page": 5, "limit": 25 },
            })))
            .await
            .unwrap();

        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[0].year, Some(Some(2021)));
        assert_eq!(page.pagination.total_pages, 5);
        assert_eq!(page.pagination.total_count, 101);
        assert_eq!(page.pagination.page_size, 25);

        let calls = exec.calls();
        assert_eq!(calls.len(), 2);
        let data = calls.iter().find(|c| c.kind == CallKind::FetchAll).unwrap();
        assert_eq!(data.statement.args[2..], [SqlArg::BigInt(25), SqlArg::BigInt(100)]);
    }

    #[tokio::test]
    async fn validation_errors_never_reach_the_executor() {
        let exec = Arc::new(ScriptedExecutor::new());
        let err = service(exec.clone())
            .aggregate(body(json!({
                "date_range": { "start_year": 2020, "end_year": 2022 },
                "group_by": ["year"],
                "sorting": { "sort_by": "1=1; DROP TABLE x" },
            })))
            .await
            .unwrap_err();

        assert!(matches!(err, ReportError::Domain(DomainError::Validation(_))));
        assert!(exec.calls().is_empty());
    }

    #[tokio::test]
    async fn grain_conflict_is_a_domain_error() {
        let exec = Arc::new(ScriptedExecutor::new());
        let err = service(exec.clone())
            .aggregate(body(json!({
                "date_range": { "start_year": 2020, "end_year": 2022 },
                "group_by": ["product", "country"],
            })))
            .await
            .unwrap_err();

        assert!(matches!(err, ReportError::Domain(DomainError::StructuralConflict(_))));
        assert!(exec.calls().is_empty());
    }

    #[tokio::test]
    async fn data_failure_fails_the_whole_request() {
        let exec = Arc::new(ScriptedExecutor::new());
        exec.push_scalar(3).fail_next_fetch("relation does not exist");

        let err = service(exec)
            .aggregate(body(json!({
                "date_range": { "start_year": 2020, "end_year": 2022 },
                "group_by": ["trade_type"],
            })))
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::Execution(ExecError::Database(_))));
    }

    #[tokio::test]
    async fn malformed_rows_are_decode_errors() {
        let exec = Arc::new(ScriptedExecutor::new());
        exec.push_scalar(1)
            .push_rows(vec![SqlRow::new(vec![SqlValue::from("2020"), SqlValue::Int(1)])]);

        let err = service(exec)
            .aggregate(body(json!({
                "date_range": { "start_year": 2020, "end_year": 2020 },
                "group_by": ["year"],
            })))
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::Execution(ExecError::Decode(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_queries_time_out() {
        let exec = Arc::new(ScriptedExecutor::new());
        exec.with_delay(Duration::from_secs(60));

        let err = service(exec)
            .aggregate(body(json!({
                "date_range": { "start_year": 2020, "end_year": 2022 },
                "group_by": ["year"],
            })))
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::Execution(ExecError::Timeout(d)) if d == Duration::from_secs(30)));
    }

    #[tokio::test]
    async fn balance_echoes_range_and_summary_decodes_rows() {
        let exec = Arc::new(ScriptedExecutor::new());
        exec.push_rows(vec![SqlRow::new(vec![
            SqlValue::Int(300),
            SqlValue::Int(250),
            SqlValue::Int(100),
            SqlValue::Int(50),
        ])])
        .push_rows(vec![SqlRow::new(vec![
            SqlValue::Int(2020),
            SqlValue::Int(1),
            SqlValue::Int(2),
            SqlValue::Int(3),
            SqlValue::Int(4),
            SqlValue::Int(6),
        ])]);
        let svc = service(exec);

        let balance = svc.balance(Some(2019), Some(2021)).await.unwrap();
        assert_eq!((balance.start_year, balance.end_year, balance.trade_balance), (2019, 2021, 50));

        let summary = svc.summary(Some(2020), Some(2020)).await.unwrap();
        assert_eq!(summary[0].total_trade_value, 6);

        let err = svc.summary(Some(2021), Some(2020)).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "start_year must be less than or equal to end_year"
        );
    }

    #[tokio::test]
    async fn dimension_lookups_bind_search_and_limit() {
        let exec = Arc::new(ScriptedExecutor::new());
        exec.push_rows(vec![SqlRow::new(vec![
            SqlValue::Int(9),
            SqlValue::from("Jebel Ali"),
            SqlValue::Null,
            SqlValue::from("Sea"),
            SqlValue::Null,
            SqlValue::Int(1),
        ])]);

        let ports = service(exec.clone())
            .ports(LookupQuery::new(Some("jebel"), Some(900)), Some("Sea".into()))
            .await
            .unwrap();
        assert_eq!(ports[0].port_id, 9);

        let stmt = &exec.calls()[0].statement;
        assert_eq!(stmt.args.last(), Some(&SqlArg::BigInt(500)));
    }

    #[tokio::test]
    async fn health_reflects_ping() {
        let exec = Arc::new(ScriptedExecutor::new());
        let svc = service(exec.clone());
        assert!(svc.health().await.is_ok());
        exec.fail_ping("down");
        assert!(svc.health().await.is_err());
    }
}

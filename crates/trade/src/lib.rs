//! Trade reporting domain.
//!
//! The aggregate pipeline runs in three steps:
//! - [`validate`] turns a raw request body into an [`AggregateRequest`]
//! - [`build_aggregate_query`] renders data and count statements from one [`AggregatePlan`]
//! - [`AggregateResult::from_row`] materializes rows using the same plan's column list
//!
//! Yearly summary and trade balance statements live in [`summary`].

pub mod builder;
pub mod materialize;
pub mod page;
pub mod projection;
pub mod request;
pub mod summary;
pub mod validate;

pub use builder::{build_aggregate_query, AggregateQuery};
pub use materialize::{scan_targets, AggregateResult, Projected, ScanTarget};
pub use page::{total_pages, PaginatedResponse, PaginationMeta};
pub use projection::{AggregatePlan, Column, FactTable};
pub use request::{
    AggregateRequest, AggregateRequestBody, Dimension, Filters, PageRequest, SortField, SortOrder,
    Sorting, TradeType, YearRange, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT,
};
pub use summary::{balance_statement, summary_statement, TradeBalance, TradeSummary};
pub use validate::{check_grain, validate};

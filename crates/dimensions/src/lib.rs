//! Dimension lookups (products, countries, ports).
//!
//! Bilingual reference data used by clients to pick filter ids for aggregate
//! queries. Pure statement construction and row decoding; no IO.

pub mod lookup;
pub mod records;

pub use lookup::{
    countries_statement, escape_like, ports_statement, products_statement, LookupQuery,
    DEFAULT_LOOKUP_LIMIT, MAX_LOOKUP_LIMIT,
};
pub use records::{Country, Port, Product};

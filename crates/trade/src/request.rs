//! Aggregate request: the raw JSON body and its validated, typed form.
//!
//! Every string the client can send that ends up in SQL text is parsed into one
//! of the closed enums below (`Dimension`, `SortField`, `SortOrder`). Only their
//! `as_sql()` renderings are ever interpolated into a statement.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};

use tradewh_core::{DomainError, DomainResult};

/// Default page size when the client omits `pagination.limit`.
pub const DEFAULT_PAGE_LIMIT: u32 = 25;

/// Page sizes above this are clamped, not rejected.
pub const MAX_PAGE_LIMIT: u32 = 1000;

// -------------------------
// Raw request body
// -------------------------

/// `POST /api/v1/trade/aggregate` body, exactly as the client sent it.
///
/// Nothing here is trusted; see [`crate::validate::validate`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AggregateRequestBody {
    #[serde(deserialize_with = "null_as_default")]
    pub date_range: DateRangeBody,
    pub trade_types: Option<Vec<String>>,
    pub group_by: Option<Vec<String>>,
    #[serde(deserialize_with = "null_as_default")]
    pub filters: FiltersBody,
    #[serde(deserialize_with = "null_as_default")]
    pub pagination: PaginationBody,
    #[serde(deserialize_with = "null_as_default")]
    pub sorting: SortingBody,
}

/// An explicit `null` object reads the same as a missing one.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DateRangeBody {
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FiltersBody {
    pub product_ids: Option<Vec<i64>>,
    pub country_ids: Option<Vec<i64>>,
    pub port_ids: Option<Vec<i64>>,
    pub port_types: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PaginationBody {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SortingBody {
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

// -------------------------
// Closed vocabularies
// -------------------------

/// A grouping dimension.
///
/// Variant order is the projection order used by both the statement builder
/// and the result materializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Product,
    Country,
    Port,
    Year,
    TradeType,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::Product,
        Dimension::Country,
        Dimension::Port,
        Dimension::Year,
        Dimension::TradeType,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Dimension::Product => "product",
            Dimension::Country => "country",
            Dimension::Port => "port",
            Dimension::Year => "year",
            Dimension::TradeType => "trade_type",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TradeType {
    Import,
    Export,
    #[serde(rename = "Re-Export")]
    ReExport,
}

impl TradeType {
    pub const ALL: [TradeType; 3] = [TradeType::Import, TradeType::Export, TradeType::ReExport];

    /// Label as stored in the fact tables' `trade_type` column.
    pub fn as_str(self) -> &'static str {
        match self {
            TradeType::Import => "Import",
            TradeType::Export => "Export",
            TradeType::ReExport => "Re-Export",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

/// Allow-listed `ORDER BY` targets. Each renders to a select-list output name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    TotalValue,
    Year,
    ProductDescEn,
    CountryNameEn,
    PortNameEn,
    TradeType,
}

impl SortField {
    pub const ALL: [SortField; 6] = [
        SortField::TotalValue,
        SortField::Year,
        SortField::ProductDescEn,
        SortField::CountryNameEn,
        SortField::PortNameEn,
        SortField::TradeType,
    ];

    pub fn as_sql(self) -> &'static str {
        match self {
            SortField::TotalValue => "total_value",
            SortField::Year => "year",
            SortField::ProductDescEn => "product_desc_en",
            SortField::CountryNameEn => "country_name_en",
            SortField::PortNameEn => "port_name_en",
            SortField::TradeType => "trade_type",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_sql() == s)
    }

    /// The grouping dimension that must be projected for this field to be sortable.
    pub fn required_dimension(self) -> Option<Dimension> {
        match self {
            SortField::TotalValue => None,
            SortField::Year => Some(Dimension::Year),
            SortField::ProductDescEn => Some(Dimension::Product),
            SortField::CountryNameEn => Some(Dimension::Country),
            SortField::PortNameEn => Some(Dimension::Port),
            SortField::TradeType => Some(Dimension::TradeType),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

// -------------------------
// Validated request
// -------------------------

/// Inclusive year range, `start <= end`, both non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    start: i32,
    end: i32,
}

impl YearRange {
    /// Validate a pair of optional years.
    ///
    /// `prefix` names the enclosing field in error messages (`"date_range."` for
    /// the aggregate body, `""` for query-string endpoints).
    pub fn parse(start: Option<i32>, end: Option<i32>, prefix: &str) -> DomainResult<Self> {
        let (start, end) = match (start, end) {
            (Some(s), Some(e)) if s != 0 && e != 0 => (s, e),
            _ => {
                return Err(DomainError::validation(format!(
                    "{prefix}start_year and {prefix}end_year are required"
                )));
            }
        };
        if start > end {
            return Err(DomainError::validation(format!(
                "{prefix}start_year must be less than or equal to {prefix}end_year"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn end(&self) -> i32 {
        self.end
    }
}

/// Optional set-membership filters. Empty means "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub product_ids: Vec<i64>,
    pub country_ids: Vec<i64>,
    pub port_ids: Vec<i64>,
    pub port_types: Vec<String>,
}

impl Filters {
    pub fn filters_port(&self) -> bool {
        !self.port_ids.is_empty() || !self.port_types.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageRequest {
    /// Build a page request; `limit` is clamped to `1..=MAX_PAGE_LIMIT`, `page` to `>= 1`.
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_PAGE_LIMIT),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sorting {
    pub field: SortField,
    pub order: SortOrder,
}

impl Default for Sorting {
    fn default() -> Self {
        Self {
            field: SortField::TotalValue,
            order: SortOrder::Desc,
        }
    }
}

/// A validated aggregation request with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRequest {
    pub years: YearRange,
    pub trade_types: Vec<TradeType>,
    pub group_by: BTreeSet<Dimension>,
    pub filters: Filters,
    pub page: PageRequest,
    pub sorting: Sorting,
}

impl AggregateRequest {
    pub fn groups_by(&self, dimension: Dimension) -> bool {
        self.group_by.contains(&dimension)
    }

    /// Product rows live in the product×port fact table.
    pub fn needs_product(&self) -> bool {
        self.groups_by(Dimension::Product) || !self.filters.product_ids.is_empty()
    }

    /// Country rows live in the country×port fact table.
    pub fn needs_country(&self) -> bool {
        self.groups_by(Dimension::Country) || !self.filters.country_ids.is_empty()
    }
}

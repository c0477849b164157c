//! Fact-table selection and the ordered column list for an aggregate request.
//!
//! [`AggregatePlan`] is computed once per request. The statement builder renders
//! its columns into the select/group-by lists and the materializer turns the
//! very same list into scan targets, so the two can never disagree on arity or
//! order.

use tradewh_core::DomainResult;

use crate::request::{AggregateRequest, Dimension};
use crate::validate::check_grain;

/// Fact tables; each stores trade value at a fixed grain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactTable {
    /// product × port × year × trade type
    ProductPort,
    /// country × port × year × trade type
    CountryPort,
}

impl FactTable {
    pub fn as_sql(self) -> &'static str {
        match self {
            FactTable::ProductPort => "fact_trade_by_product_port",
            FactTable::CountryPort => "fact_trade_by_country_port",
        }
    }
}

/// A column of the aggregate select list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    ProductId,
    ProductDescEn,
    ProductDescAr,
    CountryId,
    CountryNameEn,
    CountryNameAr,
    PortId,
    PortNameEn,
    PortNameAr,
    Year,
    TradeType,
    TotalValue,
}

impl Column {
    /// Qualified expression, as used in GROUP BY.
    pub fn expr(self) -> &'static str {
        match self {
            Column::ProductId => "p.product_id",
            Column::ProductDescEn => "p.product_desc_en",
            Column::ProductDescAr => "p.product_desc_ar",
            Column::CountryId => "c.country_id",
            Column::CountryNameEn => "c.country_name_en",
            Column::CountryNameAr => "c.country_name_ar",
            Column::PortId => "dp.port_id",
            Column::PortNameEn => "dp.port_name_en",
            Column::PortNameAr => "dp.port_name_ar",
            Column::Year => "f.year",
            Column::TradeType => "f.trade_type",
            Column::TotalValue => "COALESCE(SUM(f.value), 0)::BIGINT",
        }
    }

    /// Output column name.
    pub fn name(self) -> &'static str {
        match self {
            Column::TotalValue => "total_value",
            other => match other.expr().split_once('.') {
                Some((_, name)) => name,
                None => other.expr(),
            },
        }
    }

    /// Select-list item: the expression, aliased when it is not a plain column.
    pub fn select_item(self) -> String {
        match self {
            Column::TotalValue => format!("{} AS {}", self.expr(), self.name()),
            other => other.expr().to_string(),
        }
    }

    pub fn is_aggregate(self) -> bool {
        matches!(self, Column::TotalValue)
    }
}

impl Dimension {
    /// Columns this dimension contributes when grouped on.
    pub fn columns(self) -> &'static [Column] {
        match self {
            Dimension::Product => &[Column::ProductId, Column::ProductDescEn, Column::ProductDescAr],
            Dimension::Country => &[Column::CountryId, Column::CountryNameEn, Column::CountryNameAr],
            Dimension::Port => &[Column::PortId, Column::PortNameEn, Column::PortNameAr],
            Dimension::Year => &[Column::Year],
            Dimension::TradeType => &[Column::TradeType],
        }
    }

    /// Join to the dimension table, if the dimension is not a fact-table column.
    pub fn join(self) -> Option<&'static str> {
        match self {
            Dimension::Product => Some("JOIN dim_product p ON f.product_id = p.product_id"),
            Dimension::Country => Some("JOIN dim_country c ON f.country_id = c.country_id"),
            Dimension::Port => Some("JOIN dim_port dp ON f.port_id = dp.port_id"),
            Dimension::Year | Dimension::TradeType => None,
        }
    }
}

/// Per-request query shape: which fact table, which joins, which columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatePlan {
    fact_table: FactTable,
    joins: Vec<Dimension>,
    columns: Vec<Column>,
}

impl AggregatePlan {
    pub fn for_request(req: &AggregateRequest) -> DomainResult<Self> {
        check_grain(req)?;

        let fact_table = if req.needs_product() {
            FactTable::ProductPort
        } else if req.needs_country() {
            FactTable::CountryPort
        } else {
            FactTable::ProductPort
        };

        // Dimension-table joins; the port join also backs port filters.
        let joins = [Dimension::Product, Dimension::Country, Dimension::Port]
            .into_iter()
            .filter(|d| req.groups_by(*d) || (*d == Dimension::Port && req.filters.filters_port()))
            .collect();

        // BTreeSet iteration is projection order.
        let columns = req
            .group_by
            .iter()
            .flat_map(|d| d.columns().iter().copied())
            .chain(std::iter::once(Column::TotalValue))
            .collect();

        Ok(Self {
            fact_table,
            joins,
            columns,
        })
    }

    pub fn fact_table(&self) -> FactTable {
        self.fact_table
    }

    /// Dimensions joined in, in join order.
    pub fn joins(&self) -> &[Dimension] {
        &self.joins
    }

    pub fn joins_port(&self) -> bool {
        self.joins.contains(&Dimension::Port)
    }

    /// Full select list; `TotalValue` is always last.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Grouping columns: the select list without the aggregate.
    pub fn group_columns(&self) -> impl Iterator<Item = Column> + '_ {
        self.columns.iter().copied().filter(|c| !c.is_aggregate())
    }
}

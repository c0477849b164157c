//! Aggregate statement builder.
//!
//! Produces a data statement and a count statement from one [`AggregatePlan`].
//! Both share the FROM/JOIN/WHERE/GROUP BY text and the filter arguments; only
//! the data statement carries ORDER BY and the trailing `LIMIT $n OFFSET $n+1`
//! arguments.

use tradewh_core::{DomainResult, SqlArg, Statement};

use crate::projection::{AggregatePlan, Column};
use crate::request::AggregateRequest;

/// Statements for one aggregate request, plus the plan that shaped them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateQuery {
    pub plan: AggregatePlan,
    pub data: Statement,
    pub count: Statement,
}

impl AggregateQuery {
    /// Select list of the data statement, in scan order.
    pub fn columns(&self) -> &[Column] {
        self.plan.columns()
    }
}

/// Build the data and count statements for a validated request.
///
/// Fails only with a structural conflict (product and country together), which
/// validation already rejects.
pub fn build_aggregate_query(req: &AggregateRequest) -> DomainResult<AggregateQuery> {
    let plan = AggregatePlan::for_request(req)?;

    let mut filters = Statement::default();
    let predicates = filter_predicates(req, &mut filters);

    let joins: String = plan
        .joins()
        .iter()
        .filter_map(|d| d.join())
        .map(|j| format!(" {j}"))
        .collect();

    let group_by = plan
        .group_columns()
        .map(Column::expr)
        .collect::<Vec<_>>()
        .join(", ");

    let select = plan
        .columns()
        .iter()
        .map(|c| c.select_item())
        .collect::<Vec<_>>()
        .join(", ");

    let body = format!(
        "FROM {fact} f{joins} WHERE {predicates} GROUP BY {group_by}",
        fact = plan.fact_table().as_sql(),
        predicates = predicates.join(" AND "),
    );

    let count = Statement::new(
        format!("SELECT COUNT(*) FROM (SELECT {group_by} {body}) AS grouped"),
        filters.args.clone(),
    );

    let mut data = filters;
    let limit = data.push_arg(SqlArg::BigInt(i64::from(req.page.limit())));
    let offset = data.push_arg(SqlArg::BigInt(
        i64::try_from(req.page.offset()).unwrap_or(i64::MAX),
    ));
    data.sql = format!(
        "SELECT {select} {body} ORDER BY {sort} {order} LIMIT {limit} OFFSET {offset}",
        sort = req.sorting.field.as_sql(),
        order = req.sorting.order.as_sql(),
    );

    Ok(AggregateQuery { plan, data, count })
}

/// WHERE predicates, pushing each argument as its predicate is appended.
fn filter_predicates(req: &AggregateRequest, stmt: &mut Statement) -> Vec<String> {
    let mut predicates = Vec::new();

    let start = stmt.push_arg(SqlArg::Int(req.years.start()));
    let end = stmt.push_arg(SqlArg::Int(req.years.end()));
    predicates.push(format!("f.year BETWEEN {start} AND {end}"));

    if !req.trade_types.is_empty() {
        let labels = req.trade_types.iter().map(|t| t.as_str().to_string()).collect();
        let p = stmt.push_arg(SqlArg::TextArray(labels));
        predicates.push(format!("f.trade_type = ANY({p})"));
    }

    let f = &req.filters;
    for (column, ids) in [
        ("f.product_id", &f.product_ids),
        ("f.country_id", &f.country_ids),
        ("f.port_id", &f.port_ids),
    ] {
        if !ids.is_empty() {
            let p = stmt.push_arg(SqlArg::BigIntArray(ids.clone()));
            predicates.push(format!("{column} = ANY({p})"));
        }
    }

    if !f.port_types.is_empty() {
        let p = stmt.push_arg(SqlArg::TextArray(f.port_types.clone()));
        predicates.push(format!("dp.port_type_en = ANY({p})"));
    }

    predicates
}

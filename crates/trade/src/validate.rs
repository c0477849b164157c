//! Aggregate request validation.
//!
//! Checks run in a fixed order and the first failure wins. Defaults are applied
//! only to fields the client left out, and only once every check has passed.

use std::collections::BTreeSet;

use tradewh_core::{DomainError, DomainResult};

use crate::request::{
    AggregateRequest, AggregateRequestBody, Dimension, Filters, PageRequest, SortField, SortOrder,
    Sorting, TradeType, YearRange, DEFAULT_PAGE_LIMIT,
};

/// Validate a raw body and produce a typed request with defaults applied.
pub fn validate(body: AggregateRequestBody) -> DomainResult<AggregateRequest> {
    // 1. date range
    let years = YearRange::parse(body.date_range.start_year, body.date_range.end_year, "date_range.")?;

    // 2. group_by
    let group_by = parse_group_by(body.group_by.as_deref().unwrap_or_default())?;

    // 3. trade types
    let trade_types = body
        .trade_types
        .unwrap_or_default()
        .iter()
        .map(|tt| {
            TradeType::parse(tt).ok_or_else(|| {
                DomainError::validation(format!(
                    "invalid trade_type: {tt}. Valid options: Import, Export, Re-Export"
                ))
            })
        })
        .collect::<DomainResult<Vec<_>>>()?;

    // 4. sort_by
    let sort_field = match body.sorting.sort_by.as_deref() {
        None => None,
        Some(s) => Some(SortField::parse(s).ok_or_else(|| {
            DomainError::validation(format!(
                "invalid sort_by field: {s}. Valid options: total_value, year, product_desc_en, country_name_en, port_name_en, trade_type"
            ))
        })?),
    };

    // 5. sort_order
    let sort_order = match body.sorting.sort_order.as_deref() {
        None => None,
        Some(s) => Some(SortOrder::parse(s).ok_or_else(|| {
            DomainError::validation(format!("invalid sort_order: {s}. Valid options: asc, desc"))
        })?),
    };

    // 6. pagination
    let page = parse_page(body.pagination.page, body.pagination.limit)?;

    let filters = Filters {
        product_ids: body.filters.product_ids.unwrap_or_default(),
        country_ids: body.filters.country_ids.unwrap_or_default(),
        port_ids: body.filters.port_ids.unwrap_or_default(),
        port_types: body.filters.port_types.unwrap_or_default(),
    };

    let defaults = Sorting::default();
    let req = AggregateRequest {
        years,
        trade_types,
        group_by,
        filters,
        page,
        sorting: Sorting {
            field: sort_field.unwrap_or(defaults.field),
            order: sort_order.unwrap_or(defaults.order),
        },
    };

    // 7. grain conflict
    check_grain(&req)?;

    // 8. sort target must be projected
    if let Some(required) = req.sorting.field.required_dimension() {
        if !req.groups_by(required) {
            return Err(DomainError::validation(format!(
                "sort_by field {} requires group_by to include {}",
                req.sorting.field.as_sql(),
                required.as_str()
            )));
        }
    }

    Ok(req)
}

/// Product and country live in different fact tables and cannot be combined.
pub fn check_grain(req: &AggregateRequest) -> DomainResult<()> {
    if req.needs_product() && req.needs_country() {
        return Err(DomainError::structural_conflict(
            "cannot query both products and countries in the same request: they are stored in separate fact tables",
        ));
    }
    Ok(())
}

fn parse_group_by(raw: &[String]) -> DomainResult<BTreeSet<Dimension>> {
    if raw.is_empty() {
        return Err(DomainError::validation(
            "group_by is required and must contain at least one field",
        ));
    }

    let mut dims = BTreeSet::new();
    for g in raw {
        let dim = Dimension::parse(g).ok_or_else(|| {
            DomainError::validation(format!(
                "invalid group_by field: {g}. Valid options: year, product, country, port, trade_type"
            ))
        })?;
        if !dims.insert(dim) {
            return Err(DomainError::validation(format!("duplicate group_by field: {g}")));
        }
    }
    Ok(dims)
}

fn parse_page(page: Option<i64>, limit: Option<i64>) -> DomainResult<PageRequest> {
    let page = match page {
        None => 1,
        Some(p) if p >= 1 => u32::try_from(p)
            .map_err(|_| DomainError::validation("pagination.page is too large"))?,
        Some(p) => {
            return Err(DomainError::validation(format!(
                "invalid pagination.page: {p}. Must be >= 1"
            )));
        }
    };

    let limit = match limit {
        None => DEFAULT_PAGE_LIMIT,
        // Anything above the cap is clamped by PageRequest::new.
        Some(l) if l >= 1 => u32::try_from(l).unwrap_or(u32::MAX),
        Some(l) => {
            return Err(DomainError::validation(format!(
                "invalid pagination.limit: {l}. Must be between 1 and 1000"
            )));
        }
    };

    Ok(PageRequest::new(page, limit))
}

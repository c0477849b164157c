//! Aggregate result rows.
//!
//! A single [`AggregateResult`] type covers every `group_by` combination: each
//! projected field is `Option<Option<T>>` where the outer `None` means "not
//! requested" (omitted from JSON) and `Some(None)` means "requested, NULL"
//! (serialized as `null`).

use serde::Serialize;

use tradewh_core::{DecodeError, SqlRow, SqlValue};

use crate::projection::Column;

/// Outer `Option`: projected or not. Inner `Option`: SQL NULL or a value.
pub type Projected<T> = Option<Option<T>>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregateResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Projected<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Projected<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_desc_en: Projected<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_desc_ar: Projected<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_id: Projected<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_name_en: Projected<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_name_ar: Projected<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_id: Projected<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_name_en: Projected<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_name_ar: Projected<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_type: Projected<String>,
    pub total_value: i64,
}

/// A writable destination for one select-list column.
#[derive(Debug)]
pub enum ScanTarget<'a> {
    BigInt(&'a mut Projected<i64>),
    Int(&'a mut Projected<i32>),
    Text(&'a mut Projected<String>),
    Total(&'a mut i64),
}

impl ScanTarget<'_> {
    /// Decode column `index` of `row` into this slot.
    pub fn scan(self, row: &SqlRow, index: usize) -> Result<(), DecodeError> {
        match self {
            ScanTarget::BigInt(slot) => *slot = Some(row.opt_i64(index)?),
            ScanTarget::Int(slot) => *slot = Some(row.opt_i32(index)?),
            ScanTarget::Text(slot) => *slot = Some(row.opt_text(index)?),
            // SUM over an all-NULL group.
            ScanTarget::Total(slot) => *slot = row.opt_i64(index)?.unwrap_or(0),
        }
        Ok(())
    }
}

/// Slots of `result`, one per column, in `columns` order.
///
/// `columns` must come from the same `AggregatePlan` that rendered the select
/// list; each column appears at most once there.
pub fn scan_targets<'a>(columns: &[Column], result: &'a mut AggregateResult) -> Vec<ScanTarget<'a>> {
    let AggregateResult {
        year,
        product_id,
        product_desc_en,
        product_desc_ar,
        country_id,
        country_name_en,
        country_name_ar,
        port_id,
        port_name_en,
        port_name_ar,
        trade_type,
        total_value,
    } = result;

    let mut year = Some(year);
    let mut product_id = Some(product_id);
    let mut product_desc_en = Some(product_desc_en);
    let mut product_desc_ar = Some(product_desc_ar);
    let mut country_id = Some(country_id);
    let mut country_name_en = Some(country_name_en);
    let mut country_name_ar = Some(country_name_ar);
    let mut port_id = Some(port_id);
    let mut port_name_en = Some(port_name_en);
    let mut port_name_ar = Some(port_name_ar);
    let mut trade_type = Some(trade_type);
    let mut total_value = Some(total_value);

    let mut targets = Vec::with_capacity(columns.len());
    for column in columns {
        let target = match column {
            Column::ProductId => product_id.take().map(ScanTarget::BigInt),
            Column::ProductDescEn => product_desc_en.take().map(ScanTarget::Text),
            Column::ProductDescAr => product_desc_ar.take().map(ScanTarget::Text),
            Column::CountryId => country_id.take().map(ScanTarget::BigInt),
            Column::CountryNameEn => country_name_en.take().map(ScanTarget::Text),
            Column::CountryNameAr => country_name_ar.take().map(ScanTarget::Text),
            Column::PortId => port_id.take().map(ScanTarget::BigInt),
            Column::PortNameEn => port_name_en.take().map(ScanTarget::Text),
            Column::PortNameAr => port_name_ar.take().map(ScanTarget::Text),
            Column::Year => year.take().map(ScanTarget::Int),
            Column::TradeType => trade_type.take().map(ScanTarget::Text),
            Column::TotalValue => total_value.take().map(ScanTarget::Total),
        };
        debug_assert!(target.is_some(), "column {column:?} listed twice");
        targets.extend(target);
    }
    targets
}

impl AggregateResult {
    /// Materialize one row of the data statement.
    pub fn from_row(columns: &[Column], row: &SqlRow) -> Result<Self, DecodeError> {
        if columns.len() != row.len() {
            return Err(DecodeError::Arity {
                expected: columns.len(),
                found: row.len(),
            });
        }

        let mut result = AggregateResult::default();
        for (index, target) in scan_targets(columns, &mut result).into_iter().enumerate() {
            target.scan(row, index)?;
        }
        Ok(result)
    }

    /// Inverse of [`AggregateResult::from_row`]; used by test executors.
    pub fn to_row(&self, columns: &[Column]) -> SqlRow {
        let values = columns
            .iter()
            .map(|c| match c {
                Column::ProductId => SqlValue::from(self.product_id.flatten()),
                Column::ProductDescEn => SqlValue::from(self.product_desc_en.clone().flatten()),
                Column::ProductDescAr => SqlValue::from(self.product_desc_ar.clone().flatten()),
                Column::CountryId => SqlValue::from(self.country_id.flatten()),
                Column::CountryNameEn => SqlValue::from(self.country_name_en.clone().flatten()),
                Column::CountryNameAr => SqlValue::from(self.country_name_ar.clone().flatten()),
                Column::PortId => SqlValue::from(self.port_id.flatten()),
                Column::PortNameEn => SqlValue::from(self.port_name_en.clone().flatten()),
                Column::PortNameAr => SqlValue::from(self.port_name_ar.clone().flatten()),
                Column::Year => SqlValue::from(self.year.flatten()),
                Column::TradeType => SqlValue::from(self.trade_type.clone().flatten()),
                Column::TotalValue => SqlValue::Int(self.total_value),
            })
            .collect();
        SqlRow::new(values)
    }
}

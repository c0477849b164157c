//! Yearly summary and trade balance over `fact_yearly_summary`.

use serde::Serialize;

use tradewh_core::{DecodeError, SqlArg, SqlRow, Statement};

use crate::request::YearRange;

/// One year of `fact_yearly_summary`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeSummary {
    pub year: i32,
    pub import_value: i64,
    pub export_value: i64,
    pub reexport_value: i64,
    pub tradebalance_value: i64,
    pub total_trade_value: i64,
}

impl TradeSummary {
    pub fn from_row(row: &SqlRow) -> Result<Self, DecodeError> {
        Ok(Self {
            year: row.i32(0)?,
            import_value: row.i64(1)?,
            export_value: row.i64(2)?,
            reexport_value: row.i64(3)?,
            tradebalance_value: row.i64(4)?,
            total_trade_value: row.i64(5)?,
        })
    }
}

/// Totals over a year range. `trade_balance = export + re-export - import`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeBalance {
    pub start_year: i32,
    pub end_year: i32,
    pub total_import: i64,
    pub total_export: i64,
    pub total_reexport: i64,
    pub trade_balance: i64,
}

impl TradeBalance {
    pub fn from_row(years: YearRange, row: &SqlRow) -> Result<Self, DecodeError> {
        Ok(Self {
            start_year: years.start(),
            end_year: years.end(),
            total_import: row.i64(0)?,
            total_export: row.i64(1)?,
            total_reexport: row.i64(2)?,
            trade_balance: row.i64(3)?,
        })
    }
}

pub fn summary_statement(years: YearRange) -> Statement {
    Statement::new(
        r#"
        SELECT
            year,
            COALESCE(import_value, 0)::BIGINT AS import_value,
            COALESCE(export_value, 0)::BIGINT AS export_value,
            COALESCE(reexport_value, 0)::BIGINT AS reexport_value,
            COALESCE(tradebalance_value, 0)::BIGINT AS tradebalance_value,
            (COALESCE(import_value, 0) + COALESCE(export_value, 0) + COALESCE(reexport_value, 0))::BIGINT AS total_trade_value
        FROM fact_yearly_summary
        WHERE year BETWEEN $1 AND $2
        ORDER BY year
        "#,
        vec![SqlArg::Int(years.start()), SqlArg::Int(years.end())],
    )
}

pub fn balance_statement(years: YearRange) -> Statement {
    Statement::new(
        r#"
        SELECT
            COALESCE(SUM(import_value), 0)::BIGINT AS total_import,
            COALESCE(SUM(export_value), 0)::BIGINT AS total_export,
            COALESCE(SUM(reexport_value), 0)::BIGINT AS total_reexport,
            (COALESCE(SUM(export_value), 0) + COALESCE(SUM(reexport_value), 0) - COALESCE(SUM(import_value), 0))::BIGINT AS trade_balance
        FROM fact_yearly_summary
        WHERE year BETWEEN $1 AND $2
        "#,
        vec![SqlArg::Int(years.start()), SqlArg::Int(years.end())],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradewh_core::SqlValue;

    fn years() -> YearRange {
        YearRange::parse(Some(2019), Some(2021), "").unwrap()
    }

    #[test]
    fn statements_bind_the_year_range() {
        let s = summary_statement(years());
        assert!(s.sql.contains("WHERE year BETWEEN $1 AND $2"));
        assert!(s.sql.contains("ORDER BY year"));
        assert_eq!(s.args, vec![SqlArg::Int(2019), SqlArg::Int(2021)]);

        let b = balance_statement(years());
        assert!(!b.sql.contains("GROUP BY"));
        assert_eq!(b.args, s.args);
    }

    #[test]
    fn balance_echoes_the_range() {
        let row = SqlRow::new(vec![
            SqlValue::Int(300),
            SqlValue::Int(250),
            SqlValue::Int(100),
            SqlValue::Int(50),
        ]);
        let b = TradeBalance::from_row(years(), &row).unwrap();
        assert_eq!((b.start_year, b.end_year), (2019, 2021));
        assert_eq!(b.trade_balance, 50);
    }

    #[test]
    fn summary_rejects_short_rows() {
        let row = SqlRow::new(vec![SqlValue::Int(2020), SqlValue::Int(1)]);
        assert!(matches!(
            TradeSummary::from_row(&row),
            Err(DecodeError::OutOfRange { index: 2, len: 2 })
        ));
    }
}

use serde::Serialize;

use tradewh_core::{DecodeError, SqlRow};

/// Row of `dim_product`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub product_id: i64,
    pub product_desc_en: String,
    pub product_desc_ar: Option<String>,
}

impl Product {
    pub fn from_row(row: &SqlRow) -> Result<Self, DecodeError> {
        Ok(Self {
            product_id: row.i64(0)?,
            product_desc_en: row.text(1)?,
            product_desc_ar: row.opt_text(2)?,
        })
    }
}

/// Row of `dim_country`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Country {
    pub country_id: i64,
    pub country_name_en: String,
    pub country_name_ar: Option<String>,
}

impl Country {
    pub fn from_row(row: &SqlRow) -> Result<Self, DecodeError> {
        Ok(Self {
            country_id: row.i64(0)?,
            country_name_en: row.text(1)?,
            country_name_ar: row.opt_text(2)?,
        })
    }
}

/// Row of `dim_port`. `port_type_en` is one of `Sea`, `Land`, `Air` in practice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Port {
    pub port_id: i64,
    pub port_name_en: String,
    pub port_name_ar: Option<String>,
    pub port_type_en: Option<String>,
    pub port_type_ar: Option<String>,
    pub mode_id: Option<i32>,
}

impl Port {
    pub fn from_row(row: &SqlRow) -> Result<Self, DecodeError> {
        Ok(Self {
            port_id: row.i64(0)?,
            port_name_en: row.text(1)?,
            port_name_ar: row.opt_text(2)?,
            port_type_en: row.opt_text(3)?,
            port_type_ar: row.opt_text(4)?,
            mode_id: row.opt_i32(5)?,
        })
    }
}

//! Lookup statements over the dimension tables.

use tradewh_core::{SqlArg, Statement};

pub const DEFAULT_LOOKUP_LIMIT: u32 = 50;
pub const MAX_LOOKUP_LIMIT: u32 = 500;

/// Normalized `search` / `limit` parameters shared by every lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupQuery {
    search: Option<String>,
    limit: u32,
}

impl Default for LookupQuery {
    fn default() -> Self {
        Self {
            search: None,
            limit: DEFAULT_LOOKUP_LIMIT,
        }
    }
}

impl LookupQuery {
    /// Blank search text means "no search"; `limit` is clamped to `1..=500`.
    pub fn new(search: Option<&str>, limit: Option<i64>) -> Self {
        let search = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let limit = match limit {
            None => DEFAULT_LOOKUP_LIMIT,
            Some(l) => l.clamp(1, i64::from(MAX_LOOKUP_LIMIT)) as u32,
        };
        Self { search, limit }
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

/// Escape LIKE metacharacters so user text matches literally (backslash is
/// Postgres' default LIKE escape).
pub fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

struct Table {
    select: &'static str,
    from: &'static str,
    name_en: &'static str,
    name_ar: &'static str,
}

const PRODUCTS: Table = Table {
    select: "product_id, product_desc_en, product_desc_ar",
    from: "dim_product",
    name_en: "product_desc_en",
    name_ar: "product_desc_ar",
};

const COUNTRIES: Table = Table {
    select: "country_id, country_name_en, country_name_ar",
    from: "dim_country",
    name_en: "country_name_en",
    name_ar: "country_name_ar",
};

const PORTS: Table = Table {
    select: "port_id, port_name_en, port_name_ar, port_type_en, port_type_ar, mode_id",
    from: "dim_port",
    name_en: "port_name_en",
    name_ar: "port_name_ar",
};

fn lookup_statement(table: &Table, query: &LookupQuery, port_type: Option<&str>) -> Statement {
    let mut stmt = Statement::default();
    let mut predicates = Vec::new();

    if let Some(search) = query.search() {
        let p = stmt.push_arg(SqlArg::Text(format!("%{}%", escape_like(search))));
        predicates.push(format!("({en} ILIKE {p} OR {ar} ILIKE {p})", en = table.name_en, ar = table.name_ar));
    }
    if let Some(port_type) = port_type {
        let p = stmt.push_arg(SqlArg::Text(port_type.to_string()));
        predicates.push(format!("port_type_en = {p}"));
    }

    let mut sql = format!("SELECT {} FROM {}", table.select, table.from);
    if !predicates.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&predicates.join(" AND "));
    }
    let limit = stmt.push_arg(SqlArg::BigInt(i64::from(query.limit())));
    sql.push_str(&format!(" ORDER BY {} LIMIT {limit}", table.name_en));

    stmt.sql = sql;
    stmt
}

pub fn products_statement(query: &LookupQuery) -> Statement {
    lookup_statement(&PRODUCTS, query, None)
}

pub fn countries_statement(query: &LookupQuery) -> Statement {
    lookup_statement(&COUNTRIES, query, None)
}

/// `port_type` matches `port_type_en` exactly; blank means no filter.
pub fn ports_statement(query: &LookupQuery, port_type: Option<&str>) -> Statement {
    let port_type = port_type.map(str::trim).filter(|t| !t.is_empty());
    lookup_statement(&PORTS, query, port_type)
}

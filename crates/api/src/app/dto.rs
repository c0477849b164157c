use serde::{Deserialize, Serialize};

use tradewh_dimensions::LookupQuery;

/// Query-string integers are parsed leniently: anything unparsable counts as
/// absent, so a bad `limit` falls back to its default and a bad year reads as
/// "required".
fn lenient_int<T: std::str::FromStr>(raw: &Option<String>) -> Option<T> {
    raw.as_deref().and_then(|v| v.trim().parse().ok())
}

/// `?start_year=&end_year=`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct YearRangeParams {
    pub start_year: Option<String>,
    pub end_year: Option<String>,
}

impl YearRangeParams {
    pub fn years(&self) -> (Option<i32>, Option<i32>) {
        (lenient_int(&self.start_year), lenient_int(&self.end_year))
    }
}

/// `?search=&limit=` (plus `port_type=` for ports).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LookupParams {
    pub search: Option<String>,
    pub limit: Option<String>,
    pub port_type: Option<String>,
}

impl LookupParams {
    pub fn lookup(&self) -> LookupQuery {
        LookupQuery::new(self.search.as_deref(), lenient_int(&self.limit))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy",
            error: None,
        }
    }

    pub fn unhealthy(error: impl Into<String>) -> Self {
        Self {
            status: "unhealthy",
            error: Some(error.into()),
        }
    }
}

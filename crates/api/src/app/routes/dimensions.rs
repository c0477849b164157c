use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Extension, Query},
    routing::get,
    Json, Router,
};

use tradewh_dimensions::{Country, Port, Product};

use crate::app::dto::LookupParams;
use crate::app::errors::{invalid_query, ApiError};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/products", get(products))
        .route("/countries", get(countries))
        .route("/ports", get(ports))
}

pub async fn products(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<LookupParams>, QueryRejection>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let Query(params) = params.map_err(invalid_query)?;
    Ok(Json(services.reports.products(params.lookup()).await?))
}

pub async fn countries(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<LookupParams>, QueryRejection>,
) -> Result<Json<Vec<Country>>, ApiError> {
    let Query(params) = params.map_err(invalid_query)?;
    Ok(Json(services.reports.countries(params.lookup()).await?))
}

pub async fn ports(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<LookupParams>, QueryRejection>,
) -> Result<Json<Vec<Port>>, ApiError> {
    let Query(params) = params.map_err(invalid_query)?;
    let lookup = params.lookup();
    Ok(Json(services.reports.ports(lookup, params.port_type).await?))
}

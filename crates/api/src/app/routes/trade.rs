use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Extension, Query},
    routing::{get, post},
    Json, Router,
};

use tradewh_trade::{AggregateRequestBody, AggregateResult, PaginatedResponse, TradeBalance, TradeSummary};

use crate::app::dto::YearRangeParams;
use crate::app::errors::{invalid_body, invalid_query, ApiError};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/aggregate", post(aggregate))
        .route("/summary", get(summary))
        .route("/balance", get(balance))
}

pub async fn aggregate(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<AggregateRequestBody>, JsonRejection>,
) -> Result<Json<PaginatedResponse<AggregateResult>>, ApiError> {
    let Json(body) = body.map_err(invalid_body)?;

    Ok(Json(services.reports.aggregate(body).await?))
}

pub async fn summary(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<YearRangeParams>, QueryRejection>,
) -> Result<Json<Vec<TradeSummary>>, ApiError> {
    let Query(params) = params.map_err(invalid_query)?;
    let (start, end) = params.years();
    Ok(Json(services.reports.summary(start, end).await?))
}

pub async fn balance(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<YearRangeParams>, QueryRejection>,
) -> Result<Json<TradeBalance>, ApiError> {
    let Query(params) = params.map_err(invalid_query)?;
    let (start, end) = params.years();
    Ok(Json(services.reports.balance(start, end).await?))
}

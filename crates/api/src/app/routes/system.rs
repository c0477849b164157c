use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use crate::app::dto::HealthResponse;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

pub async fn health(Extension(services): Extension<Arc<AppServices>>) -> Response {
    match services.reports.health().await {
        Ok(()) => Json(HealthResponse::healthy()).into_response(),
        Err(e) => {
            warn!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse::unhealthy(e.to_string())),
            )
                .into_response()
        }
    }
}

pub async fn not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, format!("Cannot {method} {}", uri.path()))
}

//! Error responses.
//!
//! Every error leaves the API as `{error, code, path, method}` with `code` the
//! numeric status. Handlers and layers only know the status and message, so
//! they return a partial body and stash an [`ErrorMessage`] in the response
//! extensions; [`crate::middleware::request_context`] renders the full envelope
//! once the request path and method are at hand.

use std::any::Any;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{debug, error};

use tradewh_core::DomainError;
use tradewh_infra::ReportError;

use crate::context::RequestContext;

/// Message of an error response awaiting its envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMessage(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Generic 500; causes are logged where they happen, never returned.
    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => Self::new(StatusCode::BAD_REQUEST, msg),
            DomainError::StructuralConflict(msg) => Self::new(StatusCode::UNPROCESSABLE_ENTITY, msg),
        }
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::Domain(e) => e.into(),
            // Already logged by the report service.
            ReportError::Execution(_) => Self::internal(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        json_error(self.status, self.message)
    }
}

/// Malformed JSON, wrong field types, or a missing JSON content type.
pub fn invalid_body(rejection: JsonRejection) -> ApiError {
    debug!(error = %rejection.body_text(), "rejected request body");
    ApiError::bad_request("Invalid request body")
}

pub fn invalid_query(rejection: QueryRejection) -> ApiError {
    debug!(error = %rejection.body_text(), "rejected query string");
    ApiError::bad_request("Invalid query parameters")
}

/// Partial error body; the request-context middleware completes it.
pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    let message = message.into();
    let mut response = (
        status,
        Json(json!({
            "error": message,
            "code": status.as_u16(),
        })),
    )
        .into_response();
    response.extensions_mut().insert(ErrorMessage(message));
    response
}

/// Full error envelope for a request.
pub fn envelope(status: StatusCode, message: &str, ctx: &RequestContext) -> Response {
    (
        status,
        Json(json!({
            "error": message,
            "code": status.as_u16(),
            "path": ctx.path(),
            "method": ctx.method().as_str(),
        })),
    )
        .into_response()
}

/// `CatchPanicLayer` handler: log the payload, answer with a generic 500.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    };
    error!(panic = %detail, "handler panicked");
    ApiError::internal().into_response()
}

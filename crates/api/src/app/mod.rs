//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: report service wiring over a query executor
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: query-string parameters and response shapes
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue},
    routing::get,
    Extension, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    set_header::SetResponseHeaderLayer,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use tradewh_infra::RateLimitConfig;

use crate::middleware::{self, FixedWindowLimiter};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
///
/// Serve it with `into_make_service_with_connect_info::<SocketAddr>()` so the
/// rate limiter can key on the client address.
pub fn build_app(services: AppServices, rate_limit: RateLimitConfig) -> Router {
    let limiter = Arc::new(FixedWindowLimiter::new(rate_limit));

    let api = Router::new()
        .nest("/api/v1/trade", routes::trade::router())
        .nest("/api/v1/dimensions", routes::dimensions::router());

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(api)
        .fallback(routes::system::not_found)
        .layer(Extension(Arc::new(services)))
        .layer(
            ServiceBuilder::new()
                .layer(CompressionLayer::new())
                .layer(axum::middleware::from_fn(middleware::request_context))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(middleware::make_request_span)
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("SAMEORIGIN"),
                ))
                .layer(CatchPanicLayer::custom(errors::panic_response))
                .layer(axum::middleware::from_fn_with_state(limiter, middleware::rate_limit)),
        )
}

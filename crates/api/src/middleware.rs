use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{warn, Span};
use uuid::Uuid;

use tradewh_infra::RateLimitConfig;

use crate::app::errors::{envelope, ApiError, ErrorMessage};
use crate::context::RequestContext;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

const MAX_REQUEST_ID_LEN: usize = 128;

/// Attach a [`RequestContext`], propagate `x-request-id`, and render error
/// envelopes for every non-success response produced further in.
pub async fn request_context(mut req: Request, next: Next) -> Response {
    let request_id = incoming_request_id(req.headers()).unwrap_or_else(|| Uuid::now_v7().to_string());
    let ctx = RequestContext::new(req.method().clone(), req.uri().path(), request_id);

    let header_value = HeaderValue::from_str(ctx.request_id()).ok();
    if let Some(value) = &header_value {
        req.headers_mut().insert(REQUEST_ID_HEADER, value.clone());
    }
    req.extensions_mut().insert(ctx.clone());

    let mut response = finalize_error(next.run(req).await, &ctx);
    if let Some(value) = header_value {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

fn incoming_request_id(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(REQUEST_ID_HEADER)?.to_str().ok()?.trim();
    if value.is_empty() || value.len() > MAX_REQUEST_ID_LEN {
        return None;
    }
    Some(value.to_string())
}

/// Error responses either carry an [`ErrorMessage`] (ours) or come from the
/// framework with an empty/plain body (405, 415, ...). Both get the envelope;
/// JSON bodies without the marker (health) pass through untouched.
fn finalize_error(response: Response, ctx: &RequestContext) -> Response {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let message = match response.extensions().get::<ErrorMessage>() {
        Some(ErrorMessage(message)) => message.clone(),
        None if is_json(response.headers()) => return response,
        None => status.canonical_reason().unwrap_or("Error").to_string(),
    };

    let mut rendered = envelope(status, &message, ctx);
    for (name, value) in response.headers() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            rendered.headers_mut().append(name.clone(), value.clone());
        }
    }
    rendered
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

/// Span for `TraceLayer`, keyed by the request id set by [`request_context`].
pub fn make_request_span(req: &Request<Body>) -> Span {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    tracing::info_span!(
        "http_request",
        method = %req.method(),
        path = %req.uri().path(),
        request_id = %request_id,
    )
}

// -------------------------
// Rate limiting
// -------------------------

/// Once this many clients are tracked, expired windows are dropped on the next check.
const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

/// Fixed-window request counter per client key.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    max_requests: u32,
    window: Duration,
    clients: Mutex<HashMap<String, Window>>,
}

impl FixedWindowLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window: config.window,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn check(&self, client: &str, now: Instant) -> RateDecision {
        let mut clients = self.clients.lock().unwrap_or_else(|e| e.into_inner());

        if clients.len() >= PRUNE_THRESHOLD {
            clients.retain(|_, w| now.duration_since(w.started) < self.window);
        }

        let window = clients.entry(client.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(window.started) >= self.window {
            *window = Window {
                started: now,
                count: 0,
            };
        }

        if window.count >= self.max_requests {
            return RateDecision::Limited {
                retry_after: self.window.saturating_sub(now.duration_since(window.started)),
            };
        }
        window.count += 1;
        RateDecision::Allowed {
            remaining: self.max_requests - window.count,
        }
    }
}

/// Client address from `ConnectInfo`, or `"unknown"` when served without it.
fn client_key(req: &Request) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit(
    State(limiter): State<Arc<FixedWindowLimiter>>,
    req: Request,
    next: Next,
) -> Response {
    let client = client_key(&req);

    match limiter.check(&client, Instant::now()) {
        RateDecision::Allowed { remaining } => {
            let mut response = next.run(req).await;
            let headers = response.headers_mut();
            headers.insert("x-ratelimit-limit", HeaderValue::from(limiter.max_requests()));
            headers.insert("x-ratelimit-remaining", HeaderValue::from(remaining));
            response
        }
        RateDecision::Limited { retry_after } => {
            warn!(client = %client, "rate limit exceeded");
            let mut response = ApiError::new(StatusCode::TOO_MANY_REQUESTS, "Too Many Requests").into_response();
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after.as_secs().max(1)));
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    fn limiter(max: u32, secs: u64) -> FixedWindowLimiter {
        FixedWindowLimiter::new(RateLimitConfig {
            max_requests: max,
            window: Duration::from_secs(secs),
        })
    }

    #[test]
    fn limits_per_client_and_resets_with_the_window() {
        let l = limiter(2, 60);
        let t0 = Instant::now();

        assert_eq!(l.check("10.0.0.1", t0), RateDecision::Allowed { remaining: 1 });
        assert_eq!(l.check("10.0.0.1", t0), RateDecision::Allowed { remaining: 0 });
        assert!(matches!(l.check("10.0.0.1", t0 + Duration::from_secs(10)), RateDecision::Limited { retry_after } if retry_after == Duration::from_secs(50)));

        // Other clients have their own window.
        assert_eq!(l.check("10.0.0.2", t0), RateDecision::Allowed { remaining: 1 });

        assert_eq!(
            l.check("10.0.0.1", t0 + Duration::from_secs(60)),
            RateDecision::Allowed { remaining: 1 }
        );
    }

    #[test]
    fn request_id_is_taken_from_header_when_sane() {
        let mut headers = HeaderMap::new();
        assert_eq!(incoming_request_id(&headers), None);

        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("abc-123"));
        assert_eq!(incoming_request_id(&headers).as_deref(), Some("abc-123"));

        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_str(&"x".repeat(200)).unwrap());
        assert_eq!(incoming_request_id(&headers), None);
    }

    #[test]
    fn framework_errors_get_the_envelope() {
        let ctx = RequestContext::new(Method::GET, "/api/v1/trade/aggregate", "id");
        let mut bare = StatusCode::METHOD_NOT_ALLOWED.into_response();
        bare.headers_mut().insert(header::ALLOW, HeaderValue::from_static("POST"));

        let rendered = finalize_error(bare, &ctx);
        assert_eq!(rendered.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(is_json(rendered.headers()));
        assert_eq!(rendered.headers().get(header::ALLOW).unwrap(), "POST");
    }

    #[test]
    fn success_and_plain_json_errors_pass_through() {
        let ctx = RequestContext::new(Method::GET, "/health", "id");
        let ok = finalize_error(StatusCode::OK.into_response(), &ctx);
        assert_eq!(ok.status(), StatusCode::OK);
        assert!(!is_json(ok.headers()));

        let unhealthy = (
            StatusCode::SERVICE_UNAVAILABLE,
            axum::Json(serde_json::json!({ "status": "unhealthy" })),
        )
            .into_response();
        let passed = finalize_error(unhealthy, &ctx);
        assert!(passed.extensions().get::<ErrorMessage>().is_none());
    }
}

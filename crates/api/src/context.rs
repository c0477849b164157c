use axum::http::Method;

/// Per-request context, inserted into request extensions by
/// [`crate::middleware::request_context`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    method: Method,
    path: String,
    request_id: String,
}

impl RequestContext {
    pub fn new(method: Method, path: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            request_id: request_id.into(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

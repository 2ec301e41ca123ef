//! Inbound request handling.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for tracing
//! - Split the inbound request into the parts the pipeline reads:
//!   method, raw path suffix, query, headers and body
//!
//! # Design Decisions
//! - The suffix is taken from the raw path (still percent-encoded) so an
//!   embedded target URL is forwarded exactly as the caller wrote it
//! - The inbound request is consumed; its body moves into the outbound call

use axum::body::Body;
use axum::http::header::{HOST, REFERER};
use axum::http::{HeaderMap, HeaderValue, Method, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates a fresh UUID v4 for requests that arrive without an ID.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// A request as received by the proxy.
#[derive(Debug)]
pub struct InboundRequest {
    pub method: Method,
    /// Everything after the leading `/` of the path.
    pub suffix: String,
    /// Query string without the leading `?`.
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Body,
}

impl InboundRequest {
    pub fn from_request(request: Request<Body>) -> Self {
        let (parts, body) = request.into_parts();
        let path = parts.uri.path();
        let suffix = path.strip_prefix('/').unwrap_or(path).to_string();

        Self {
            method: parts.method,
            suffix,
            query: parts.uri.query().filter(|q| !q.is_empty()).map(str::to_string),
            headers: parts.headers,
            body,
        }
    }

    /// The Referer header, if present and readable.
    pub fn referer(&self) -> Option<&str> {
        self.headers.get(REFERER).and_then(|v| v.to_str().ok())
    }

    /// The Host the caller addressed this proxy with.
    pub fn host(&self) -> Option<&str> {
        self.headers.get(HOST).and_then(|v| v.to_str().ok())
    }

    pub fn request_id(&self) -> &str {
        self.headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
    }
}

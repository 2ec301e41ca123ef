//! Request pipeline errors and their HTTP mapping.
//!
//! Every failure the pipeline can produce is a `ProxyError`. The dispatch
//! layer turns it into a complete response: 400 for requests whose target
//! cannot be determined, 500 for everything else.

use axum::http::header::{InvalidHeaderValue, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Body returned when no target URL can be derived from the request.
pub const INVALID_URL_BODY: &str = "URL is invalid!";

/// Prefix of every 500 response body.
pub const LOAD_ERROR_PREFIX: &str = "Load page error: ";

/// Errors that can occur while forwarding a request.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Relative path suffix and no Referer to resolve it against.
    #[error("URL is invalid!")]
    InvalidRequest,

    /// The resolved target is not a parseable absolute URL.
    #[error("invalid target URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// A rewritten header value could not be encoded.
    #[error("invalid {name} header value: {source}")]
    InvalidHeader {
        name: &'static str,
        #[source]
        source: InvalidHeaderValue,
    },

    /// Building, sending or reading the outbound request failed.
    #[error(transparent)]
    Upstream(#[from] reqwest::Error),

    /// No response headers within the profile deadline.
    #[error("upstream did not respond within {0} seconds")]
    Timeout(u64),

    /// The per-server connection gate was shut down.
    #[error("upstream profile is no longer accepting requests")]
    ProfileUnavailable,
}

impl ProxyError {
    /// HTTP status reported to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::InvalidRequest => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::InvalidRequest => "invalid_request",
            ProxyError::InvalidUrl { .. } => "invalid_url",
            ProxyError::InvalidHeader { .. } => "invalid_header",
            ProxyError::Upstream(e) if e.is_connect() => "connect",
            ProxyError::Upstream(e) if e.is_timeout() => "timeout",
            ProxyError::Upstream(_) => "upstream",
            ProxyError::Timeout(_) => "timeout",
            ProxyError::ProfileUnavailable => "unavailable",
        }
    }

    /// Response body text for this error.
    pub fn body(&self) -> String {
        match self {
            ProxyError::InvalidRequest => INVALID_URL_BODY.to_string(),
            other => format!("{LOAD_ERROR_PREFIX}{other}"),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (
            self.status(),
            [(CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.body(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_request_maps_to_400() {
        let err = ProxyError::InvalidRequest;
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.body(), "URL is invalid!");
    }

    #[test]
    fn test_other_errors_map_to_500_with_prefix() {
        let err = ProxyError::Timeout(3);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body(), "Load page error: upstream did not respond within 3 seconds");

        let source = url::Url::parse("asset.js").unwrap_err();
        let err = ProxyError::InvalidUrl { url: "asset.js".into(), source };
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.body().starts_with(LOAD_ERROR_PREFIX));
    }
}

//! Outbound header translation.
//!
//! # Responsibilities
//! - Rewrite Host to the target server (or drop it for GitHub)
//! - Rewrite Referer to the resolved target so the proxy origin never leaks
//! - Copy every other header with all of its values, unvalidated
//! - Keep body-bound headers only when a body is forwarded
//!
//! # Design Decisions
//! - Header values are copied as raw bytes; malformed third-party values
//!   are passed on rather than rejected

use axum::http::header::{HeaderName, CONTENT_LENGTH, CONTENT_TYPE, HOST, REFERER};
use axum::http::{HeaderMap, HeaderValue, Method};

use crate::error::ProxyError;
use crate::routing::{Target, GITHUB_ORIGIN};

/// Headers describing the request body rather than the request.
fn is_body_header(name: &HeaderName) -> bool {
    *name == CONTENT_TYPE || *name == CONTENT_LENGTH
}

/// Whether the inbound body is forwarded for this method.
pub fn carries_body(method: &Method) -> bool {
    method != Method::GET
}

/// Build the outbound header set for `target`.
pub fn translate_headers(
    inbound: &HeaderMap,
    target: &Target,
    with_body: bool,
) -> Result<HeaderMap, ProxyError> {
    let mut outbound = HeaderMap::with_capacity(inbound.len());

    for name in inbound.keys() {
        if *name == HOST {
            if target.origin() != GITHUB_ORIGIN {
                outbound.insert(HOST, header_value("Host", target.host())?);
            }
            continue;
        }

        if *name == REFERER {
            let referer = if target.url().starts_with("http") {
                target.url()
            } else {
                target.origin()
            };
            outbound.insert(REFERER, header_value("Referer", referer)?);
            continue;
        }

        if !with_body && is_body_header(name) {
            continue;
        }

        for value in inbound.get_all(name) {
            outbound.append(name.clone(), value.clone());
        }
    }

    Ok(outbound)
}

fn header_value(name: &'static str, value: &str) -> Result<HeaderValue, ProxyError> {
    HeaderValue::from_str(value).map_err(|source| ProxyError::InvalidHeader { name, source })
}

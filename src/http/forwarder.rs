//! Outbound request execution.
//!
//! # Responsibilities
//! - Build the outbound request: URL with query, translated headers, body
//! - Wait for a per-server slot on the chosen profile
//! - Send and wait for response headers only, within the profile deadline
//!
//! # Design Decisions
//! - The inbound body is streamed, never buffered
//! - The deadline covers connect, send and response head; the body relay is
//!   not cut off once headers have arrived

use axum::body::HttpBody;
use url::Url;

use crate::error::ProxyError;
use crate::http::headers::{carries_body, translate_headers};
use crate::http::request::InboundRequest;
use crate::routing::Target;
use crate::upstream::{server_key, ServerSlot, UpstreamProfile};

/// An upstream response whose body has not been read yet.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub response: reqwest::Response,
    /// Held until the body relay finishes.
    pub slot: ServerSlot,
}

/// Translate an inbound request into an outbound one for `target`.
pub fn prepare(
    profile: &UpstreamProfile,
    target: &Target,
    inbound: InboundRequest,
) -> Result<reqwest::Request, ProxyError> {
    let outbound_url = target.outbound_url(inbound.query.as_deref());
    let url = Url::parse(&outbound_url).map_err(|source| ProxyError::InvalidUrl {
        url: outbound_url.clone(),
        source,
    })?;

    let with_body = carries_body(&inbound.method);
    let headers = translate_headers(&inbound.headers, target, with_body)?;

    let mut builder = profile
        .client()
        .request(inbound.method, url)
        .headers(headers);

    if with_body {
        let body = inbound.body;
        builder = if body.size_hint().exact() == Some(0) {
            builder.body(reqwest::Body::from(Vec::new()))
        } else {
            builder.body(reqwest::Body::wrap_stream(body.into_data_stream()))
        };
    }

    Ok(builder.build()?)
}

/// Send a prepared request through `profile`.
pub async fn send(
    profile: &UpstreamProfile,
    request: reqwest::Request,
) -> Result<UpstreamResponse, ProxyError> {
    let server = server_key(request.url());
    let slot = profile.gate().acquire(&server).await?;

    let response = tokio::time::timeout(profile.timeout, profile.client().execute(request))
        .await
        .map_err(|_| ProxyError::Timeout(profile.timeout.as_secs()))??;

    tracing::debug!(
        profile = %profile.id,
        server = %server,
        status = response.status().as_u16(),
        "Upstream responded"
    );

    Ok(UpstreamResponse { response, slot })
}

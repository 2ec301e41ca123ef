//! Response relay.
//!
//! # Responsibilities
//! - Copy upstream status and headers to the caller
//! - Drop Transfer-Encoding when the upstream body was chunked; the server
//!   re-frames the relayed body itself
//! - Default the content type when upstream sends none
//! - Stream the body to the caller as it arrives
//!
//! # Design Decisions
//! - One relay path for both framings: bodies of definite length are passed
//!   on in frames of at most the profile buffer size, chunked bodies frame
//!   by frame as received
//! - The upstream slot lives inside the body stream and is released when the
//!   caller has the whole body or disconnects

use axum::body::{Body, Bytes};
use axum::http::header::{CONTENT_TYPE, TRANSFER_ENCODING};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::Response;
use futures_util::{stream, StreamExt, TryStreamExt};

use crate::http::forwarder::UpstreamResponse;

/// Content type used when upstream does not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "text/html;charset=utf-8";

/// True when the response declares chunked transfer coding.
pub fn is_chunked(headers: &HeaderMap) -> bool {
    headers
        .get_all(TRANSFER_ENCODING)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
}

/// Headers sent back to the caller.
pub fn relay_headers(upstream: &HeaderMap, chunked: bool) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(upstream.len() + 1);
    for (name, value) in upstream {
        if chunked && *name == TRANSFER_ENCODING {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    if !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    }
    headers
}

/// Turn an upstream response into the caller's response.
pub fn relay(upstream: UpstreamResponse, frame_limit: usize) -> Response {
    let UpstreamResponse { response, slot } = upstream;
    let status = response.status();
    let chunked = is_chunked(response.headers());
    let headers = relay_headers(response.headers(), chunked);
    let definite = response.content_length().is_some();

    tracing::debug!(status = status.as_u16(), chunked, definite, "Relaying upstream body");

    let frames = response.bytes_stream();
    let frames = if definite {
        frames
            .flat_map(move |chunk| stream::iter(split_frames(chunk, frame_limit)))
            .left_stream()
    } else {
        frames.right_stream()
    };

    let body = frames
        .map(move |frame| {
            let _held = &slot;
            frame
        })
        .inspect_err(|e| tracing::warn!(error = %e, "Upstream body stream failed"));

    let mut relayed = Response::new(Body::from_stream(body));
    *relayed.status_mut() = status;
    *relayed.headers_mut() = headers;
    relayed
}

/// Split one received chunk into frames no larger than `limit`.
fn split_frames<E>(chunk: Result<Bytes, E>, limit: usize) -> Vec<Result<Bytes, E>> {
    match chunk {
        Ok(mut bytes) => {
            let mut frames = Vec::with_capacity(bytes.len() / limit.max(1) + 1);
            while bytes.len() > limit && limit > 0 {
                frames.push(Ok(bytes.split_to(limit)));
            }
            frames.push(Ok(bytes));
            frames
        }
        Err(e) => vec![Err(e)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::{CONTENT_LENGTH, SET_COOKIE};
    use std::convert::Infallible;

    #[test]
    fn test_detects_chunked() {
        let mut headers = HeaderMap::new();
        assert!(!is_chunked(&headers));

        headers.insert(TRANSFER_ENCODING, HeaderValue::from_static("gzip, Chunked"));
        assert!(is_chunked(&headers));

        headers.insert(TRANSFER_ENCODING, HeaderValue::from_static("gzip"));
        assert!(!is_chunked(&headers));
    }

    #[test]
    fn test_transfer_encoding_dropped_only_when_chunked() {
        let mut upstream = HeaderMap::new();
        upstream.insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        upstream.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        upstream.append(SET_COOKIE, HeaderValue::from_static("a=1"));
        upstream.append(SET_COOKIE, HeaderValue::from_static("b=2"));

        let relayed = relay_headers(&upstream, true);
        assert!(relayed.get(TRANSFER_ENCODING).is_none());
        assert_eq!(relayed.get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(relayed.get_all(SET_COOKIE).iter().count(), 2);

        let mut upstream = HeaderMap::new();
        upstream.insert(TRANSFER_ENCODING, HeaderValue::from_static("gzip"));
        let relayed = relay_headers(&upstream, false);
        assert_eq!(relayed.get(TRANSFER_ENCODING).unwrap(), "gzip");
    }

    #[test]
    fn test_content_type_defaults_to_html() {
        let mut upstream = HeaderMap::new();
        upstream.insert(CONTENT_LENGTH, HeaderValue::from_static("3"));
        let relayed = relay_headers(&upstream, false);
        assert_eq!(relayed.get(CONTENT_TYPE).unwrap(), "text/html;charset=utf-8");
        assert_eq!(relayed.get(CONTENT_LENGTH).unwrap(), "3");
    }

    #[test]
    fn test_split_frames() {
        let frames = split_frames::<Infallible>(Ok(Bytes::from_static(b"abcdefghij")), 4);
        let frames: Vec<Bytes> = frames.into_iter().map(Result::unwrap).collect();
        assert_eq!(frames, [&b"abcd"[..], &b"efgh"[..], &b"ij"[..]]);

        let frames = split_frames::<Infallible>(Ok(Bytes::from_static(b"abc")), 8192);
        assert_eq!(frames.len(), 1);

        let frames = split_frames::<&str>(Err("boom"), 4);
        assert!(matches!(frames.as_slice(), [Err("boom")]));
    }
}

//! Target URL resolution.
//!
//! # Responsibilities
//! - Accept absolute path suffixes (`/https://host/...`) as-is
//! - Resolve relative suffixes against the origin embedded in the Referer
//! - Derive the target origin (scheme + host) used by selection and headers
//!
//! # Design Decisions
//! - A Referer written by this proxy looks like `http://proxy/https://site/page`,
//!   so the origin is the first `/(https?://host)` segment
//! - An origin that cannot be extracted from the final URL falls back to
//!   `https://google.com`; the literal URL is still forwarded

use regex::Regex;
use std::sync::LazyLock;

use crate::error::ProxyError;

/// Origin assumed when none can be read from the target URL.
pub const FALLBACK_ORIGIN: &str = "https://google.com";

static EMBEDDED_ORIGIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(https?://[^/]+)").expect("embedded origin pattern"));

static ORIGIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(https?://[^/]+)").expect("origin pattern"));

/// Where a request is going. Built once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    url: String,
    origin: String,
}

impl Target {
    /// Resolved target URL, without the inbound query string.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Scheme and host of the target (or the fallback origin).
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// The origin with its scheme prefix removed, suitable for a Host header.
    pub fn host(&self) -> &str {
        self.origin
            .strip_prefix("https://")
            .or_else(|| self.origin.strip_prefix("http://"))
            .unwrap_or(&self.origin)
    }

    /// URL for the outbound request, with the inbound query appended verbatim.
    pub fn outbound_url(&self, query: Option<&str>) -> String {
        match query {
            Some(query) => format!("{}?{}", self.url, query),
            None => self.url.clone(),
        }
    }
}

/// Derive the target of a request.
///
/// `suffix` is the raw path after the leading `/`, `referer` the inbound
/// Referer header and `proxy_host` the inbound Host header, used to avoid
/// resolving a page against the proxy itself.
pub fn resolve(
    suffix: &str,
    referer: Option<&str>,
    proxy_host: Option<&str>,
) -> Result<Target, ProxyError> {
    let referer = referer.filter(|r| !r.is_empty());

    let url = if is_absolute(suffix) {
        suffix.to_string()
    } else {
        let referer = referer.ok_or(ProxyError::InvalidRequest)?;
        match referer_origin(referer, proxy_host) {
            Some(origin) => format!("{}/{}", origin, suffix),
            // Left as-is; the forwarder will reject it as an invalid URL.
            None => suffix.to_string(),
        }
    };

    let origin = ORIGIN
        .captures(&url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| FALLBACK_ORIGIN.to_string());

    Ok(Target { url, origin })
}

fn is_absolute(suffix: &str) -> bool {
    suffix.starts_with("http://") || suffix.starts_with("https://")
}

fn referer_origin<'a>(referer: &'a str, proxy_host: Option<&str>) -> Option<&'a str> {
    if let Some(m) = EMBEDDED_ORIGIN.captures(referer).and_then(|c| c.get(1)) {
        return Some(m.as_str());
    }

    // A Referer pointing straight at the real site rather than through the proxy.
    if !is_absolute(referer) {
        return None;
    }
    let origin = ORIGIN.captures(referer).and_then(|c| c.get(1))?.as_str();
    let host = origin.split_once("://").map(|(_, h)| h).unwrap_or(origin);
    match proxy_host {
        Some(proxy) if proxy.eq_ignore_ascii_case(host) => None,
        _ => Some(origin),
    }
}

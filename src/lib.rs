//! Single-endpoint HTTP forwarding proxy.
//!
//! A request for `/{target}` is forwarded to `target`; a request for a
//! relative path is resolved against the page named in its Referer. The
//! response is streamed back unchanged apart from a few framing headers.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod upstream;

pub use config::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;

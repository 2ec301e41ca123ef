//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → request.rs (split into suffix, query, headers, body)
//!     → [routing: resolve target, select profile]
//!     → headers.rs (translate headers for the target)
//!     → forwarder.rs (send, wait for response head)
//!     → response.rs (relay status, headers, streamed body)
//!     → Send to client
//! ```

pub mod forwarder;
pub mod headers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{InboundRequest, UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};

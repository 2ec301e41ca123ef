//! Upstream client subsystem.
//!
//! # Data Flow
//! ```text
//! UpstreamConfig (startup)
//!     → profile.rs (two reqwest clients: direct, redirect-follow)
//!     → gate.rs (per-server slot, held while the response streams)
//!     → shared read-only via Arc by every request
//! ```

pub mod gate;
pub mod profile;

pub use gate::{server_key, ConnectionGate, ServerSlot};
pub use profile::{ProfileId, UpstreamProfile, Upstreams};

//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound Request (path suffix, query, Referer, Host)
//!     → resolver.rs (absolute target URL + origin, computed once)
//!     → selector.rs (origin + URL → upstream profile)
//!     → Return: Target and ProfileId for the forwarder
//! ```
//!
//! # Design Decisions
//! - The target is derived once and never mutated; the query string is only
//!   attached when the outbound URL is built
//! - Selection and header translation read the same origin
//! - Deterministic: same input always yields the same target and profile

pub mod resolver;
pub mod selector;

pub use resolver::{resolve, Target, FALLBACK_ORIGIN};
pub use selector::{select_profile, GITHUB_ORIGIN};

//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, buffer sizes, connection caps)
//! - Check addresses and the SOCKS relay URL parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

const SOCKS_SCHEMES: &[&str] = &["socks4", "socks4a", "socks5", "socks5h"];

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("upstream.socks_proxy: '{0}' is not a valid URL")]
    InvalidProxyUrl(String),

    #[error("upstream.socks_proxy: unsupported scheme '{0}'")]
    UnsupportedProxyScheme(String),
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    let upstream = &config.upstream;
    if upstream.timeout_secs == 0 {
        errors.push(ValidationError::Zero("upstream.timeout_secs"));
    }
    if upstream.response_buffer_bytes == 0 {
        errors.push(ValidationError::Zero("upstream.response_buffer_bytes"));
    }
    if upstream.max_connections_per_server == 0 {
        errors.push(ValidationError::Zero("upstream.max_connections_per_server"));
    }

    if let Some(proxy) = &upstream.socks_proxy {
        match Url::parse(proxy) {
            Ok(url) if !SOCKS_SCHEMES.contains(&url.scheme()) => {
                errors.push(ValidationError::UnsupportedProxyScheme(url.scheme().to_string()));
            }
            Ok(_) => {}
            Err(_) => errors.push(ValidationError::InvalidProxyUrl(proxy.clone())),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

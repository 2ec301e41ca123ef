//! Outbound client profiles.
//!
//! Two profiles exist for the life of the process. Both share the timeout,
//! buffer and connection-limit settings, reject invalid server certificates,
//! and differ only in how they reach the target:
//!
//! | profile           | SOCKS relay | redirects |
//! |-------------------|-------------|-----------|
//! | `direct`          | yes         | relayed   |
//! | `redirect-follow` | no          | followed  |

use reqwest::redirect::Policy;
use std::fmt;
use std::time::Duration;

use crate::config::UpstreamConfig;
use crate::upstream::gate::ConnectionGate;

/// Identifies one of the two upstream profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileId {
    Direct,
    RedirectFollow,
}

impl ProfileId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileId::Direct => "direct",
            ProfileId::RedirectFollow => "redirect-follow",
        }
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configured outbound client. Read-only after construction.
#[derive(Debug)]
pub struct UpstreamProfile {
    pub id: ProfileId,
    /// Deadline for connect + send + response headers.
    pub timeout: Duration,
    /// Largest frame relayed at once for bodies of definite length.
    pub response_buffer_bytes: usize,
    pub follow_redirects: bool,
    pub max_connections_per_server: usize,
    socks_proxy: Option<String>,
    client: reqwest::Client,
    gate: ConnectionGate,
}

impl UpstreamProfile {
    /// Build a profile and its HTTP client.
    pub fn build(id: ProfileId, config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let follow_redirects = id == ProfileId::RedirectFollow;
        let socks_proxy = match id {
            ProfileId::Direct => config.socks_proxy.clone(),
            ProfileId::RedirectFollow => None,
        };

        let mut builder = reqwest::Client::builder()
            .connect_timeout(timeout)
            .pool_max_idle_per_host(config.max_connections_per_server)
            .redirect(if follow_redirects { Policy::default() } else { Policy::none() })
            .danger_accept_invalid_certs(false)
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .zstd(true);

        // Environment proxy variables are ignored; the profile decides.
        builder = match &socks_proxy {
            Some(proxy) => builder.no_proxy().proxy(reqwest::Proxy::all(proxy.as_str())?),
            None => builder.no_proxy(),
        };

        let client = builder.build()?;

        tracing::debug!(
            profile = %id,
            timeout_secs = config.timeout_secs,
            follow_redirects,
            socks_proxy = socks_proxy.as_deref().unwrap_or("none"),
            "Upstream profile ready"
        );

        Ok(Self {
            id,
            timeout,
            response_buffer_bytes: config.response_buffer_bytes,
            follow_redirects,
            max_connections_per_server: config.max_connections_per_server,
            socks_proxy,
            client,
            gate: ConnectionGate::new(config.max_connections_per_server),
        })
    }

    /// SOCKS relay this profile connects through, if any.
    pub fn socks_proxy(&self) -> Option<&str> {
        self.socks_proxy.as_deref()
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn gate(&self) -> &ConnectionGate {
        &self.gate
    }
}

/// Both profiles, created once at startup.
#[derive(Debug)]
pub struct Upstreams {
    direct: UpstreamProfile,
    redirect_follow: UpstreamProfile,
}

impl Upstreams {
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            direct: UpstreamProfile::build(ProfileId::Direct, config)?,
            redirect_follow: UpstreamProfile::build(ProfileId::RedirectFollow, config)?,
        })
    }

    pub fn get(&self, id: ProfileId) -> &UpstreamProfile {
        match id {
            ProfileId::Direct => &self.direct,
            ProfileId::RedirectFollow => &self.redirect_follow,
        }
    }
}

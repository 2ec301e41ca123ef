//! Per-server connection limits.
//!
//! # Responsibilities
//! - Cap concurrent outbound requests per target server
//! - Make callers wait for a free slot instead of failing
//! - Release the slot when the relayed response is finished or dropped
//! - Forget servers with no slot in use, so the map tracks only live targets

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::ProxyError;

type ServerMap = Arc<DashMap<String, Arc<Semaphore>>>;

/// Hands out connection slots keyed by server (scheme://host:port).
#[derive(Debug)]
pub struct ConnectionGate {
    max_per_server: usize,
    servers: ServerMap,
}

impl ConnectionGate {
    pub fn new(max_per_server: usize) -> Self {
        Self {
            max_per_server,
            servers: Arc::new(DashMap::new()),
        }
    }

    /// Wait for a slot on `server`.
    pub async fn acquire(&self, server: &str) -> Result<ServerSlot, ProxyError> {
        let semaphore = self
            .servers
            .entry(server.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(self.max_per_server)))
            .clone();

        if semaphore.available_permits() == 0 {
            tracing::debug!(server = %server, limit = self.max_per_server, "Waiting for upstream slot");
        }

        let permit = semaphore
            .acquire_owned()
            .await
            .map_err(|_| ProxyError::ProfileUnavailable)?;
        Ok(ServerSlot {
            permit: Some(permit),
            server: server.to_string(),
            servers: self.servers.clone(),
        })
    }

    /// Slots currently in use for `server`.
    pub fn in_use(&self, server: &str) -> usize {
        self.servers
            .get(server)
            .map(|s| self.max_per_server - s.available_permits())
            .unwrap_or(0)
    }

    /// Servers with at least one slot held or awaited.
    pub fn tracked_servers(&self) -> usize {
        self.servers.len()
    }
}

/// A held connection slot, released on drop.
#[derive(Debug)]
pub struct ServerSlot {
    permit: Option<OwnedSemaphorePermit>,
    server: String,
    servers: ServerMap,
}

impl Drop for ServerSlot {
    fn drop(&mut self) {
        drop(self.permit.take());
        // Every permit and every waiter holds a clone of the semaphore, so a
        // count of one means only the map still refers to it.
        self.servers
            .remove_if(&self.server, |_, semaphore| Arc::strong_count(semaphore) == 1);
    }
}

/// Key identifying a target server.
pub fn server_key(url: &url::Url) -> String {
    format!(
        "{}://{}:{}",
        url.scheme(),
        url.host_str().unwrap_or_default(),
        url.port_or_known_default().unwrap_or_default()
    )
}

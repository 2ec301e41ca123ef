//! HTTP server setup and the per-request pipeline.
//!
//! # Responsibilities
//! - Create the Axum Router with the catch-all proxy handler
//! - Wire up middleware (request ID, tracing)
//! - Bind server to listener with graceful shutdown
//! - Drive each request through resolve → select → translate → forward → stream
//! - Turn any pipeline failure into a complete error response

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::request::{InboundRequest, UuidRequestId};
use crate::http::{forwarder, response};
use crate::observability::metrics;
use crate::routing::{resolve, select_profile};
use crate::upstream::{ProfileId, Upstreams};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub upstreams: Arc<Upstreams>,
}

/// HTTP server for the forwarding proxy.
pub struct HttpServer {
    router: Router,
}

/// Pipeline position of a request, used to report where it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Resolving,
    Selecting,
    Translating,
    Forwarding,
    Streaming,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Resolving => "resolving",
            Stage::Selecting => "selecting",
            Stage::Translating => "translating",
            Stage::Forwarding => "forwarding",
            Stage::Streaming => "streaming",
        };
        f.write_str(name)
    }
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// Both upstream profiles are built here, once, and shared by every request.
    pub fn new(config: &ProxyConfig) -> Result<Self, reqwest::Error> {
        let upstreams = Arc::new(Upstreams::from_config(&config.upstream)?);
        let state = AppState { upstreams };

        let router = Self::build_router(state);
        Ok(Self { router })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all proxy handler.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let inbound = InboundRequest::from_request(request);
    let request_id = inbound.request_id().to_string();
    let method = inbound.method.to_string();

    match forward_request(&state, inbound, &request_id).await {
        Ok((profile, relayed)) => {
            metrics::record_request(&method, relayed.status().as_u16(), profile.as_str(), start_time);
            relayed
        }
        Err((stage, error)) => {
            if matches!(error, ProxyError::InvalidRequest) {
                tracing::warn!(request_id = %request_id, stage = %stage, "Rejected request without resolvable URL");
            } else {
                tracing::error!(request_id = %request_id, stage = %stage, error = %error, "Load page error");
            }
            metrics::record_upstream_error(error.kind());
            metrics::record_request(&method, error.status().as_u16(), "none", start_time);
            error.into_response()
        }
    }
}

async fn forward_request(
    state: &AppState,
    inbound: InboundRequest,
    request_id: &str,
) -> Result<(ProfileId, Response), (Stage, ProxyError)> {
    let mut stage = Stage::Resolving;
    tracing::debug!(request_id = %request_id, stage = %stage, suffix = %inbound.suffix, "Proxying request");
    let target = resolve(&inbound.suffix, inbound.referer(), inbound.host()).map_err(|e| (stage, e))?;

    stage = Stage::Selecting;
    let profile_id = select_profile(&target);
    let profile = state.upstreams.get(profile_id);
    tracing::debug!(
        request_id = %request_id,
        stage = %stage,
        url = %target.url(),
        origin = %target.origin(),
        profile = %profile_id,
        "Target resolved"
    );

    stage = Stage::Translating;
    let outbound = forwarder::prepare(profile, &target, inbound).map_err(|e| (stage, e))?;

    stage = Stage::Forwarding;
    tracing::debug!(request_id = %request_id, stage = %stage, url = %outbound.url(), "Sending upstream");
    let upstream = forwarder::send(profile, outbound).await.map_err(|e| (stage, e))?;

    stage = Stage::Streaming;
    tracing::debug!(request_id = %request_id, stage = %stage, "Streaming response");
    Ok((profile_id, response::relay(upstream, profile.response_buffer_bytes)))
}

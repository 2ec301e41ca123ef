//! Forwarding web proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!   GET /https://site/page?x=1
//!     → http::server    (request ID, tracing, catch-all route)
//!     → routing         (target URL + origin, upstream profile)
//!     → http::headers   (Host / Referer rewrite)
//!     → http::forwarder ── direct ──────────▶ SOCKS 127.0.0.1:1080 ──▶ site
//!                       └─ redirect-follow ─────────────────────────▶ github.com
//!     ← http::response  (status, headers, streamed body)
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use web_proxy::config::{load_config, validation::validate_config, ConfigError, ProxyConfig};
use web_proxy::lifecycle::{wait_for_signal, Shutdown};
use web_proxy::observability::{logging, metrics};
use web_proxy::HttpServer;

#[derive(Parser)]
#[command(name = "web-proxy")]
#[command(about = "Forward /{url} requests to their target and stream the response back", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_logging(&config.observability)?;

    tracing::info!("web-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        timeout_secs = config.upstream.timeout_secs,
        socks_proxy = config.upstream.socks_proxy.as_deref().unwrap_or("none"),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(&config)?;
    let mut server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        _ = wait_for_signal() => {
            shutdown.trigger();
            server_task.await??;
        }
        finished = &mut server_task => finished??,
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

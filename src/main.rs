//! rdev-router server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ───────────────▶ http::server ──▶ routing::Router ──▶ dispatch ──▶ controller
//!                      (request ID,     (first match per    (middleware
//!                       timeout)         method)             pipeline)
//!
//!     config file ──▶ config::loader ──▶ config::registrar ──▶ Router
//!          │                                                    ▲
//!          └── config::watcher ── reload ── rebuild ── swap ────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use rdev_router::config::{build_router, load_config, AppConfig, ConfigWatcher};
use rdev_router::dispatch::DependencyResolver;
use rdev_router::http::{apply_reloads, default_container, HttpServer};
use rdev_router::lifecycle::{signals, Shutdown};
use rdev_router::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "rdev-router")]
#[command(about = "Serve routes declared in a TOML file", long_about = None)]
struct Cli {
    /// Configuration file. Without one the server starts with no routes.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    logging::init(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "rdev-router starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        routes = config.routes.len(),
        groups = config.groups.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let resolver: Arc<dyn DependencyResolver> = Arc::new(default_container());
    let router = build_router(&config, resolver.clone())?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));

    let shutdown_grace = std::time::Duration::from_secs(config.timeouts.shutdown_secs);
    let server = HttpServer::new(config, router);

    // Dropping the watcher stops it, so it lives until main returns.
    let _watcher = match &cli.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            tokio::spawn(apply_reloads(server.routes(), updates, resolver, shutdown.clone()));
            match watcher.run() {
                Ok(watcher) => Some(watcher),
                Err(e) => {
                    tracing::warn!(error = %e, "Config watcher unavailable, hot reload disabled");
                    None
                }
            }
        }
        None => None,
    };

    let serving = tokio::spawn(server.run(listener, shutdown.clone()));
    shutdown.wait().await;

    match tokio::time::timeout(shutdown_grace, serving).await {
        Ok(result) => result??,
        Err(_) => tracing::warn!(grace_secs = shutdown_grace.as_secs(), "Shutdown deadline passed, exiting"),
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

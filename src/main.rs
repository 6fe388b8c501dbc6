//! Dashboard Gateway
//!
//! # Architecture Overview
//!
//! ```text
//!  Client ──▶ route table ──▶ credential ──▶ forwarder ──▶ Backend API
//!         (path rewrite)     (cookie|bearer)  (no redirects)
//!                                 │
//!                                 ▼
//!                          Identity Provider
//!
//!  Client ◀── translator ◀──────────────────────────────── Backend API
//!         (status, allow-listed headers, streamed body)
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use dashboard_gateway::config::{load_config, watcher::ConfigWatcher};
use dashboard_gateway::lifecycle::{signals, Shutdown};
use dashboard_gateway::observability::{logging, metrics};
use dashboard_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "dashboard-gateway")]
#[command(about = "Credential-injecting proxy between the dashboard and its backend API", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults plus environment overrides when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload the configuration file when it changes.
    #[arg(long, requires = "config")]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    logging::init(&config.observability);

    tracing::info!("dashboard-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        backend = %config.backend.base_url,
        credential_mode = config.credentials.mode.as_str(),
        routes = config.routes.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let (_watcher, config_updates) = match (&cli.config, cli.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        _ => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(&shutdown);

    let server = HttpServer::new(config)?;
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

//! vigil - the dead man's switch monitoring daemon
//!
//! Monitored apps check in over HTTP; silence beyond their configured
//! timeout raises repeated alerts until they check in again.
//!
//! # Usage
//!
//! ```bash
//! # Run with ./vigil.toml (or /etc/vigil/vigil.toml)
//! vigil
//!
//! # Explicit config file and listen address
//! vigil --config /path/to/vigil.toml --addr 0.0.0.0:9090
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use vigil::{api, notify, Config, WatcherRegistry};

#[derive(Parser, Debug)]
#[command(name = "vigil")]
#[command(about = "Dead man's switch monitoring daemon")]
#[command(version)]
struct CliArgs {
    /// Path to the TOML config file
    /// (default: ./vigil.toml, then /etc/vigil/vigil.toml)
    #[arg(short, long, env = "VIGIL_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listen address from the config file
    #[arg(short, long)]
    addr: Option<String>,

    /// Write logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.log_json);

    // Configuration errors are fatal before any watcher starts.
    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;

    let receivers =
        notify::from_config(&config.receivers).context("Failed to construct receivers")?;
    info!(
        apps = config.apps.len(),
        receivers = receivers.len(),
        "Configuration parsed"
    );

    let registry = Arc::new(
        WatcherRegistry::build(&config, &receivers).context("Failed to construct watchers")?,
    );
    registry.start_all();

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, shutting down...");
        shutdown_token.cancel();
    });

    let addr = args.addr.unwrap_or_else(|| config.listen.clone());
    let app = api::create_app(Arc::clone(&registry));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    info!(%addr, "Listening for liveness signals");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel_token.cancelled().await;
        })
        .await
        .context("HTTP server error")?;

    info!("Shutdown complete");
    Ok(())
}

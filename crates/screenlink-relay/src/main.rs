//! screenlink-relay: WebSocket relay for remote screen sharing.
//!
//! One agent per session streams screen frames; any number of viewers receive
//! them and send input back. Connections pick their role by path
//! (`/agent` or `/viewer`) and their session with the `sessionId` query
//! parameter.

mod connection;
mod liveness;
mod protocol;
mod registry;
mod relay;
mod router;
mod scale;
mod server;
mod session;

use std::path::PathBuf;

use clap::Parser;
use screenlink_config::DEFAULT_LOG_FILTER;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter};

use crate::server::RelayServer;

#[derive(Parser)]
#[command(name = "screenlink-relay", version, about = "WebSocket relay for remote screen sharing")]
struct Args {
    /// Port to listen on. Overrides `PORT` and the config file.
    #[arg(short, long)]
    port: Option<u16>,

    /// Config file path. Defaults to the platform config directory.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter override (e.g. `screenlink_relay=debug`).
    #[arg(long)]
    log_level: Option<String>,
}

/// Filter logging starts with. Pinned filters (from `RUST_LOG` or
/// `--log-level`) are not replaced by the configured one.
fn boot_filter(rust_log: Option<&str>, log_level: Option<&str>) -> (EnvFilter, bool) {
    if let Some(filter) = rust_log.and_then(|directives| EnvFilter::try_new(directives).ok()) {
        return (filter, true);
    }
    match log_level {
        Some(level) => (EnvFilter::new(level), true),
        None => (EnvFilter::new(DEFAULT_LOG_FILTER), false),
    }
}

#[tokio::main]
async fn main() -> screenlink_common::Result<()> {
    let args = Args::parse();

    // Logging starts before the config loads so loader warnings are kept.
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let (filter, pinned) = boot_filter(rust_log.as_deref(), args.log_level.as_deref());
    let (filter, filter_handle) = reload::Layer::new(filter);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    let mut config = screenlink_config::load_config(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.server.port = port;
    }

    if !pinned {
        if let Err(e) = filter_handle.reload(EnvFilter::new(&config.logging.filter)) {
            tracing::warn!(error = %e, "Failed to apply configured log filter");
        }
    }

    let server = RelayServer::bind(&config).await?;
    tracing::info!(
        addr = %server.local_addr()?,
        heartbeat_secs = config.liveness.heartbeat_interval_secs,
        "screenlink-relay listening"
    );

    let shutdown = server.shutdown_token();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Ctrl-C received, shutting down");
                shutdown.cancel();
            }
            Err(e) => tracing::warn!(error = %e, "Failed to listen for Ctrl-C"),
        }
    });

    server.run().await;
    Ok(())
}

//! Keygate access-key service.
//!
//! Issues prefixed access keys and validates them against signed,
//! time-fresh requests. All state is in-memory and resets on restart.
//!
//! Usage:
//!   keygate-server --port 3000
//!
//! The shared signing secret comes from `--secret` or the `KEYGATE_SECRET`
//! environment variable.

use anyhow::{Context, Result};
use clap::Parser;
use keygate_core::{GateConfig, Gatekeeper, Sweeper};
use keygate_server::{build_router, AppState, SERVICE_NAME};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

const DEFAULT_SECRET: &str = "keygate_default_secret";

#[derive(Parser, Debug)]
#[command(name = "keygate-server")]
#[command(about = "Keygate access-key HTTP service")]
struct Args {
    /// Port to listen on (falls back to the PORT environment variable)
    #[arg(short, long)]
    port: Option<u16>,

    /// Shared signing secret (falls back to KEYGATE_SECRET)
    #[arg(long)]
    secret: Option<String>,

    /// Validity window granted at first activation, in seconds
    #[arg(long, default_value = "32")]
    key_ttl_secs: i64,

    /// Interval between expiry sweeps, in seconds
    #[arg(long, default_value = "10")]
    sweep_interval_secs: u64,

    /// Maximum allowed request timestamp skew, in seconds
    #[arg(long, default_value = "30")]
    freshness_window_secs: i64,

    /// Require a HWID when issuing keys
    #[arg(long)]
    require_hwid: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    let port = args
        .port
        .or_else(|| {
            std::env::var("PORT")
                .ok()
                .and_then(|value| value.parse().ok())
        })
        .unwrap_or(3000);
    let secret = args
        .secret
        .or_else(|| std::env::var("KEYGATE_SECRET").ok())
        .unwrap_or_else(|| DEFAULT_SECRET.to_string());
    if secret == DEFAULT_SECRET {
        warn!("running with the default signing secret; set KEYGATE_SECRET");
    }

    let config = GateConfig {
        key_ttl_secs: args.key_ttl_secs,
        sweep_interval_secs: args.sweep_interval_secs,
        freshness_window_secs: args.freshness_window_secs,
        require_hwid: args.require_hwid,
        ..GateConfig::default()
    };
    let sweep_interval = Duration::from_secs(config.sweep_interval_secs);

    info!("{SERVICE_NAME} starting...");
    let gatekeeper = Gatekeeper::new(config, secret);
    let sweeper = Sweeper::spawn(gatekeeper.session_index(), sweep_interval);
    let state = Arc::new(AppState::new(gatekeeper));
    let app = build_router(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .context("failed to bind HTTP port")?;

    println!("\n========================================");
    println!("  {SERVICE_NAME} Running");
    println!("========================================");
    println!("  Port:           {port}");
    println!("  Key TTL:        {}s", args.key_ttl_secs);
    println!("  Sweep interval: {}s", args.sweep_interval_secs);
    println!("========================================\n");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    sweeper.shutdown().await;
    info!("sweeper stopped, shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
    }
}

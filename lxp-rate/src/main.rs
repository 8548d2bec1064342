//! Listening experiment rating service (lxp-rate) - Main entry point
//!
//! Serves the stimulus pairing/sequencing engine over HTTP, plus the audio
//! files themselves and a PIN-gated results view.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lxp_common::config::resolve_config_path;
use lxp_rate::config::RateConfig;
use lxp_rate::{build_router, AppState};

/// Command-line arguments for lxp-rate
#[derive(Parser, Debug)]
#[command(name = "lxp-rate")]
#[command(about = "Listening experiment rating service")]
#[command(version)]
struct Args {
    /// Config file (falls back to LXP_CONFIG, then ~/.config/lxp/lxp-rate.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long, env = "LXP_PORT")]
    port: Option<u16>,

    /// Directory holding the per-condition stimulus folders (overrides config)
    #[arg(short, long, env = "LXP_STIMULUS_ROOT")]
    stimulus_root: Option<PathBuf>,

    /// Directory for result and profile tables (overrides config)
    #[arg(short, long, env = "LXP_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is loaded before logging so the configured level can apply
    let config_path = resolve_config_path(args.config.as_deref(), "LXP_CONFIG", "lxp-rate");
    let mut config =
        RateConfig::load(config_path.as_deref()).context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("lxp_rate={0},lxp_common={0},tower_http=info", config.logging.level)
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &config_path {
        Some(path) => info!("Configuration: {}", path.display()),
        None => info!("Configuration: built-in defaults"),
    }

    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(root) = args.stimulus_root {
        config.stimulus_root = root;
    }
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }

    info!("Starting lxp-rate on port {}", config.port);
    info!("Stimulus root: {}", config.stimulus_root.display());
    info!("Results file: {}", config.results_path().display());

    let port = config.port;
    let state = AppState::new(config).context("Failed to initialize service state")?;
    spawn_session_sweeper(state.clone());
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Periodically drop idle sessions
fn spawn_session_sweeper(state: AppState) {
    let timeout = state.config.session_idle_timeout_secs;
    if timeout == 0 {
        info!("Session idle timeout disabled");
        return;
    }

    // Check a few times per timeout window, at most once a minute
    let period = Duration::from_secs((timeout / 4).max(60));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            state.sweep_idle_sessions(state.clock.now()).await;
        }
    });
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}

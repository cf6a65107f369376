//! tilepath game server
//!
//! Listens for players, forms games from whoever is connected and runs them
//! turn by turn.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tp_core::config::{self, ServerConfig};
use tp_server::server::GameServer;
use tp_server::ServerState;

#[derive(Parser)]
#[command(name = "tilepath-server")]
#[command(about = "tilepath game server")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address (overrides config)
    #[arg(short, long)]
    bind: Option<String>,

    /// Seconds a player has to move before one is made for them (overrides config)
    #[arg(long)]
    turn_timeout: Option<u64>,

    /// Seconds between enough players joining and the game starting (overrides config)
    #[arg(long)]
    countdown: Option<u64>,

    /// Seed for tile draws and player sampling, for reproducible games
    #[arg(long)]
    seed: Option<u64>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| args.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("tilepath server starting...");

    // Load configuration
    let mut config: ServerConfig = if let Some(config_path) = &args.config {
        config::load_config(config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else {
        let default_path = config::default_config_path();
        if default_path.exists() {
            config::load_config(&default_path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {:?}: {}", default_path, e);
                ServerConfig::default()
            })
        } else {
            tracing::info!("Using default configuration");
            ServerConfig::default()
        }
    };

    // Command line overrides
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }
    if let Some(seconds) = args.turn_timeout {
        config.game.turn_timeout = Duration::from_secs(seconds);
    }
    if let Some(seconds) = args.countdown {
        config.game.countdown = Duration::from_secs(seconds);
    }
    config.validate().context("Invalid configuration")?;

    tracing::info!(
        "Games of up to {} players, {} tiles per hand, {:?} per turn",
        config.game.player_limit,
        config.game.hand_size,
        config.game.turn_timeout
    );

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    // Create cancellation token for graceful shutdown
    let cancel = CancellationToken::new();

    // Setup signal handlers
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::warn!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                tracing::info!("Received Ctrl+C, initiating shutdown...");
            }
            _ = terminate => {
                tracing::info!("Received SIGTERM, initiating shutdown...");
            }
        }

        cancel_clone.cancel();
    });

    let bind_addr = config.bind_address.clone();
    let state = ServerState::start(config, rng, cancel.clone());
    let server = GameServer::new(state, cancel);

    server.run(&bind_addr).await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

//! Cross-chain swap solver agent.
//!
//! Watches every configured EVM chain for unfulfilled swap requests and
//! settles the ones it can cover from its own inventory.
//!
//! # Usage
//!
//! ```bash
//! # Run with a config file
//! solver --config config.toml --private-key 0x...
//!
//! # Or via environment
//! SOLVER_PRIVATE_KEY=0x... solver --config config.toml
//!
//! # Dry run: log decisions, never send a transaction
//! solver --config config.toml --private-key 0x... --dry-run
//! ```

use std::collections::HashMap;
use std::str::FromStr;

use alloy::signers::local::PrivateKeySigner;
use clap::Parser;
use tracing::{error, info, warn};

mod config;
mod error;
mod executor;
mod network;
mod supervisor;

use config::Settings;
use error::{Result, SolverAppError};
use network::ChainClient;
use supervisor::Supervisor;

// ═══════════════════════════════════════════════════════════════════════════════
// CLI ARGUMENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Cross-chain swap solver agent.
#[derive(Parser, Debug)]
#[command(name = "solver")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file.
    #[arg(short, long, env = "SOLVER_CONFIG_PATH")]
    config: Option<String>,

    /// Private key used to sign destination-chain transactions (hex, with or
    /// without a `0x` prefix). Falls back to `SOLVER_PRIVATE_KEY`.
    #[arg(long, env = "SOLVER_PRIVATE_KEY")]
    private_key: Option<String>,

    /// Log everything the agent would do, but never send a transaction.
    #[arg(long)]
    dry_run: bool,

    /// Override `agent.log_level` from the config file.
    #[arg(long)]
    log_level: Option<String>,

    /// Override `agent.log_json` from the config file.
    #[arg(long)]
    json_logs: bool,
}

// ═══════════════════════════════════════════════════════════════════════════════
// MAIN ENTRY POINT
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!(error = %e, "solver exited with a fatal error");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let mut settings = load_settings(args.config.as_deref())?;

    if let Some(level) = &args.log_level {
        settings.agent.log_level = level.clone();
    }
    if args.json_logs {
        settings.agent.log_json = true;
    }

    init_logging(&settings.agent.log_level, settings.agent.log_json)
        .map_err(|e| SolverAppError::Internal(format!("failed to init logging: {e}")))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        evaluator = %settings.agent.evaluator,
        networks = settings.networks.len(),
        dry_run = args.dry_run,
        "starting solver"
    );

    let signer = resolve_signer(args.private_key.as_deref())?;
    info!(address = %signer.address(), "signer loaded");

    let mut chains = HashMap::with_capacity(settings.networks.len());
    for network in &settings.networks {
        let client = ChainClient::connect(network, signer.clone()).await?;
        info!(chain_id = network.chain_id, "connected chain client");
        chains.insert(network.chain_id, client);
    }

    let supervisor = Supervisor::new(&settings, chains, args.dry_run).await?;

    let result = supervisor.run(setup_shutdown_handler()).await;

    info!("solver stopped");
    result
}

fn load_settings(config_flag: Option<&str>) -> Result<Settings> {
    let path = Settings::resolve_path(config_flag)
        .ok_or_else(|| error::ConfigError::NotFound(vec!["config.toml".into()]))?;
    let settings = Settings::load(&path)?;
    settings.validate()?;
    Ok(settings)
}

fn resolve_signer(private_key: Option<&str>) -> Result<PrivateKeySigner> {
    let raw = private_key.ok_or(SolverAppError::NoSigner)?;
    PrivateKeySigner::from_str(raw.trim())
        .map_err(|e| SolverAppError::Internal(format!("invalid private key: {e}")))
}

// ═══════════════════════════════════════════════════════════════════════════════
// INITIALIZATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Initialize the tracing subscriber for logging.
fn init_logging(level: &str, json: bool) -> std::result::Result<(), anyhow::Error> {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to init logging: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to init logging: {e}"))?;
    }

    Ok(())
}

/// Resolve on SIGINT, SIGTERM, or SIGUSR2 - the latter so an operator can
/// trigger the same graceful drain as a deploy-time restart without killing
/// the process outright.
async fn setup_shutdown_handler() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => error!(error = %e, "failed to install SIGTERM handler"),
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    #[cfg(unix)]
    let user_defined = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::user_defined2()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => error!(error = %e, "failed to install SIGUSR2 handler"),
        }
    };
    #[cfg(not(unix))]
    let user_defined = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => warn!("received Ctrl+C, initiating graceful shutdown"),
        () = terminate => warn!("received SIGTERM, initiating graceful shutdown"),
        () = user_defined => warn!("received SIGUSR2, initiating graceful shutdown"),
    }
}

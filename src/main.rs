//! LND confirmation watcher.
//!
//! Picks a recent unconfirmed transaction from a public mempool service and
//! subscribes to its confirmations through an LND node's chain notifier.
//!
//! # Architecture Overview
//!
//! ```text
//!                ┌───────────────────────────────────────────────────────┐
//!                │                   CONFIRMATION WATCHER                 │
//!                │                                                        │
//!   CLI flags ───┼─▶ config ──▶ security ──▶ node ─── GetInfo ──────────┼──▶ LND
//!                │  (toml +     (macaroon,   client                      │
//!                │   base64)     trust)        │                         │
//!                │                             ▼                         │
//!                │                ┌────────────────────────┐  REST       │
//!                │                │         watch          │◀───────────┼─── mempool
//!                │                │ request → subscribe →  │            │    service
//!                │                │   drain updates        │◀───────────┼─── LND stream
//!                │                └────────────────────────┘            │
//!                │                                                        │
//!                │  lifecycle (root cancellation, SIGINT) · observability │
//!                └───────────────────────────────────────────────────────┘
//! ```

use std::error::Error as StdError;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use lnd_confwatch::config::loader::load_or_default;
use lnd_confwatch::config::validation::validate_config;
use lnd_confwatch::config::{ConfigError, WatchConfig};
use lnd_confwatch::lifecycle::startup::{self, NodeTarget};
use lnd_confwatch::lifecycle::{spawn_interrupt_listener, CancelCause, Shutdown};
use lnd_confwatch::observability::{init_logging, metrics};

#[derive(Parser)]
#[command(name = "lnd-confwatch")]
#[command(about = "Watch a mempool transaction confirm through an LND node", long_about = None)]
struct Cli {
    /// Node RPC address (host:port).
    #[arg(long, value_name = "HOST:PORT")]
    lnd: String,

    /// Base64-encoded binary macaroon.
    #[arg(long, value_name = "BASE64")]
    macaroon: String,

    /// Base64-encoded PEM certificate bundle. System trust roots if omitted.
    #[arg(long, value_name = "BASE64")]
    cert: Option<String>,

    /// Optional TOML configuration file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the mempool service base URL.
    #[arg(long, value_name = "URL")]
    mempool_url: Option<String>,

    /// Override the log level.
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn build_config(cli: &Cli) -> Result<WatchConfig, ConfigError> {
    let mut config = load_or_default(cli.config.as_deref())?;

    if let Some(url) = &cli.mempool_url {
        config.mempool.base_url = url.clone();
    }
    if let Some(level) = &cli.log_level {
        config.observability.log_level = level.clone();
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn error_chain(err: &dyn StdError) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

#[tokio::main]
async fn main() -> ExitCode {
    lnd_confwatch::net::install_crypto_provider();
    let cli = Cli::parse();

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", error_chain(&e));
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "lnd-confwatch starting");

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let target = match NodeTarget::from_flags(&cli.lnd, &cli.macaroon, cli.cert.as_deref()) {
        Ok(target) => target,
        Err(e) => {
            tracing::error!(error = %error_chain(&e), "Invalid credential flags");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = Shutdown::new();
    let listener = spawn_interrupt_listener(shutdown.clone());

    let result = startup::run(&target, &config, &shutdown).await;

    shutdown.trigger(CancelCause::Shutdown);
    let _ = listener.await;

    match result {
        Ok(outcome) => {
            tracing::info!(outcome = ?outcome, "exiting");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %error_chain(&e), "Watch failed");
            ExitCode::FAILURE
        }
    }
}

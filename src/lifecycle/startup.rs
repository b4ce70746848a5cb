//! Startup orchestration.
//!
//! # Responsibilities
//! - Decode CLI credential material
//! - Build the mempool client, connect to the node, run the watch
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Cancellation during connect is a clean stop, not an error

use thiserror::Error;

use crate::config::loader::{decode_base64_flag, decode_optional_base64_flag};
use crate::config::{ConfigError, WatchConfig};
use crate::lifecycle::shutdown::Shutdown;
use crate::mempool::{MempoolClient, MempoolError};
use crate::node::{NodeClient, NodeError};
use crate::watch::{ConfirmationWatcher, WatchError, WatchOutcome};

/// Any error that ends the process with a failure status.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Node(#[from] NodeError),

    #[error(transparent)]
    Mempool(#[from] MempoolError),

    #[error(transparent)]
    Watch(#[from] WatchError),
}

/// Where and how to reach the node.
#[derive(Clone)]
pub struct NodeTarget {
    pub address: String,
    pub macaroon: Vec<u8>,
    pub cert_pem: Option<Vec<u8>>,
}

impl NodeTarget {
    /// Decode the base64 `--macaroon` and optional `--cert` flags.
    pub fn from_flags(
        address: &str,
        macaroon_b64: &str,
        cert_b64: Option<&str>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            address: address.to_string(),
            macaroon: decode_base64_flag("macaroon", macaroon_b64)?,
            cert_pem: decode_optional_base64_flag("cert", cert_b64)?,
        })
    }
}

impl std::fmt::Debug for NodeTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeTarget")
            .field("address", &self.address)
            .field("cert_pem", &self.cert_pem.as_ref().map(Vec::len))
            .finish_non_exhaustive()
    }
}

/// Connect, watch, and return how the watch ended.
pub async fn run(
    target: &NodeTarget,
    config: &WatchConfig,
    shutdown: &Shutdown,
) -> Result<WatchOutcome, StartupError> {
    let mempool = MempoolClient::new(&config.mempool)?;

    let node = match NodeClient::connect(
        shutdown,
        &config.node,
        &target.address,
        &target.macaroon,
        target.cert_pem.as_deref(),
    )
    .await
    {
        Ok(node) => node,
        Err(NodeError::Cancelled(cause)) => return Ok(WatchOutcome::Cancelled(cause)),
        Err(e) => return Err(e.into()),
    };

    let mut watcher =
        ConfirmationWatcher::new(node, mempool, config.watch.clone(), shutdown.clone());
    let outcome = watcher.run(|_| {}).await?;

    tracing::info!(updates = watcher.updates(), state = %watcher.state(), "Watch finished");
    Ok(outcome)
}

//! Configuration schema definitions.
//!
//! This module defines the tunables of the watcher. All types derive Serde
//! traits for deserialization from an optional TOML file; every field has a
//! default so an empty file (or no file) is valid.

use serde::{Deserialize, Serialize};

/// Root configuration for the confirmation watcher.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct WatchConfig {
    /// Node connection settings.
    pub node: NodeConfig,

    /// Mempool data service settings.
    pub mempool: MempoolConfig,

    /// Confirmation request parameters.
    pub watch: ConfirmationConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Node connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Deadline for dial + liveness check, in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 5,
        }
    }
}

/// Mempool data service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MempoolConfig {
    /// API base URL (e.g., "https://mempool.space/api").
    pub base_url: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        Self {
            base_url: "https://mempool.space/api".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Parameters of the confirmation subscription.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfirmationConfig {
    /// Target confirmation depth.
    pub num_confs: u32,

    /// Blocks subtracted from the best height to form the height hint.
    pub height_hint_lookback: u32,

    /// Ask the node to include the confirming block in updates.
    pub include_block: bool,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            num_confs: 1,
            height_hint_lookback: 6,
            include_block: false,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9100".to_string(),
        }
    }
}

//! Mempool data service types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the mempool data service. None are retried.
#[derive(Debug, Error)]
pub enum MempoolError {
    #[error("invalid mempool API URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("mempool request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("mempool API returned status {status} for {url}")]
    Status { url: String, status: u16 },
}

/// Result type for mempool operations.
pub type MempoolResult<T> = Result<T, MempoolError>;

/// One entry of `GET /mempool/recent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MempoolEntry {
    pub txid: String,
    #[serde(default)]
    pub fee: Option<u64>,
    #[serde(default)]
    pub vsize: Option<u64>,
    #[serde(default)]
    pub value: Option<u64>,
}

/// A transaction output as reported by `GET /tx/{txid}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    /// Hex-encoded locking script.
    pub scriptpubkey: String,
    /// Absent for outputs without an address form (e.g., OP_RETURN).
    #[serde(default)]
    pub scriptpubkey_address: Option<String>,
}

/// An input; only the spent output is decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    #[serde(default)]
    pub prevout: Option<TxOutput>,
}

/// Body of `GET /tx/{txid}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MempoolTransaction {
    #[serde(default)]
    pub vin: Vec<TxInput>,
    pub vout: Vec<TxOutput>,
}

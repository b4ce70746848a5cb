//! Watch pipeline types and error definitions.

use std::fmt;

use thiserror::Error;

use crate::lifecycle::CancelCause;
use crate::mempool::MempoolError;
use crate::node::NodeError;

/// Errors that end the watch pipeline.
#[derive(Debug, Error)]
pub enum WatchError {
    /// Info query on the established connection failed.
    #[error(transparent)]
    Node(#[from] NodeError),

    /// Mempool data fetch failed.
    #[error(transparent)]
    Mempool(#[from] MempoolError),

    /// The data service reported no unconfirmed transactions.
    #[error("mempool data service returned no entries")]
    EmptyMempool,

    #[error("malformed txid '{txid}': {source}")]
    MalformedTxid {
        txid: String,
        #[source]
        source: hex::FromHexError,
    },

    /// The transaction detail carried no outputs to filter on.
    #[error("transaction {txid} has no outputs")]
    NoOutputs { txid: String },

    #[error("malformed output script '{script}': {source}")]
    MalformedScript {
        script: String,
        #[source]
        source: hex::FromHexError,
    },

    /// The node refused to open the subscription.
    #[error("confirmation subscription rejected: {0}")]
    SubscriptionRejected(tonic::Status),

    /// The subscription failed after it was opened.
    #[error("confirmation stream error: {0}")]
    StreamError(tonic::Status),
}

/// Result type for watch operations.
pub type WatchResult<T> = Result<T, WatchError>;

/// States of the watch pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    FetchingInfo,
    FetchingMempoolData,
    Subscribing,
    Streaming,
    Completed,
    Failed,
    Cancelled,
}

impl WatchState {
    /// Numeric form used for the state gauge.
    pub fn as_index(&self) -> u8 {
        match self {
            WatchState::Idle => 0,
            WatchState::FetchingInfo => 1,
            WatchState::FetchingMempoolData => 2,
            WatchState::Subscribing => 3,
            WatchState::Streaming => 4,
            WatchState::Completed => 5,
            WatchState::Failed => 6,
            WatchState::Cancelled => 7,
        }
    }
}

impl fmt::Display for WatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WatchState::Idle => "idle",
            WatchState::FetchingInfo => "fetching_info",
            WatchState::FetchingMempoolData => "fetching_mempool_data",
            WatchState::Subscribing => "subscribing",
            WatchState::Streaming => "streaming",
            WatchState::Completed => "completed",
            WatchState::Failed => "failed",
            WatchState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// How a watch ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    /// The node closed the stream.
    Completed,
    /// The root context was cancelled.
    Cancelled(CancelCause),
}

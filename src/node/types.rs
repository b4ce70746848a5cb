//! Node-specific types and error definitions.

use thiserror::Error;

use crate::lifecycle::CancelCause;
use crate::node::proto::GetInfoResponse;
use crate::security::credentials::CredentialError;

/// Errors that can occur while connecting to or querying the node.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Token or certificate could not be built. No I/O was attempted.
    #[error(transparent)]
    Credentials(#[from] CredentialError),

    /// The target address is not a usable gRPC endpoint.
    #[error("invalid node address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    /// Transport, TLS or DNS failure while dialing. Not retried.
    #[error("could not dial node at {target}: {source}")]
    DialFailure {
        target: String,
        #[source]
        source: tonic::transport::Error,
    },

    /// The connect deadline elapsed before the node answered.
    #[error("timed out connecting to node after {0} seconds")]
    ConnectTimeout(u64),

    /// The transport is up but the info query failed (auth, RPC unavailable).
    #[error("node getinfo failed: {0}")]
    NodeUnreachable(tonic::Status),

    /// The root context was cancelled while connecting.
    #[error("connection cancelled: {0}")]
    Cancelled(CancelCause),
}

/// Result type for node operations.
pub type NodeResult<T> = Result<T, NodeError>;

/// Snapshot of the node's chain state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    pub alias: String,
    pub identity_pubkey: String,
    pub version: String,
    pub block_height: u32,
    pub block_hash: String,
    pub synced_to_chain: bool,
    pub chain: String,
    pub network: String,
}

impl From<GetInfoResponse> for NodeInfo {
    fn from(res: GetInfoResponse) -> Self {
        let (chain, network) = res
            .chains
            .into_iter()
            .next()
            .map(|c| (c.chain, c.network))
            .unwrap_or_else(|| ("unknown".to_string(), "unknown".to_string()));

        Self {
            alias: res.alias,
            identity_pubkey: res.identity_pubkey,
            version: res.version,
            block_height: res.block_height,
            block_hash: res.block_hash,
            synced_to_chain: res.synced_to_chain,
            chain,
            network,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::proto::Chain;

    #[test]
    fn test_info_from_response() {
        let res = GetInfoResponse {
            alias: "alice".into(),
            version: "0.18.0-beta".into(),
            block_height: 800_000,
            chains: vec![Chain {
                chain: "bitcoin".into(),
                network: "mainnet".into(),
            }],
            ..Default::default()
        };
        let info = NodeInfo::from(res);
        assert_eq!(info.network, "mainnet");
        assert_eq!(info.block_height, 800_000);
    }

    #[test]
    fn test_info_without_chains() {
        let info = NodeInfo::from(GetInfoResponse::default());
        assert_eq!(info.chain, "unknown");
        assert_eq!(info.network, "unknown");
    }

    #[test]
    fn test_error_display() {
        let err = NodeError::ConnectTimeout(5);
        assert_eq!(err.to_string(), "timed out connecting to node after 5 seconds");

        let err = NodeError::NodeUnreachable(tonic::Status::unauthenticated("bad macaroon"));
        assert!(err.to_string().starts_with("node getinfo failed"));
    }
}

//! Collaborators the watch pipeline depends on.

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::mempool::{MempoolEntry, MempoolResult, TxOutput};
use crate::node::proto::{ConfEvent, ConfRequest};
use crate::node::{NodeInfo, NodeResult};

/// Stream of confirmation updates, in the order the node sends them.
pub type UpdateStream = BoxStream<'static, Result<ConfEvent, tonic::Status>>;

/// The node side: chain state and the confirmation subscription.
#[async_trait]
pub trait ChainBackend: Send + Sync {
    async fn get_info(&self) -> NodeResult<NodeInfo>;

    async fn register_confirmations(
        &self,
        request: ConfRequest,
    ) -> Result<UpdateStream, tonic::Status>;
}

/// The mempool data service.
#[async_trait]
pub trait MempoolSource: Send + Sync {
    async fn recent_entries(&self) -> MempoolResult<Vec<MempoolEntry>>;

    async fn transaction_outputs(&self, txid: &str) -> MempoolResult<Vec<TxOutput>>;
}

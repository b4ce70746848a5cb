//! Confirmation watch loop.
//!
//! ```text
//! Idle → FetchingInfo → FetchingMempoolData → Subscribing → Streaming
//!                                                   ↘ Completed | Failed | Cancelled
//! ```
//!
//! The loop never compares the reported depth against the target; the node
//! decides when the subscription ends.

use futures_util::{Stream, StreamExt};

use crate::config::ConfirmationConfig;
use crate::lifecycle::{CancelCause, Shutdown};
use crate::node::proto::{conf_event, ConfEvent, ConfRequest};
use crate::observability::metrics;
use crate::watch::backend::{ChainBackend, MempoolSource};
use crate::watch::request::{build_conf_request, decode_txid, select_entry, select_script};
use crate::watch::types::{WatchError, WatchOutcome, WatchResult, WatchState};

/// Drives one confirmation watch from node query to stream end.
pub struct ConfirmationWatcher<N, M> {
    node: N,
    mempool: M,
    config: ConfirmationConfig,
    shutdown: Shutdown,
    state: WatchState,
    updates: u64,
}

impl<N: ChainBackend, M: MempoolSource> ConfirmationWatcher<N, M> {
    pub fn new(node: N, mempool: M, config: ConfirmationConfig, shutdown: Shutdown) -> Self {
        Self {
            node,
            mempool,
            config,
            shutdown,
            state: WatchState::Idle,
            updates: 0,
        }
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    /// Number of updates reported so far.
    pub fn updates(&self) -> u64 {
        self.updates
    }

    fn transition(&mut self, next: WatchState) {
        tracing::debug!(from = %self.state, to = %next, "Watch state transition");
        self.state = next;
        metrics::record_state(next);
    }

    fn cancel_cause(&self) -> CancelCause {
        self.shutdown.cause().unwrap_or(CancelCause::Shutdown)
    }

    /// Query the node and the mempool service and build the request.
    ///
    /// Returns `Ok(None)` if cancelled part way.
    pub async fn prepare(&mut self) -> WatchResult<Option<ConfRequest>> {
        self.transition(WatchState::FetchingInfo);
        let Some(info) = self.shutdown.run_until_cancelled(self.node.get_info()).await else {
            return Ok(None);
        };
        let info = info?;
        tracing::info!(height = info.block_height, "Best block height");
        metrics::record_best_height(info.block_height);

        self.transition(WatchState::FetchingMempoolData);
        let Some(entries) = self
            .shutdown
            .run_until_cancelled(self.mempool.recent_entries())
            .await
        else {
            return Ok(None);
        };
        let entries = entries?;
        let entry = select_entry(&entries)?;
        let txid = decode_txid(&entry.txid)?;

        let Some(outputs) = self
            .shutdown
            .run_until_cancelled(self.mempool.transaction_outputs(&entry.txid))
            .await
        else {
            return Ok(None);
        };
        let outputs = outputs?;
        let script = select_script(&entry.txid, &outputs)?;

        Ok(Some(build_conf_request(
            txid,
            script,
            info.block_height,
            &self.config,
        )))
    }

    /// Run the whole pipeline, reporting each update to `on_update` in order.
    pub async fn run<F>(&mut self, on_update: F) -> WatchResult<WatchOutcome>
    where
        F: FnMut(&ConfEvent) + Send,
    {
        let result = self.run_inner(on_update).await;
        match &result {
            Ok(WatchOutcome::Completed) => self.transition(WatchState::Completed),
            Ok(WatchOutcome::Cancelled(cause)) => {
                tracing::info!(cause = %cause, "Watch cancelled");
                self.transition(WatchState::Cancelled);
            }
            Err(_) => self.transition(WatchState::Failed),
        }
        result
    }

    async fn run_inner<F>(&mut self, mut on_update: F) -> WatchResult<WatchOutcome>
    where
        F: FnMut(&ConfEvent) + Send,
    {
        let Some(request) = self.prepare().await? else {
            return Ok(WatchOutcome::Cancelled(self.cancel_cause()));
        };

        self.transition(WatchState::Subscribing);
        tracing::info!(
            txid = %hex::encode(&request.txid),
            script = %hex::encode(&request.script),
            height_hint = request.height_hint,
            num_confs = request.num_confs,
            "Subscribing to confirmations"
        );

        let Some(opened) = self
            .shutdown
            .run_until_cancelled(self.node.register_confirmations(request))
            .await
        else {
            return Ok(WatchOutcome::Cancelled(self.cancel_cause()));
        };
        let stream = opened.map_err(WatchError::SubscriptionRejected)?;

        self.transition(WatchState::Streaming);
        let updates = &mut self.updates;
        drain_updates(stream, &self.shutdown, |event| {
            *updates += 1;
            on_update(event);
        })
        .await
    }
}

/// Pump updates from `stream` until it ends, fails, or `shutdown` fires.
///
/// Cancellation is checked before every receive and also interrupts a
/// receive that is blocked. An update fully received before the check is
/// still reported.
pub async fn drain_updates<S, F>(
    mut stream: S,
    shutdown: &Shutdown,
    mut on_update: F,
) -> WatchResult<WatchOutcome>
where
    S: Stream<Item = Result<ConfEvent, tonic::Status>> + Unpin,
    F: FnMut(&ConfEvent),
{
    loop {
        if let Some(cause) = shutdown.cause() {
            // Dropping the stream resets the RPC; nothing to report on failure.
            drop(stream);
            tracing::debug!("Closed confirmation subscription");
            return Ok(WatchOutcome::Cancelled(cause));
        }

        let Some(next) = shutdown.run_until_cancelled(stream.next()).await else {
            continue;
        };

        match next {
            None => {
                tracing::info!("Confirmation stream ended");
                return Ok(WatchOutcome::Completed);
            }
            Some(Ok(event)) => {
                on_update(&event);
                log_update(&event);
            }
            Some(Err(status)) => {
                if shutdown.is_triggered() {
                    continue;
                }
                metrics::record_stream_error();
                return Err(WatchError::StreamError(status));
            }
        }
    }
}

/// Short label for an update.
pub fn update_kind(event: &ConfEvent) -> &'static str {
    match event.event {
        Some(conf_event::Event::Conf(_)) => "conf",
        Some(conf_event::Event::Reorg(_)) => "reorg",
        None => "empty",
    }
}

fn log_update(event: &ConfEvent) {
    let kind = update_kind(event);
    metrics::record_update(kind);

    match &event.event {
        Some(conf_event::Event::Conf(details)) => {
            // Block hashes are displayed in reverse byte order.
            let mut block_hash = details.block_hash.clone();
            block_hash.reverse();
            tracing::info!(
                kind,
                block_height = details.block_height,
                block_hash = %hex::encode(block_hash),
                tx_index = details.tx_index,
                raw_tx_len = details.raw_tx.len(),
                "Got update"
            );
        }
        Some(conf_event::Event::Reorg(_)) => {
            tracing::warn!(kind, "Got update: transaction reorged out of the chain");
        }
        None => tracing::info!(kind, "Got update"),
    }
}

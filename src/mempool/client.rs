//! HTTP client for the mempool data service.
//!
//! Single unauthenticated GETs decoded from JSON. No retry, no pagination.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::MempoolConfig;
use crate::mempool::types::{
    MempoolEntry, MempoolError, MempoolResult, MempoolTransaction, TxOutput,
};
use crate::watch::backend::MempoolSource;

/// Client for an esplora-style mempool API.
#[derive(Debug, Clone)]
pub struct MempoolClient {
    client: reqwest::Client,
    base_url: Url,
}

impl MempoolClient {
    /// Create a client for the configured base URL.
    pub fn new(config: &MempoolConfig) -> MempoolResult<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| MempoolError::InvalidUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(MempoolError::InvalidUrl {
                url: config.base_url.clone(),
                reason: "not a base URL".to_string(),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("lnd-confwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, base_url })
    }

    /// Build `{base}/{segments...}`, escaping each segment.
    pub fn endpoint(&self, segments: &[&str]) -> MempoolResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| MempoolError::InvalidUrl {
                url: self.base_url.to_string(),
                reason: "not a base URL".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> MempoolResult<T> {
        tracing::debug!(url = %url, "Fetching from mempool API");

        let res = self.client.get(url.clone()).send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(MempoolError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(res.json().await?)
    }

    /// `GET /mempool/recent`: most recent unconfirmed transactions.
    pub async fn fetch_recent_entries(&self) -> MempoolResult<Vec<MempoolEntry>> {
        let url = self.endpoint(&["mempool", "recent"])?;
        let entries: Vec<MempoolEntry> = self.get_json(url).await?;
        tracing::debug!(count = entries.len(), "Fetched recent mempool entries");
        Ok(entries)
    }

    /// `GET /tx/{txid}`: full transaction detail.
    pub async fn fetch_transaction(&self, txid: &str) -> MempoolResult<MempoolTransaction> {
        let url = self.endpoint(&["tx", txid])?;
        self.get_json(url).await
    }

    /// Outputs of `txid`, in order.
    pub async fn fetch_transaction_outputs(&self, txid: &str) -> MempoolResult<Vec<TxOutput>> {
        Ok(self.fetch_transaction(txid).await?.vout)
    }
}

#[async_trait]
impl MempoolSource for MempoolClient {
    async fn recent_entries(&self) -> MempoolResult<Vec<MempoolEntry>> {
        self.fetch_recent_entries().await
    }

    async fn transaction_outputs(&self, txid: &str) -> MempoolResult<Vec<TxOutput>> {
        self.fetch_transaction_outputs(txid).await
    }
}

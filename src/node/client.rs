//! Authenticated connection to the node.
//!
//! # Responsibilities
//! - Build credentials and the TLS endpoint (no I/O on credential errors)
//! - Dial under a deadline derived from the root context, failing fast
//! - Verify liveness with an info query before handing out the connection
//! - Issue the confirmation subscription over the same channel

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use tonic::codegen::http::Uri;
use tonic::service::interceptor::InterceptedService;
use tonic::transport::{Channel, Endpoint};
use tower::service_fn;

use crate::config::NodeConfig;
use crate::lifecycle::{CancelCause, Shutdown};
use crate::net::tls::{
    dial_tls, install_crypto_provider, pinned_connector, system_tls_config, TransportCredentials,
};
use crate::node::auth::MacaroonInterceptor;
use crate::node::proto::{
    AuthedChannel, ChainNotifierClient, ConfRequest, GetInfoRequest, LightningClient,
};
use crate::node::types::{NodeError, NodeInfo, NodeResult};
use crate::security::credentials::{CredentialError, Credentials};
use crate::watch::backend::{ChainBackend, UpdateStream};

/// A live, authenticated channel to the node.
///
/// Cloning shares the underlying transport.
#[derive(Clone)]
pub struct NodeClient {
    channel: AuthedChannel,
    target: String,
}

/// How the channel reaches the node.
enum Transport {
    Plaintext,
    SystemTrust,
    /// TLS runs inside the connector; tonic sees a plain `http://` endpoint.
    Pinned(TlsConnector),
}

impl NodeClient {
    /// Connect to the node and verify it answers an info query.
    ///
    /// # Arguments
    /// * `shutdown` - Root context; cancellation aborts the attempt
    /// * `config` - Connect deadline
    /// * `target` - `host:port` (an explicit `https://` or `http://` is kept)
    /// * `token` - Raw macaroon bytes
    /// * `cert_pem` - PEM bundle, or `None` for system trust
    pub async fn connect(
        shutdown: &Shutdown,
        config: &NodeConfig,
        target: &str,
        token: &[u8],
        cert_pem: Option<&[u8]>,
    ) -> NodeResult<Self> {
        let credentials = Credentials::build(token, cert_pem)?;
        tracing::info!(
            address = %target,
            pinned_certs = credentials.transport.pinned_count(),
            "Dialing node"
        );

        install_crypto_provider();
        let (endpoint, transport) = build_endpoint(target, &credentials, config)?;
        let interceptor = MacaroonInterceptor::new(&credentials.token)
            .map_err(|e| NodeError::Credentials(CredentialError::TokenMetadata(e.to_string())))?;

        let deadline = Duration::from_secs(config.connect_timeout_secs);
        let attempt = async {
            let channel = dial(&endpoint, &transport)
                .await
                .map_err(|source| NodeError::DialFailure {
                    target: target.to_string(),
                    source,
                })?;
            let channel = InterceptedService::new(channel, interceptor);
            let info = query_info(&channel).await?;
            Ok::<_, NodeError>((channel, info))
        };

        let (channel, info) = match shutdown.run_until_cancelled(timeout(deadline, attempt)).await {
            None => {
                return Err(NodeError::Cancelled(
                    shutdown.cause().unwrap_or(CancelCause::Shutdown),
                ))
            }
            Some(Err(_elapsed)) => return Err(NodeError::ConnectTimeout(config.connect_timeout_secs)),
            Some(Ok(result)) => result?,
        };

        tracing::info!(
            address = %target,
            alias = %info.alias,
            pubkey = %info.identity_pubkey,
            chain = %info.chain,
            network = %info.network,
            version = %info.version,
            height = info.block_height,
            block_hash = %info.block_hash,
            synced = info.synced_to_chain,
            "Connected to node"
        );
        if !info.synced_to_chain {
            tracing::warn!(address = %target, "Node is not synced to chain");
        }

        Ok(Self {
            channel,
            target: target.to_string(),
        })
    }

    /// Fetch a fresh info snapshot.
    pub async fn get_info(&self) -> NodeResult<NodeInfo> {
        query_info(&self.channel).await
    }
}

impl std::fmt::Debug for NodeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeClient")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ChainBackend for NodeClient {
    async fn get_info(&self) -> NodeResult<NodeInfo> {
        NodeClient::get_info(self).await
    }

    async fn register_confirmations(
        &self,
        request: ConfRequest,
    ) -> Result<UpdateStream, tonic::Status> {
        let mut notifier = ChainNotifierClient::new(self.channel.clone());
        let stream = notifier
            .register_confirmations_ntfn(request)
            .await?
            .into_inner();
        Ok(stream.boxed())
    }
}

async fn query_info(channel: &AuthedChannel) -> NodeResult<NodeInfo> {
    let mut lightning = LightningClient::new(channel.clone());
    let res = lightning
        .get_info(GetInfoRequest {})
        .await
        .map_err(NodeError::NodeUnreachable)?
        .into_inner();
    Ok(NodeInfo::from(res))
}

/// Normalise `target` into an endpoint URI.
pub fn endpoint_uri(target: &str) -> NodeResult<String> {
    let invalid = |reason: &str| NodeError::InvalidAddress {
        address: target.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = target.trim();
    if trimmed.is_empty() {
        return Err(invalid("address is empty"));
    }

    let uri = if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let parsed = url::Url::parse(&uri).map_err(|e| invalid(&e.to_string()))?;
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host"));
    }
    if parsed.port_or_known_default().is_none() {
        return Err(invalid("missing port"));
    }
    Ok(uri)
}

fn build_endpoint(
    target: &str,
    credentials: &Credentials,
    config: &NodeConfig,
) -> NodeResult<(Endpoint, Transport)> {
    let uri = endpoint_uri(target)?;

    let (uri, transport) = if uri.starts_with("http://") {
        tracing::warn!(address = %target, "Connecting without TLS");
        (uri, Transport::Plaintext)
    } else {
        match &credentials.transport {
            TransportCredentials::SystemTrust => (uri, Transport::SystemTrust),
            TransportCredentials::Pinned(certs) => {
                let connector = pinned_connector(certs)?;
                (uri.replacen("https://", "http://", 1), Transport::Pinned(connector))
            }
        }
    };

    let endpoint = Endpoint::from_shared(uri)
        .map_err(|e| NodeError::InvalidAddress {
            address: target.to_string(),
            reason: e.to_string(),
        })?
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs));

    match transport {
        Transport::SystemTrust => {
            let endpoint = endpoint.tls_config(system_tls_config()).map_err(|e| {
                NodeError::Credentials(CredentialError::InvalidCertificate(e.to_string()))
            })?;
            Ok((endpoint, transport))
        }
        Transport::Plaintext | Transport::Pinned(_) => Ok((endpoint, transport)),
    }
}

async fn dial(endpoint: &Endpoint, transport: &Transport) -> Result<Channel, tonic::transport::Error> {
    match transport {
        Transport::Pinned(connector) => {
            let connector = connector.clone();
            endpoint
                .connect_with_connector(service_fn(move |uri: Uri| {
                    dial_tls(connector.clone(), uri)
                }))
                .await
        }
        Transport::Plaintext | Transport::SystemTrust => endpoint.connect().await,
    }
}

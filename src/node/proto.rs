//! Wire types and gRPC clients for the subset of the node API we consume.
//!
//! Field numbers follow `lnrpc/lightning.proto` and
//! `chainrpc/chainnotifier.proto`. Fields we never read are omitted; prost
//! skips unknown fields when decoding.

use tonic::codec::{ProstCodec, Streaming};
use tonic::codegen::http::uri::PathAndQuery;
use tonic::service::interceptor::InterceptedService;
use tonic::transport::Channel;

use crate::node::auth::MacaroonInterceptor;

/// Channel with the access token attached to every call.
pub type AuthedChannel = InterceptedService<Channel, MacaroonInterceptor>;

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetInfoRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Chain {
    #[prost(string, tag = "1")]
    pub chain: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub network: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetInfoResponse {
    #[prost(string, tag = "1")]
    pub identity_pubkey: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub alias: ::prost::alloc::string::String,
    #[prost(uint32, tag = "6")]
    pub block_height: u32,
    #[prost(string, tag = "8")]
    pub block_hash: ::prost::alloc::string::String,
    #[prost(bool, tag = "9")]
    pub synced_to_chain: bool,
    #[prost(string, tag = "14")]
    pub version: ::prost::alloc::string::String,
    #[prost(message, repeated, tag = "16")]
    pub chains: ::prost::alloc::vec::Vec<Chain>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ConfRequest {
    /// Raw txid bytes, in the byte order of the mempool service's hex form.
    #[prost(bytes = "vec", tag = "1")]
    pub txid: ::prost::alloc::vec::Vec<u8>,
    /// Output script used as the confirmation filter.
    #[prost(bytes = "vec", tag = "2")]
    pub script: ::prost::alloc::vec::Vec<u8>,
    #[prost(uint32, tag = "3")]
    pub num_confs: u32,
    #[prost(uint32, tag = "4")]
    pub height_hint: u32,
    #[prost(bool, tag = "5")]
    pub include_block: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ConfDetails {
    #[prost(bytes = "vec", tag = "1")]
    pub raw_tx: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub block_hash: ::prost::alloc::vec::Vec<u8>,
    #[prost(uint32, tag = "3")]
    pub block_height: u32,
    #[prost(uint32, tag = "4")]
    pub tx_index: u32,
    #[prost(bytes = "vec", tag = "5")]
    pub raw_block: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Reorg {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ConfEvent {
    #[prost(oneof = "conf_event::Event", tags = "1, 2")]
    pub event: ::core::option::Option<conf_event::Event>,
}

pub mod conf_event {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Event {
        #[prost(message, tag = "1")]
        Conf(super::ConfDetails),
        #[prost(message, tag = "2")]
        Reorg(super::Reorg),
    }
}

fn not_ready(e: impl std::fmt::Display) -> tonic::Status {
    tonic::Status::unknown(format!("Service was not ready: {}", e))
}

/// Client for `lnrpc.Lightning`.
#[derive(Clone)]
pub struct LightningClient {
    inner: tonic::client::Grpc<AuthedChannel>,
}

impl LightningClient {
    pub fn new(channel: AuthedChannel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }

    pub async fn get_info(
        &mut self,
        request: impl tonic::IntoRequest<GetInfoRequest>,
    ) -> Result<tonic::Response<GetInfoResponse>, tonic::Status> {
        self.inner.ready().await.map_err(not_ready)?;
        let codec: ProstCodec<GetInfoRequest, GetInfoResponse> = ProstCodec::default();
        let path = PathAndQuery::from_static("/lnrpc.Lightning/GetInfo");
        self.inner.unary(request.into_request(), path, codec).await
    }
}

/// Client for `chainrpc.ChainNotifier`.
#[derive(Clone)]
pub struct ChainNotifierClient {
    inner: tonic::client::Grpc<AuthedChannel>,
}

impl ChainNotifierClient {
    pub fn new(channel: AuthedChannel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }

    pub async fn register_confirmations_ntfn(
        &mut self,
        request: impl tonic::IntoRequest<ConfRequest>,
    ) -> Result<tonic::Response<Streaming<ConfEvent>>, tonic::Status> {
        self.inner.ready().await.map_err(not_ready)?;
        let codec: ProstCodec<ConfRequest, ConfEvent> = ProstCodec::default();
        let path = PathAndQuery::from_static("/chainrpc.ChainNotifier/RegisterConfirmationsNtfn");
        self.inner
            .server_streaming(request.into_request(), path, codec)
            .await
    }
}

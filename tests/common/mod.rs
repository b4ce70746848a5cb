//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use std::convert::Infallible;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::body::BoxBody;
use tonic::codec::ProstCodec;
use tonic::codegen::{http, BoxFuture, Context, Poll, Service};
use tonic::server::{Grpc, NamedService, UnaryService};
use tonic::transport::{Identity, Server, ServerTlsConfig};

use lnd_confwatch::net::install_crypto_provider;
use lnd_confwatch::node::proto::{Chain, ConfEvent, ConfRequest, GetInfoRequest, GetInfoResponse};
use lnd_confwatch::node::{NodeInfo, NodeResult};
use lnd_confwatch::watch::{ChainBackend, UpdateStream};

/// Start a mock mempool service answering fixed `(status, body)` pairs by path.
///
/// Unknown paths get a 404. Returns the bound address.
pub async fn start_mock_mempool(routes: Vec<(&str, u16, String)>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let routes: Arc<HashMap<String, (u16, String)>> = Arc::new(
        routes
            .into_iter()
            .map(|(path, status, body)| (path.to_string(), (status, body)))
            .collect(),
    );

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let routes = routes.clone();
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }

                let request = String::from_utf8_lossy(&buf);
                let path = request
                    .lines()
                    .next()
                    .and_then(|line| line.split_whitespace().nth(1))
                    .unwrap_or("/")
                    .to_string();

                let (status, body) = routes
                    .get(&path)
                    .cloned()
                    .unwrap_or((404, "not found".to_string()));
                let status_text = match status {
                    200 => "200 OK",
                    404 => "404 Not Found",
                    429 => "429 Too Many Requests",
                    500 => "500 Internal Server Error",
                    503 => "503 Service Unavailable",
                    _ => "200 OK",
                };

                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_text,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Scripted updates handed out by [`MockNode`].
pub enum Script {
    /// Yield these items, then end the stream.
    Items(Vec<Result<ConfEvent, tonic::Status>>),
    /// Never yield anything.
    Pending,
    /// Reject the subscription.
    Reject(tonic::Status),
}

/// In-memory chain backend that records the request it receives.
pub struct MockNode {
    pub height: u32,
    pub script: Mutex<Option<Script>>,
    pub requests: Arc<Mutex<Vec<ConfRequest>>>,
}

impl MockNode {
    pub fn new(height: u32, script: Script) -> Self {
        Self {
            height,
            script: Mutex::new(Some(script)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl ChainBackend for MockNode {
    async fn get_info(&self) -> NodeResult<NodeInfo> {
        Ok(NodeInfo {
            alias: "mock".to_string(),
            identity_pubkey: String::new(),
            version: "0.18.0-beta".to_string(),
            block_height: self.height,
            block_hash: String::new(),
            synced_to_chain: true,
            chain: "bitcoin".to_string(),
            network: "mainnet".to_string(),
        })
    }

    async fn register_confirmations(
        &self,
        request: ConfRequest,
    ) -> Result<UpdateStream, tonic::Status> {
        self.requests.lock().unwrap().push(request);
        let script = self.script.lock().unwrap().take();
        match script {
            Some(Script::Items(items)) => Ok(futures_util::stream::iter(items).boxed()),
            Some(Script::Pending) | None => Ok(futures_util::stream::pending().boxed()),
            Some(Script::Reject(status)) => Err(status),
        }
    }
}

/// gRPC `lnrpc.Lightning` stand-in that answers GetInfo with a fixed reply.
#[derive(Clone)]
pub struct MockLightning {
    pub reply: Result<GetInfoResponse, tonic::Status>,
    /// `macaroon` metadata of every GetInfo call, in arrival order.
    pub seen_macaroons: Arc<Mutex<Vec<String>>>,
}

impl MockLightning {
    pub fn answering(height: u32) -> Self {
        Self::with_reply(Ok(GetInfoResponse {
            alias: "mock-node".to_string(),
            block_height: height,
            synced_to_chain: true,
            version: "0.18.0-beta".to_string(),
            chains: vec![Chain {
                chain: "bitcoin".to_string(),
                network: "regtest".to_string(),
            }],
            ..Default::default()
        }))
    }

    pub fn rejecting(status: tonic::Status) -> Self {
        Self::with_reply(Err(status))
    }

    fn with_reply(reply: Result<GetInfoResponse, tonic::Status>) -> Self {
        Self {
            reply,
            seen_macaroons: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl NamedService for MockLightning {
    const NAME: &'static str = "lnrpc.Lightning";
}

struct GetInfoHandler(MockLightning);

impl UnaryService<GetInfoRequest> for GetInfoHandler {
    type Response = GetInfoResponse;
    type Future = BoxFuture<tonic::Response<GetInfoResponse>, tonic::Status>;

    fn call(&mut self, request: tonic::Request<GetInfoRequest>) -> Self::Future {
        let macaroon = request
            .metadata()
            .get("macaroon")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        self.0.seen_macaroons.lock().unwrap().push(macaroon);
        let reply = self.0.reply.clone();
        Box::pin(async move { reply.map(tonic::Response::new) })
    }
}

impl Service<http::Request<BoxBody>> for MockLightning {
    type Response = http::Response<BoxBody>;
    type Error = Infallible;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<BoxBody>) -> Self::Future {
        let handler = GetInfoHandler(self.clone());
        match req.uri().path() {
            "/lnrpc.Lightning/GetInfo" => Box::pin(async move {
                let mut grpc = Grpc::new(ProstCodec::<GetInfoResponse, GetInfoRequest>::default());
                Ok(grpc.unary(handler, req).await)
            }),
            _ => Box::pin(async move { Ok(tonic::Status::unimplemented("no such method").into_http()) }),
        }
    }
}

/// Serve `svc` on a loopback port, over TLS when a `(cert, key)` PEM pair is given.
pub async fn start_mock_node(svc: MockLightning, tls: Option<(&[u8], &[u8])>) -> SocketAddr {
    install_crypto_provider();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut server = Server::builder();
    if let Some((cert, key)) = tls {
        server = server
            .tls_config(ServerTlsConfig::new().identity(Identity::from_pem(cert, key)))
            .unwrap();
    }
    let router = server.add_service(svc);
    tokio::spawn(async move {
        let _ = router
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await;
    });

    addr
}

/// Accept TCP connections and hold them open without ever answering.
pub async fn start_silent_listener() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    addr
}

mod common;

use std::time::{Duration, Instant};

use common::MockLightning;
use lnd_confwatch::config::NodeConfig;
use lnd_confwatch::lifecycle::Shutdown;
use lnd_confwatch::node::{NodeClient, NodeError};
use lnd_confwatch::security::macaroon::{Macaroon, SIGNATURE_LEN};

const NODE_CERT: &[u8] = include_bytes!("fixtures/tls.cert");
const NODE_KEY: &[u8] = include_bytes!("fixtures/tls.key");
const OTHER_CERT: &[u8] = include_bytes!("fixtures/other.cert");

fn token() -> Macaroon {
    Macaroon::from_parts(None, b"watcher".to_vec(), Vec::new(), [7; SIGNATURE_LEN])
}

fn config(timeout_secs: u64) -> NodeConfig {
    NodeConfig {
        connect_timeout_secs: timeout_secs,
    }
}

#[tokio::test]
async fn test_connects_to_self_signed_ca_cert_over_tls() {
    let node = MockLightning::answering(812_345);
    let seen = node.seen_macaroons.clone();
    let addr = common::start_mock_node(node, Some((NODE_CERT, NODE_KEY))).await;

    let client = NodeClient::connect(
        &Shutdown::new(),
        &config(5),
        &format!("127.0.0.1:{}", addr.port()),
        &token().to_binary(),
        Some(NODE_CERT),
    )
    .await
    .unwrap();

    let info = client.get_info().await.unwrap();
    assert_eq!(info.block_height, 812_345);
    assert_eq!(info.alias, "mock-node");
    assert_eq!(info.network, "regtest");

    // Once while connecting, once for the explicit query.
    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen, vec![token().to_hex(), token().to_hex()]);
}

#[tokio::test]
async fn test_localhost_name_resolves_for_pinned_cert() {
    let addr = common::start_mock_node(MockLightning::answering(1), Some((NODE_CERT, NODE_KEY))).await;

    let result = NodeClient::connect(
        &Shutdown::new(),
        &config(5),
        &format!("localhost:{}", addr.port()),
        &token().to_binary(),
        Some(NODE_CERT),
    )
    .await;
    assert!(result.is_ok(), "{:?}", result.err());
}

#[tokio::test]
async fn test_mismatched_pin_fails_dial() {
    let addr = common::start_mock_node(MockLightning::answering(1), Some((NODE_CERT, NODE_KEY))).await;

    let err = NodeClient::connect(
        &Shutdown::new(),
        &config(5),
        &format!("127.0.0.1:{}", addr.port()),
        &token().to_binary(),
        Some(OTHER_CERT),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, NodeError::DialFailure { .. }), "{:?}", err);
}

#[tokio::test]
async fn test_rejected_info_query_over_tls() {
    let node = MockLightning::rejecting(tonic::Status::unauthenticated("verification failed"));
    let addr = common::start_mock_node(node, Some((NODE_CERT, NODE_KEY))).await;

    let err = NodeClient::connect(
        &Shutdown::new(),
        &config(5),
        &format!("127.0.0.1:{}", addr.port()),
        &token().to_binary(),
        Some(NODE_CERT),
    )
    .await
    .unwrap_err();
    match err {
        NodeError::NodeUnreachable(status) => {
            assert_eq!(status.code(), tonic::Code::Unauthenticated)
        }
        other => panic!("expected NodeUnreachable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_rejected_info_query_in_plaintext() {
    let node = MockLightning::rejecting(tonic::Status::unavailable("rpc not ready"));
    let addr = common::start_mock_node(node, None).await;

    let err = NodeClient::connect(
        &Shutdown::new(),
        &config(5),
        &format!("http://{}", addr),
        &token().to_binary(),
        None,
    )
    .await
    .unwrap_err();
    assert!(
        matches!(&err, NodeError::NodeUnreachable(status) if status.code() == tonic::Code::Unavailable),
        "{:?}",
        err
    );
}

#[tokio::test]
async fn test_silent_peer_hits_connect_deadline() {
    let addr = common::start_silent_listener().await;

    let started = Instant::now();
    let err = NodeClient::connect(
        &Shutdown::new(),
        &config(1),
        &format!("http://{}", addr),
        &token().to_binary(),
        None,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, NodeError::ConnectTimeout(1)), "{:?}", err);
    assert!(started.elapsed() < Duration::from_secs(3));
}

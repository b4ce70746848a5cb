mod common;

use lnd_confwatch::config::MempoolConfig;
use lnd_confwatch::mempool::{MempoolClient, MempoolError};
use lnd_confwatch::watch::MempoolSource;

fn client_for(addr: std::net::SocketAddr, prefix: &str) -> MempoolClient {
    MempoolClient::new(&MempoolConfig {
        base_url: format!("http://{}{}", addr, prefix),
        request_timeout_secs: 5,
    })
    .unwrap()
}

#[tokio::test]
async fn test_fetch_recent_and_outputs() {
    let addr = common::start_mock_mempool(vec![
        (
            "/api/mempool/recent",
            200,
            r#"[{"txid":"ab12","fee":226,"vsize":141,"value":5000},{"txid":"cd34"}]"#.to_string(),
        ),
        (
            "/api/tx/ab12",
            200,
            r#"{"txid":"ab12","vin":[],"vout":[{"scriptpubkey":"51","scriptpubkey_address":null,"value":1000},{"scriptpubkey":"52"}]}"#
                .to_string(),
        ),
    ])
    .await;
    let client = client_for(addr, "/api");

    let entries = client.recent_entries().await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].txid, "ab12");
    assert_eq!(entries[0].fee, Some(226));
    assert_eq!(entries[1].fee, None);

    let outputs = client.transaction_outputs("ab12").await.unwrap();
    let scripts: Vec<_> = outputs.iter().map(|o| o.scriptpubkey.as_str()).collect();
    assert_eq!(scripts, vec!["51", "52"]);
}

#[tokio::test]
async fn test_non_success_status_is_an_error() {
    let addr = common::start_mock_mempool(vec![(
        "/mempool/recent",
        503,
        "busy".to_string(),
    )])
    .await;
    let client = client_for(addr, "");

    let err = client.recent_entries().await.unwrap_err();
    assert!(matches!(err, MempoolError::Status { status: 503, .. }));

    let err = client.transaction_outputs("ffff").await.unwrap_err();
    assert!(matches!(err, MempoolError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_undecodable_body_is_an_error() {
    let addr = common::start_mock_mempool(vec![(
        "/mempool/recent",
        200,
        r#"{"not":"a list"}"#.to_string(),
    )])
    .await;
    let client = client_for(addr, "");

    let err = client.recent_entries().await.unwrap_err();
    assert!(matches!(err, MempoolError::Http(_)));
}

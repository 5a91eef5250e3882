mod common;

use common::mock_counter::{MockCounterApi, MockResponse};
use counterstate::config::RemoteConfig;
use counterstate::remote::{CountClient, RemoteError};

#[tokio::test]
async fn increase_puts_next_value_and_returns_server_echo() {
    let mock = MockCounterApi::start().await;
    mock.enqueue_response(MockResponse::json(r#"{"value": 3}"#)).await;

    let client = CountClient::new(mock.base_url()).unwrap();
    let value = client.increase("1", 2).await.unwrap();
    assert_eq!(value, 3);

    let requests = mock.captured_requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "PUT");
    assert_eq!(requests[0].path, "/count/1");
    assert_eq!(requests[0].json(), serde_json::json!({ "value": 3 }));
}

#[tokio::test]
async fn server_value_wins_over_local_guess() {
    let mock = MockCounterApi::start().await;
    // Another writer got there first; the server reports its own value.
    mock.enqueue_response(MockResponse::json(r#"{"value": 10}"#)).await;

    let client = CountClient::new(mock.base_url()).unwrap();
    assert_eq!(client.increase("1", 2).await.unwrap(), 10);
}

#[tokio::test]
async fn get_reads_value() {
    let mock = MockCounterApi::start().await;
    mock.seed("abc", 17).await;

    let client = CountClient::new(mock.base_url()).unwrap();
    assert_eq!(client.get("abc").await.unwrap(), 17);

    let requests = mock.captured_requests().await;
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].path, "/count/abc");
}

#[tokio::test]
async fn get_unknown_counter_is_not_found() {
    let mock = MockCounterApi::start().await;
    let client = CountClient::new(mock.base_url()).unwrap();

    let err = client.get("nope").await.unwrap_err();
    assert!(matches!(err, RemoteError::NotFound { ref id } if id == "nope"));
}

#[tokio::test]
async fn reset_puts_zero() {
    let mock = MockCounterApi::start().await;
    mock.seed("1", 9).await;

    let client = CountClient::new(mock.base_url()).unwrap();
    assert_eq!(client.reset("1").await.unwrap(), 0);
    assert_eq!(mock.value("1").await, Some(0));

    let requests = mock.captured_requests().await;
    assert_eq!(requests[0].json(), serde_json::json!({ "value": 0 }));
}

#[tokio::test]
async fn transport_failure_is_network_error() {
    let client = CountClient::new(common::dead_base_url()).unwrap();
    let err = client.get("1").await.unwrap_err();
    assert!(matches!(err, RemoteError::Network { .. }));
    assert_eq!(err.kind(), "network_error");
}

#[tokio::test]
async fn server_error_status_is_reported() {
    let mock = MockCounterApi::start().await;
    mock.enqueue_response(MockResponse::error(503, "maintenance")).await;

    let client = CountClient::new(mock.base_url()).unwrap();
    let err = client.reset("1").await.unwrap_err();
    match err {
        RemoteError::Status { status, message } => {
            assert_eq!(status, 503);
            assert!(message.contains("maintenance"));
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn malformed_body_is_decode_error() {
    let mock = MockCounterApi::start().await;
    mock.enqueue_response(MockResponse::json(r#"{"count": 1}"#)).await;

    let client = CountClient::new(mock.base_url()).unwrap();
    let err = client.get("1").await.unwrap_err();
    assert!(matches!(err, RemoteError::Decode { .. }));
}

#[tokio::test]
async fn invalid_id_sends_nothing() {
    let mock = MockCounterApi::start().await;
    let client = CountClient::new(mock.base_url()).unwrap();

    let err = client.increase("../admin", 1).await.unwrap_err();
    assert!(matches!(err, RemoteError::Validation(_)));
    assert!(mock.captured_requests().await.is_empty());
}

#[tokio::test]
async fn configured_timeout_bounds_slow_requests() {
    let mock = MockCounterApi::start().await;
    mock.enqueue_response(MockResponse::json(r#"{"value": 1}"#).with_delay(3_000))
        .await;

    let config = RemoteConfig {
        base_url: mock.base_url(),
        counter_id: "1".to_string(),
        timeout_seconds: Some(1),
    };
    let client = CountClient::from_config(&config).unwrap();

    let err = client.get("1").await.unwrap_err();
    assert!(matches!(err, RemoteError::Network { .. }));
}

//! Integration tests for bonfire-client against a local TCP endpoint.

use std::time::Duration;

use bonfire_client::BonfireClient;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::time::timeout;

/// Test that the client announces its subscription and delivers events for
/// subscribed channels only.
#[tokio::test]
async fn test_delivers_subscribed_events() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept failed");
        let (read, mut write) = stream.into_split();
        let mut lines = BufReader::new(read).lines();

        let line = lines.next_line().await.unwrap().expect("no subscribe frame");
        let frame: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(frame["op"], "subscribe");
        assert_eq!(frame["channel"], "tag/update");

        // One event on a foreign channel, then one on the subscribed channel.
        let other = serde_json::json!({ "channel": "alarm/update", "payload": "{}" });
        let update = serde_json::json!({
            "channel": "tag/update",
            "payload": r#"{"name":"temp1","value":21.5,"value_ts":1000}"#,
        });
        write
            .write_all(format!("{other}\n{update}\n").as_bytes())
            .await
            .unwrap();
    });

    let mut client = BonfireClient::new(addr.to_string());
    client.subscribe("tag/update");
    let mut events = client.start();

    let event = timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event stream ended");
    assert_eq!(event.channel, "tag/update");
    assert_eq!(event.payload, r#"{"name":"temp1","value":21.5,"value_ts":1000}"#);

    server.await.unwrap();

    // The foreign-channel event was written first, so it has already been
    // filtered out by the time the tag update arrived.
    assert!(timeout(Duration::from_millis(200), events.recv()).await.is_err());
}

/// Test that the client reconnects after a dropped connection and announces
/// its subscription again.
#[tokio::test]
async fn test_resubscribes_after_reconnect() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        // First connection is dropped straight away.
        let (stream, _) = listener.accept().await.expect("first accept failed");
        drop(stream);

        // The client comes back and subscribes again.
        let (stream, _) = listener.accept().await.expect("second accept failed");
        let (read, mut write) = stream.into_split();
        let mut lines = BufReader::new(read).lines();

        let line = lines.next_line().await.unwrap().expect("no subscribe frame");
        let frame: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(frame["op"], "subscribe");
        assert_eq!(frame["channel"], "tag/update");

        let update = serde_json::json!({
            "channel": "tag/update",
            "payload": r#"{"name":"flow2","value":7,"value_ts":2000}"#,
        });
        write
            .write_all(format!("{update}\n").as_bytes())
            .await
            .unwrap();
    });

    let mut client = BonfireClient::new(addr.to_string());
    client.subscribe("tag/update");
    let mut events = client.start();

    let event = timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for event after reconnect")
        .expect("event stream ended");
    assert_eq!(event.channel, "tag/update");
    assert_eq!(event.payload, r#"{"name":"flow2","value":7,"value_ts":2000}"#);

    server.await.unwrap();
}

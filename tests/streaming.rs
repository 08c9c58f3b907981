//! Server-sent event relay over a real socket.

use std::time::Duration;

use futures_util::StreamExt;
use reqwest::StatusCode;

mod common;

#[tokio::test]
async fn test_published_events_reach_subscriber_in_order() {
    let gateway = common::spawn_gateway(common::test_config()).await;
    gateway.streams.create_stream("chat");

    let response = reqwest::get(gateway.url("/api/v1/events?stream=chat")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/event-stream");

    // Headers arrive once the handler has subscribed.
    assert_eq!(gateway.streams.subscriber_count("chat"), 1);
    gateway.streams.publish("chat", "hello");
    gateway.streams.publish("chat", "world");

    let mut body = response.bytes_stream();
    let mut received = String::new();
    let read = tokio::time::timeout(Duration::from_secs(5), async {
        while !received.contains("data: world\n\n") {
            let chunk = body.next().await.unwrap().unwrap();
            received.push_str(std::str::from_utf8(&chunk).unwrap());
        }
    })
    .await;
    assert!(read.is_ok(), "events not delivered: {received:?}");
    assert_eq!(received, "data: hello\n\ndata: world\n\n");

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn test_client_disconnect_releases_subscription() {
    let gateway = common::spawn_gateway(common::test_config()).await;
    gateway.streams.create_stream("chat");

    let response = reqwest::get(gateway.url("/api/v1/events?stream=chat")).await.unwrap();
    assert_eq!(gateway.streams.subscriber_count("chat"), 1);
    drop(response);

    // Nothing is published: the closed socket alone must end the relay.
    let released = tokio::time::timeout(Duration::from_secs(5), async {
        while gateway.streams.subscriber_count("chat") > 0 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    assert!(released.is_ok(), "subscription still held after disconnect");

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn test_unknown_and_missing_streams_are_rejected() {
    let gateway = common::spawn_gateway(common::test_config()).await;

    let response = reqwest::get(gateway.url("/api/v1/events?stream=nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["msg"], "stream not found: nope");

    let response = reqwest::get(gateway.url("/api/v1/events")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn test_replay_backfills_new_subscribers() {
    let mut config = common::test_config();
    config.streams.auto_replay = true;
    let gateway = common::spawn_gateway(config).await;
    gateway.streams.create_stream("chat");
    gateway.streams.publish("chat", "earlier");

    let response = reqwest::get(gateway.url("/api/v1/events?stream=chat")).await.unwrap();
    let mut body = response.bytes_stream();
    let chunk = tokio::time::timeout(Duration::from_secs(5), body.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(std::str::from_utf8(&chunk).unwrap().starts_with("data: earlier\n\n"));

    gateway.shutdown.trigger();
}

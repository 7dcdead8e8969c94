//! Realtime client integration tests
//!
//! Each test runs the client against a stub WebSocket gateway on an
//! ephemeral port and a stubbed REST API. No external services are needed.
//!
//! Run with: cargo test -p integration-tests --test realtime_tests

use std::time::Duration;

use chat_core::Snowflake;
use chat_realtime::{ConnectionState, GatewayNotification, ReconnectPolicy, SubscriptionIntent};
use integration_tests::{
    channel_create, channel_delete, client_for, guild, hello, message_delete, message_event,
    message_record, wait_for_cache, wait_for_status, within, StubGateway, ATTACHMENT_BASE,
    TEST_TOKEN,
};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn api_with_guilds(guilds: serde_json::Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/me/guilds"))
        .and(header("authorization", format!("Bearer {TEST_TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(guilds))
        .mount(&server)
        .await;
    server
}

// ============================================================================
// Handshake Tests
// ============================================================================

#[tokio::test]
async fn test_handshake_heartbeat_and_initial_subscription() {
    let api = api_with_guilds(json!([guild(u64::MAX, "big"), guild(42, "small")])).await;
    let mut gateway = StubGateway::start().await.unwrap();
    let client = client_for(&gateway, &api.uri(), ReconnectPolicy::disabled()).unwrap();

    client.connect();
    let mut peer = gateway.accept().await.unwrap();

    let auth = peer.recv_json().await.unwrap();
    assert_eq!(auth, json!({"op": 1, "d": {"token": TEST_TOKEN}}));
    assert_eq!(client.status(), ConnectionState::Connecting);

    // 1200ms interval ticks on the 500ms floor
    peer.send_json(&hello(1200));
    wait_for_status(&client, ConnectionState::Connected).await.unwrap();
    assert_eq!(client.heartbeat_interval(), Some(1200));

    let subscribe = peer.recv_op(5).await.unwrap();
    assert_eq!(subscribe, json!({"op": 5, "d": {"guilds": [u64::MAX, 42]}}));

    let heartbeat = peer.recv_op(2).await.unwrap();
    assert_eq!(heartbeat, json!({"op": 2, "d": {"since": 0}}));
    peer.recv_op(2).await.unwrap();

    client.disconnect();
}

#[tokio::test]
async fn test_guild_fetch_failure_subscribes_to_no_guilds() {
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/me/guilds"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&api)
        .await;
    let mut gateway = StubGateway::start().await.unwrap();
    let client = client_for(&gateway, &api.uri(), ReconnectPolicy::disabled()).unwrap();

    client.connect();
    let mut peer = gateway.accept().await.unwrap();
    peer.recv_op(1).await.unwrap();
    peer.send_json(&hello(30_000));

    let subscribe = peer.recv_op(5).await.unwrap();
    assert_eq!(subscribe, json!({"op": 5, "d": {"guilds": []}}));

    client.disconnect();
}

// ============================================================================
// Event Tests
// ============================================================================

#[tokio::test]
async fn test_events_update_cache_and_notify() {
    let api = api_with_guilds(json!([])).await;
    let mut gateway = StubGateway::start().await.unwrap();
    let client = client_for(&gateway, &api.uri(), ReconnectPolicy::disabled()).unwrap();
    let mut notifications = client.notifications();

    client.connect();
    let mut peer = gateway.accept().await.unwrap();
    peer.recv_op(1).await.unwrap();
    peer.send_json(&hello(30_000));
    wait_for_status(&client, ConnectionState::Connected).await.unwrap();

    let channel = Snowflake::new(9_007_199_254_740_993);
    peer.send_json(&message_event(u64::MAX, channel.into_inner(), "first"));
    peer.send_json(&message_event(7, channel.into_inner(), "second"));
    wait_for_cache(&client, "two messages", |c| c.messages(channel).len() == 2)
        .await
        .unwrap();

    let messages = client.messages(channel);
    assert_eq!(messages[0].id, Snowflake::new(u64::MAX));
    assert_eq!(messages[0].content, "first");
    assert_eq!(messages[0].author_name, "alice");
    assert_eq!(
        messages[0].attachments[0].url,
        format!("{ATTACHMENT_BASE}/files/cat.png")
    );
    assert_eq!(messages[0].attachments[0].content_type, "unknown");

    peer.send_json(&message_delete(channel.into_inner(), u64::MAX));
    wait_for_cache(&client, "the delete", |c| c.messages(channel).len() == 1)
        .await
        .unwrap();
    assert_eq!(client.messages(channel)[0].id, Snowflake::new(7));

    peer.send_json(&channel_create(5, 77, "announcements"));
    peer.send_json(&channel_delete(5, 78));

    let created = within("channel create", notifications.recv())
        .await
        .unwrap()
        .unwrap();
    match created {
        GatewayNotification::ChannelCreated { guild_id, channel } => {
            assert_eq!(guild_id, Snowflake::new(5));
            assert_eq!(channel.id, Snowflake::new(77));
            assert_eq!(channel.name, "announcements");
        }
        other => panic!("unexpected notification: {other:?}"),
    }
    let deleted = within("channel delete", notifications.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        deleted,
        GatewayNotification::ChannelDeleted {
            guild_id: Snowflake::new(5),
            channel_id: Snowflake::new(78),
        }
    );

    client.disconnect();
}

#[tokio::test]
async fn test_malformed_frames_do_not_break_session() {
    let api = api_with_guilds(json!([])).await;
    let mut gateway = StubGateway::start().await.unwrap();
    let client = client_for(&gateway, &api.uri(), ReconnectPolicy::disabled()).unwrap();

    client.connect();
    let mut peer = gateway.accept().await.unwrap();
    peer.recv_op(1).await.unwrap();
    peer.send_json(&hello(30_000));
    wait_for_status(&client, ConnectionState::Connected).await.unwrap();

    peer.send_json(&json!("not an object"));
    peer.send_json(&json!({"op": 99, "d": {}}));
    peer.send_json(&json!({"op": 0, "d": {"message": {"id": 1, "channel_id": 2}}}));
    peer.send_json(&message_event(3, 2, "still alive"));

    wait_for_cache(&client, "the valid message", |c| {
        c.messages(Snowflake::new(2)).len() == 1
    })
    .await
    .unwrap();
    assert_eq!(client.status(), ConnectionState::Connected);

    client.disconnect();
}

// ============================================================================
// Subscription Tests
// ============================================================================

#[tokio::test]
async fn test_subscription_updates_reach_server() {
    let api = api_with_guilds(json!([])).await;
    let mut gateway = StubGateway::start().await.unwrap();
    let client = client_for(&gateway, &api.uri(), ReconnectPolicy::disabled()).unwrap();

    assert!(!client.send_subscription_update(&SubscriptionIntent::channel(Snowflake::new(1))));

    client.connect();
    let mut peer = gateway.accept().await.unwrap();
    peer.recv_op(1).await.unwrap();
    peer.send_json(&hello(30_000));
    peer.recv_op(5).await.unwrap();

    assert!(!client.send_subscription_update(&SubscriptionIntent::null_channel()));
    assert!(client.send_subscription_update(&SubscriptionIntent::channel(Snowflake::new(u64::MAX))));

    let frame = peer.recv_text().await.unwrap();
    assert_eq!(frame, r#"{"op":5,"d":{"channel":18446744073709551615}}"#);

    client.disconnect();
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

#[tokio::test]
async fn test_disconnect_closes_socket() {
    let api = api_with_guilds(json!([])).await;
    let mut gateway = StubGateway::start().await.unwrap();
    let client = client_for(&gateway, &api.uri(), ReconnectPolicy::enabled()).unwrap();

    client.connect();
    let mut peer = gateway.accept().await.unwrap();
    peer.recv_op(1).await.unwrap();
    peer.send_json(&hello(30_000));
    wait_for_status(&client, ConnectionState::Connected).await.unwrap();

    client.disconnect();
    assert_eq!(client.status(), ConnectionState::Disconnected);
    assert!(!client.is_heartbeat_running());
    peer.wait_closed().await.unwrap();

    // A local disconnect never triggers a reconnect
    let reconnect = tokio::time::timeout(Duration::from_millis(800), gateway.accept()).await;
    assert!(reconnect.is_err());
}

#[tokio::test]
async fn test_server_close_resets_state() {
    let api = api_with_guilds(json!([])).await;
    let mut gateway = StubGateway::start().await.unwrap();
    let client = client_for(&gateway, &api.uri(), ReconnectPolicy::disabled()).unwrap();

    client.connect();
    let mut peer = gateway.accept().await.unwrap();
    peer.recv_op(1).await.unwrap();
    peer.send_json(&hello(30_000));
    wait_for_status(&client, ConnectionState::Connected).await.unwrap();

    peer.close();
    wait_for_status(&client, ConnectionState::Disconnected).await.unwrap();
    assert!(!client.is_heartbeat_running());
    assert!(client.heartbeat_interval().is_none());

    // Connecting again works once the old socket is gone
    client.connect();
    let mut peer = gateway.accept().await.unwrap();
    assert_eq!(peer.recv_op(1).await.unwrap()["d"]["token"], TEST_TOKEN);

    client.disconnect();
}

#[tokio::test]
async fn test_reconnect_after_server_close() {
    let api = api_with_guilds(json!([])).await;
    let mut gateway = StubGateway::start().await.unwrap();
    let policy = ReconnectPolicy {
        initial_delay: Duration::from_millis(50),
        ..ReconnectPolicy::enabled()
    };
    let client = client_for(&gateway, &api.uri(), policy).unwrap();

    client.connect();
    let mut peer = gateway.accept().await.unwrap();
    peer.recv_op(1).await.unwrap();
    peer.send_json(&hello(30_000));
    peer.recv_op(5).await.unwrap();
    assert!(client.send_subscription_update(&SubscriptionIntent::channel(Snowflake::new(9))));
    peer.recv_op(5).await.unwrap();

    peer.close();

    let mut peer = gateway.accept().await.unwrap();
    assert_eq!(
        peer.recv_op(1).await.unwrap(),
        json!({"op": 1, "d": {"token": TEST_TOKEN}})
    );
    peer.send_json(&hello(30_000));
    wait_for_status(&client, ConnectionState::Connected).await.unwrap();

    // The channel focus from the first session is sent again
    assert_eq!(
        peer.recv_op(5).await.unwrap(),
        json!({"op": 5, "d": {"channel": 9, "guilds": []}})
    );

    client.disconnect();
}

#[tokio::test]
async fn test_unreachable_gateway_ends_disconnected() {
    let api = api_with_guilds(json!([])).await;
    let gateway = StubGateway::start().await.unwrap();
    let client = client_for(&gateway, &api.uri(), ReconnectPolicy::disabled()).unwrap();
    drop(gateway);

    // Give the accept loop a moment to release the port
    tokio::time::sleep(Duration::from_millis(50)).await;
    client.connect();
    assert_eq!(client.status(), ConnectionState::Connecting);

    wait_for_status(&client, ConnectionState::Disconnected).await.unwrap();
    assert!(!client.is_heartbeat_running());
}

// ============================================================================
// REST Tests
// ============================================================================

#[tokio::test]
async fn test_load_channel_replaces_cached_history() {
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/channel/7/messages"))
        .and(header("authorization", format!("Bearer {TEST_TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            message_record(1, 7, "one"),
            message_record(2, 7, "two"),
            message_record(1, 7, "duplicate"),
        ])))
        .expect(1)
        .mount(&api)
        .await;
    let gateway = StubGateway::start().await.unwrap();
    let client = client_for(&gateway, &api.uri(), ReconnectPolicy::disabled()).unwrap();

    let count = client.load_channel(Snowflake::new(7)).await.unwrap();

    assert_eq!(count, 2);
    let messages = client.messages(Snowflake::new(7));
    assert_eq!(messages[0].content, "one");
    assert_eq!(messages[1].timestamp, "2024-05-01T12:00:00.000Z");
    assert_eq!(
        messages[1].attachments[0].url,
        format!("{ATTACHMENT_BASE}/files/a.txt")
    );
}

#[tokio::test]
async fn test_load_channel_reports_api_errors() {
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/channel/7/messages"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"code": 50001})))
        .mount(&api)
        .await;
    let gateway = StubGateway::start().await.unwrap();
    let client = client_for(&gateway, &api.uri(), ReconnectPolicy::disabled()).unwrap();

    let err = client.load_channel(Snowflake::new(7)).await.unwrap_err();

    match err {
        chat_realtime::RealtimeError::Api(api_err) => assert_eq!(api_err.status(), Some(403)),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(client.messages(Snowflake::new(7)).is_empty());
}

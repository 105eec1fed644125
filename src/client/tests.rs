use super::{ClientConfig, ConnectionState, NotificationClient};
use crate::messaging::ToastLevel;
use crate::testing::{MockConnector, MockTokenProvider, RecordingNotifier};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};

struct Harness {
    client: NotificationClient,
    connector: Arc<MockConnector>,
    tokens: Arc<MockTokenProvider>,
    notifier: Arc<RecordingNotifier>,
}

fn harness(config: ClientConfig) -> Harness {
    let connector = MockConnector::new();
    let tokens = MockTokenProvider::new();
    let notifier = Arc::new(RecordingNotifier::default());

    let client = NotificationClient::builder(config)
        .unwrap()
        .connector(connector.clone())
        .token_provider(tokens.clone())
        .notifier(notifier.clone())
        .build();

    Harness {
        client,
        connector,
        tokens,
        notifier,
    }
}

fn config() -> ClientConfig {
    ClientConfig {
        reconnect_interval_ms: 1000,
        max_reconnect_attempts: 3,
        connect_timeout_ms: None,
        ..Default::default()
    }
}

fn listen(client: &NotificationClient, event: &str) -> mpsc::UnboundedReceiver<Value> {
    let (tx, rx) = mpsc::unbounded_channel();
    client.on(event, move |data| {
        let _ = tx.send(data.clone());
    });
    rx
}

#[tokio::test(start_paused = true)]
async fn test_connect_is_idempotent() {
    let h = harness(config());
    let mut connected = listen(&h.client, "connected");

    h.client.connect().await;
    h.client.connect().await;
    assert_eq!(h.connector.count(), 1);
    assert_eq!(h.tokens.fetch_count(), 1);
    assert_eq!(h.client.connection_state().await, ConnectionState::Connecting);

    h.connector.transport(0).open();
    connected.recv().await.unwrap();

    h.client.connect().await;
    assert_eq!(h.connector.count(), 1);
    assert!(h.client.is_connected().await);
    assert_eq!(h.connector.url(0), "ws://localhost:6001/?token=token-1");
}

#[tokio::test(start_paused = true)]
async fn test_backoff_doubles_until_ceiling_then_gives_up() {
    let h = harness(config());
    let mut reconnecting = listen(&h.client, "reconnecting");
    let mut give_up = listen(&h.client, "give_up");

    h.client.connect().await;

    for (attempt, delay_ms) in [(1u64, 1000u64), (2, 2000), (3, 4000)] {
        let transport = h.connector.wait_for(attempt as usize).await;
        let dropped_at = Instant::now();
        transport.drop_connection(1006);

        let scheduled = reconnecting.recv().await.unwrap();
        assert_eq!(scheduled["attempt"], attempt);
        assert_eq!(scheduled["max_attempts"], 3);
        assert_eq!(scheduled["delay_ms"], delay_ms);

        h.connector.wait_for(attempt as usize + 1).await;
        assert!(dropped_at.elapsed() >= Duration::from_millis(delay_ms));
    }

    h.connector.transport(3).drop_connection(1006);
    assert_eq!(give_up.recv().await.unwrap(), json!({"attempts": 3}));

    time::sleep(Duration::from_secs(120)).await;
    assert_eq!(h.connector.count(), 4);
    assert!(reconnecting.try_recv().is_err());
    assert_eq!(h.client.connection_state().await, ConnectionState::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_successful_open_resets_backoff() {
    let h = harness(config());
    let mut reconnecting = listen(&h.client, "reconnecting");
    let mut connected = listen(&h.client, "connected");

    h.client.connect().await;
    h.connector.transport(0).drop_connection(1006);
    assert_eq!(reconnecting.recv().await.unwrap()["delay_ms"], 1000);

    let second = h.connector.wait_for(2).await;
    second.open();
    connected.recv().await.unwrap();
    assert_eq!(h.client.reconnect_attempts().await, 0);

    second.drop_connection(1011);
    let scheduled = reconnecting.recv().await.unwrap();
    assert_eq!(scheduled["attempt"], 1);
    assert_eq!(scheduled["delay_ms"], 1000);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_cancels_pending_reconnect() {
    let h = harness(config());
    let mut reconnecting = listen(&h.client, "reconnecting");

    h.client.connect().await;
    h.connector.transport(0).drop_connection(1006);
    reconnecting.recv().await.unwrap();

    h.client.disconnect().await;
    time::sleep(Duration::from_secs(60)).await;

    assert_eq!(h.connector.count(), 1);
    assert_eq!(
        h.client.connection_state().await,
        ConnectionState::Disconnected
    );
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_closes_normally_and_revokes_token() {
    let h = harness(config());
    let mut connected = listen(&h.client, "connected");
    let mut disconnected = listen(&h.client, "disconnected");
    let mut reconnecting = listen(&h.client, "reconnecting");

    h.client.connect().await;
    let transport = h.connector.transport(0);
    transport.open();
    connected.recv().await.unwrap();

    h.client.disconnect().await;
    h.client.disconnect().await;

    assert_eq!(
        transport.closes(),
        vec![(1000, "User initiated disconnect".to_string())]
    );
    assert_eq!(disconnected.recv().await.unwrap()["code"], 1000);
    assert!(disconnected.try_recv().is_err());

    time::sleep(Duration::from_secs(60)).await;
    assert!(reconnecting.try_recv().is_err());
    assert_eq!(h.connector.count(), 1);
    assert_eq!(h.tokens.invalidated(), vec!["token-1".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_normal_server_close_does_not_reconnect() {
    let h = harness(config());
    let mut disconnected = listen(&h.client, "disconnected");
    let mut reconnecting = listen(&h.client, "reconnecting");

    h.client.connect().await;
    let transport = h.connector.transport(0);
    transport.open();
    transport.drop_connection(1000);

    assert_eq!(disconnected.recv().await.unwrap()["code"], 1000);
    time::sleep(Duration::from_secs(60)).await;
    assert!(reconnecting.try_recv().is_err());
    assert_eq!(h.connector.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_token_failure_takes_reconnect_path() {
    let h = harness(config());
    let mut reconnecting = listen(&h.client, "reconnecting");
    let mut connected = listen(&h.client, "connected");
    h.tokens.set_failing(true);

    h.client.connect().await;
    assert_eq!(reconnecting.recv().await.unwrap()["delay_ms"], 1000);
    assert_eq!(reconnecting.recv().await.unwrap()["delay_ms"], 2000);
    assert_eq!(h.connector.count(), 0);

    h.tokens.set_failing(false);
    let transport = h.connector.wait_for(1).await;
    assert_eq!(h.tokens.fetch_count(), 3);

    transport.open();
    connected.recv().await.unwrap();
    assert_eq!(h.client.reconnect_attempts().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_manual_connect_after_give_up_starts_fresh() {
    let h = harness(ClientConfig {
        max_reconnect_attempts: 1,
        ..config()
    });
    let mut reconnecting = listen(&h.client, "reconnecting");
    let mut give_up = listen(&h.client, "give_up");
    h.tokens.set_failing(true);

    h.client.connect().await;
    reconnecting.recv().await.unwrap();
    give_up.recv().await.unwrap();

    h.client.connect().await;
    let scheduled = reconnecting.recv().await.unwrap();
    assert_eq!(scheduled["attempt"], 1);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_messages_keep_connection() {
    let h = harness(config());
    let mut connected = listen(&h.client, "connected");
    let mut live = listen(&h.client, "real_time_data");

    h.client.connect().await;
    let transport = h.connector.transport(0);
    transport.open();
    connected.recv().await.unwrap();

    transport.deliver("{not json");
    transport.deliver(r#"{"type": "user_update", "data": {"action": "role_changed"}}"#);
    transport.deliver(r#"{"type": "real_time_data", "data": {"active_users": 42}}"#);

    assert_eq!(live.recv().await.unwrap(), json!({"active_users": 42}));
    assert_eq!(h.client.connection_state().await, ConnectionState::Connected);
    assert!(h.notifier.toasts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_panicking_handler_does_not_starve_others() {
    let h = harness(config());
    let mut connected = listen(&h.client, "connected");
    h.client.on("system_alert", |_| panic!("broken dashboard widget"));
    let mut alerts = listen(&h.client, "system_alert");

    h.client.connect().await;
    let transport = h.connector.transport(0);
    transport.open();
    connected.recv().await.unwrap();

    let data = json!({"severity": "warning", "message": "Maintenance at 22:00"});
    transport.deliver(&json!({"type": "system_alert", "data": data}).to_string());

    assert_eq!(alerts.recv().await.unwrap(), data);
    assert!(h.client.is_connected().await);
    assert_eq!(h.notifier.toasts()[0].level, ToastLevel::Warning);
}

#[tokio::test(start_paused = true)]
async fn test_handlers_observe_delivery_order() {
    let h = harness(config());
    let mut connected = listen(&h.client, "connected");
    let mut live = listen(&h.client, "real_time_data");

    h.client.connect().await;
    let transport = h.connector.transport(0);
    transport.open();
    connected.recv().await.unwrap();

    for seq in 1..=3 {
        transport.deliver(&json!({"type": "real_time_data", "data": {"seq": seq}}).to_string());
    }

    for seq in 1..=3 {
        assert_eq!(live.recv().await.unwrap(), json!({ "seq": seq }));
    }
}

#[tokio::test(start_paused = true)]
async fn test_document_update_toast_and_event() {
    let h = harness(config());
    let mut connected = listen(&h.client, "connected");
    let mut updates = listen(&h.client, "document_update");

    h.client.connect().await;
    let transport = h.connector.transport(0);
    transport.open();
    connected.recv().await.unwrap();

    let data = json!({"action": "approved", "document": {"title": "Thesis X"}});
    transport.deliver(
        &json!({
            "type": "document_update",
            "data": data,
            "timestamp": "2025-09-01T10:00:00Z",
            "id": "42"
        })
        .to_string(),
    );

    assert_eq!(updates.recv().await.unwrap(), data);
    let toasts = h.notifier.toasts();
    assert_eq!(toasts.len(), 1);
    assert!(toasts[0].message.contains("Thesis X"));
    assert!(toasts[0].message.contains("approved"));
}

#[tokio::test(start_paused = true)]
async fn test_heartbeat_pings_only_while_open() {
    let h = harness(ClientConfig {
        heartbeat_interval_ms: 1000,
        ..config()
    });
    let mut connected = listen(&h.client, "connected");

    h.client.connect().await;
    let transport = h.connector.transport(0);
    transport.open();
    connected.recv().await.unwrap();

    time::sleep(Duration::from_millis(3500)).await;
    let pings = transport.sent();
    assert_eq!(pings.len(), 3);
    let ping: Value = serde_json::from_str(&pings[0]).unwrap();
    assert_eq!(ping["type"], "ping");

    transport.set_state(crate::websocket::ReadyState::Closing);
    time::sleep(Duration::from_millis(5000)).await;
    assert_eq!(transport.sent().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_heartbeat_stops_after_close() {
    let h = harness(ClientConfig {
        heartbeat_interval_ms: 1000,
        ..config()
    });
    let mut connected = listen(&h.client, "connected");
    let mut disconnected = listen(&h.client, "disconnected");

    h.client.connect().await;
    let transport = h.connector.transport(0);
    transport.open();
    connected.recv().await.unwrap();

    transport.drop_connection(1000);
    disconnected.recv().await.unwrap();

    // Reopening the same transport would let a leaked heartbeat send again
    transport.set_state(crate::websocket::ReadyState::Open);
    time::sleep(Duration::from_secs(5)).await;
    assert!(transport.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_send_requires_open_transport() {
    let h = harness(config());
    let mut connected = listen(&h.client, "connected");

    h.client.send(&json!({"type": "mark_read", "id": 1})).await;

    h.client.connect().await;
    let transport = h.connector.transport(0);
    h.client.send(&json!({"type": "mark_read", "id": 2})).await;
    assert!(transport.sent().is_empty());

    transport.open();
    connected.recv().await.unwrap();
    h.client.send(&json!({"type": "mark_read", "id": 3})).await;

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    let message: Value = serde_json::from_str(&sent[0]).unwrap();
    assert_eq!(message["id"], 3);
}

#[tokio::test(start_paused = true)]
async fn test_transport_error_emits_event_without_reconnect() {
    let h = harness(config());
    let mut connected = listen(&h.client, "connected");
    let mut errors = listen(&h.client, "error");
    let mut reconnecting = listen(&h.client, "reconnecting");

    h.client.connect().await;
    let transport = h.connector.transport(0);
    transport.open();
    connected.recv().await.unwrap();

    transport.fail("connection reset by peer");
    assert_eq!(
        errors.recv().await.unwrap(),
        json!({"message": "connection reset by peer"})
    );

    time::sleep(Duration::from_secs(30)).await;
    assert!(reconnecting.try_recv().is_err());
    assert!(h.client.is_connected().await);
}

#[tokio::test(start_paused = true)]
async fn test_connect_timeout_abandons_attempt() {
    let h = harness(ClientConfig {
        connect_timeout_ms: Some(10_000),
        ..config()
    });
    let mut disconnected = listen(&h.client, "disconnected");
    let mut reconnecting = listen(&h.client, "reconnecting");

    h.client.connect().await;
    let stuck = h.connector.transport(0);

    assert_eq!(
        disconnected.recv().await.unwrap(),
        json!({"code": 1006, "reason": "connect timeout"})
    );
    assert_eq!(reconnecting.recv().await.unwrap()["attempt"], 1);
    assert_eq!(stuck.closes().len(), 1);

    let retry = h.connector.wait_for(2).await;
    assert_eq!(
        h.client.connection_state().await,
        ConnectionState::Connecting
    );

    // A late open from the abandoned transport is ignored
    stuck.open();
    retry.open();
    time::sleep(Duration::from_millis(10)).await;
    assert!(h.client.is_connected().await);
    assert_eq!(h.client.reconnect_attempts().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_subscriptions_are_restored_after_reconnect() {
    let h = harness(config());
    let mut connected = listen(&h.client, "connected");

    h.client.subscribe("department.4").await;
    h.client.connect().await;

    let first = h.connector.transport(0);
    first.open();
    connected.recv().await.unwrap();
    assert_eq!(
        first.sent(),
        vec![json!({"type": "subscribe", "channel": "department.4"}).to_string()]
    );

    h.client.subscribe("role.dean").await;
    h.client.unsubscribe("department.4").await;
    assert_eq!(first.sent().len(), 3);

    first.drop_connection(1006);
    let second = h.connector.wait_for(2).await;
    second.open();
    connected.recv().await.unwrap();

    assert_eq!(
        second.sent(),
        vec![json!({"type": "subscribe", "channel": "role.dean"}).to_string()]
    );
    assert_eq!(h.client.subscriptions().await, vec!["role.dean".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_off_stops_delivery() {
    let h = harness(config());
    let mut connected = listen(&h.client, "connected");
    let mut live = listen(&h.client, "real_time_data");

    let (tx, mut removed) = mpsc::unbounded_channel();
    let id = h.client.on("real_time_data", move |data| {
        let _ = tx.send(data.clone());
    });

    h.client.connect().await;
    let transport = h.connector.transport(0);
    transport.open();
    connected.recv().await.unwrap();

    h.client.off("real_time_data", id);
    transport.deliver(r#"{"type": "real_time_data", "data": 1}"#);

    assert_eq!(live.recv().await.unwrap(), json!(1));
    assert!(removed.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_token_is_appended_to_endpoint_path_and_query() {
    let h = harness(ClientConfig {
        endpoint_url: "wss://archive.example.edu/ws?app=web".to_string(),
        ..config()
    });

    h.client.connect().await;

    assert_eq!(
        h.connector.url(0),
        "wss://archive.example.edu/ws?app=web&token=token-1"
    );
}

//! Realtime channel integration tests.
//!
//! The real WebSocket connector against the in-process fake backend.

mod fixtures;

use std::{sync::Arc, time::Duration};

use devnet_client::{
    channel::{AuthMode, ChannelConfig, ChannelError, ChannelManager, Notification},
    domain::{ChannelState, Delivery, IncomingEnvelope, MessageContent, OutgoingMessage, UserId},
    infrastructure::{credential::CookieString, transport::WebSocketConnector},
};
use fixtures::{Push, TOKEN, TestServer};
use serde_json::json;
use tokio::sync::{broadcast, mpsc};

const WAIT: Duration = Duration::from_secs(5);

fn create_channel(server: &TestServer, config: ChannelConfig, token: &str) -> ChannelManager {
    let config = ChannelConfig {
        origin: server.base_url(),
        ..config
    };
    ChannelManager::new(
        config,
        Arc::new(WebSocketConnector::new()),
        Arc::new(CookieString::new(format!("theme=dark; access_token={token}"))),
    )
    .expect("Failed to create channel")
}

fn collect_deliveries(channel: &ChannelManager) -> mpsc::UnboundedReceiver<Delivery> {
    let (tx, rx) = mpsc::unbounded_channel();
    channel.on_envelope(move |delivery: Delivery| {
        let _ = tx.send(delivery);
    });
    rx
}

async fn wait_for_state(channel: &ChannelManager, expected: ChannelState) {
    tokio::time::timeout(
        WAIT,
        channel.watch_state().wait_for(|state| *state == expected),
    )
    .await
    .expect("Timed out waiting for channel state")
    .expect("Channel dropped");
}

async fn next_delivery(rx: &mut mpsc::UnboundedReceiver<Delivery>) -> Delivery {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("Timed out waiting for a delivery")
        .expect("Dispatcher stopped")
}

async fn wait_for_notification(
    rx: &mut broadcast::Receiver<Notification>,
    expected: &Notification,
) {
    tokio::time::timeout(WAIT, async {
        loop {
            match rx.recv().await {
                Ok(notification) if &notification == expected => return,
                Ok(_) => continue,
                Err(e) => panic!("Notification channel failed: {e}"),
            }
        }
    })
    .await
    .expect("Timed out waiting for notification");
}

#[tokio::test]
async fn test_handshake_send_and_receive() {
    // テスト項目: /ws でハンドシェイクして Open になり、送受信できる
    // given (前提条件):
    let mut server = TestServer::start().await;
    let channel = create_channel(&server, ChannelConfig::new("unused"), TOKEN);
    let mut deliveries = collect_deliveries(&channel);

    // when (操作):
    channel.connect().expect("connect failed");
    wait_for_state(&channel, ChannelState::Open).await;
    let message = OutgoingMessage::text(
        UserId::new(2).unwrap(),
        MessageContent::new("hi").unwrap(),
    );
    channel.send(&message).expect("send failed");

    // then (期待する結果): 正規形式のフレームがバックエンドに届く
    assert_eq!(
        server.next_received().await,
        json!({"type": "message", "to_user_id": 2, "content": "hi", "message_type": "text"})
    );
    assert_eq!(
        next_delivery(&mut deliveries).await,
        Ok(IncomingEnvelope::MessageSent {
            id: Some(100),
            timestamp: Some("2024-01-01T00:00:00Z".to_string())
        })
    );
    assert_eq!(server.ws_paths(), vec!["/ws".to_string()]);

    // サーバーからのプッシュもハンドラに届く
    server.push(Push::Frame(
        json!({
            "type": "message",
            "id": 7,
            "from_user_id": 2,
            "from_username": "bob",
            "content": "hey",
            "timestamp": "2024-01-01T00:00:00Z"
        })
        .to_string(),
    ));
    match next_delivery(&mut deliveries).await {
        Ok(IncomingEnvelope::Message(message)) => {
            assert_eq!(message.id, Some(7));
            assert_eq!(message.from_user_id, 2);
            assert_eq!(message.content, "hey");
            assert_eq!(message.sender_name(), "bob");
        }
        other => panic!("unexpected delivery: {other:?}"),
    }

    channel.close();
    assert_eq!(channel.state(), ChannelState::Disconnected);
}

#[tokio::test]
async fn test_malformed_push_keeps_channel_open() {
    // テスト項目: 不正なフレームはデコードエラーとして届き、接続は維持される
    // given (前提条件):
    let server = TestServer::start().await;
    let channel = create_channel(&server, ChannelConfig::new("unused"), TOKEN);
    let mut deliveries = collect_deliveries(&channel);
    channel.connect().unwrap();
    wait_for_state(&channel, ChannelState::Open).await;

    // when (操作):
    server.push(Push::Frame("{not json".to_string()));
    server.push(Push::Frame(r#"{"type":"chat_deleted"}"#.to_string()));

    // then (期待する結果):
    assert!(next_delivery(&mut deliveries).await.is_err());
    assert_eq!(
        next_delivery(&mut deliveries).await,
        Ok(IncomingEnvelope::ChatDeleted)
    );
    assert_eq!(channel.state(), ChannelState::Open);
}

#[tokio::test]
async fn test_reconnects_after_server_drop() {
    // テスト項目: サーバー側の切断後に固定間隔で再接続し、再度ハンドシェイクする
    // given (前提条件):
    let server = TestServer::start().await;
    let config = ChannelConfig::new("unused").with_reconnect_delay(Duration::from_millis(200));
    let channel = create_channel(&server, config, TOKEN);
    let mut notifications = channel.subscribe();
    channel.connect().unwrap();
    wait_for_notification(&mut notifications, &Notification::Ready).await;

    // when (操作):
    server.push(Push::Disconnect);

    // then (期待する結果):
    wait_for_notification(
        &mut notifications,
        &Notification::ReconnectScheduled {
            delay: Duration::from_millis(200),
        },
    )
    .await;
    wait_for_notification(&mut notifications, &Notification::Ready).await;
    assert_eq!(channel.state(), ChannelState::Open);
    assert_eq!(server.connections(), 2);
}

#[tokio::test]
async fn test_rejected_token_halts() {
    // テスト項目: トークンが拒否されると認証失敗を通知し、再接続しない
    // given (前提条件):
    let server = TestServer::start().await;
    let config = ChannelConfig::new("unused").with_reconnect_delay(Duration::from_millis(100));
    let channel = create_channel(&server, config, "wrong-token");
    let mut notifications = channel.subscribe();

    // when (操作):
    channel.connect().unwrap();

    // then (期待する結果):
    wait_for_notification(
        &mut notifications,
        &Notification::Failed(ChannelError::Protocol {
            message: "Invalid token".to_string(),
        }),
    )
    .await;
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(channel.state(), ChannelState::Disconnected);
    assert_eq!(server.connections(), 1);
}

#[tokio::test]
async fn test_user_path_mode_sends_cookie() {
    // テスト項目: /ws/{id} にクッキー付きで接続し、ハンドシェイクなしで送信できる
    // given (前提条件):
    let mut server = TestServer::start().await;
    let config =
        ChannelConfig::new("unused").with_auth(AuthMode::UserPath(UserId::new(1).unwrap()));
    let channel = create_channel(&server, config, TOKEN);

    // when (操作):
    channel.connect().unwrap();
    wait_for_state(&channel, ChannelState::Open).await;
    channel
        .send(&OutgoingMessage::text(
            UserId::new(3).unwrap(),
            MessageContent::new("yo").unwrap(),
        ))
        .unwrap();

    // then (期待する結果):
    assert_eq!(server.next_received().await["content"], "yo");
    assert_eq!(server.ws_paths(), vec!["/ws/1".to_string()]);
}

#[tokio::test]
async fn test_user_path_without_valid_cookie_keeps_retrying() {
    // テスト項目: アップグレードが拒否されるとトランスポートエラーとして再試行する
    // given (前提条件):
    let server = TestServer::start().await;
    let config = ChannelConfig::new("unused")
        .with_auth(AuthMode::UserPath(UserId::new(1).unwrap()))
        .with_reconnect_delay(Duration::from_millis(100));
    let channel = create_channel(&server, config, "wrong-token");
    let mut notifications = channel.subscribe();

    // when (操作):
    channel.connect().unwrap();

    // then (期待する結果):
    for _ in 0..2 {
        wait_for_notification(
            &mut notifications,
            &Notification::ReconnectScheduled {
                delay: Duration::from_millis(100),
            },
        )
        .await;
    }
    channel.close();
    assert_eq!(channel.state(), ChannelState::Disconnected);
    assert_eq!(server.connections(), 0);
}

//! In-process fake DevNet backend for integration tests.
//!
//! Serves `/api/me`, `/api/users`, `/api/messages/{id}`, `/ws` (token
//! handshake) and `/ws/{user_id}` (cookie on the upgrade request). Frames the
//! client writes are forwarded to the test, and the test can push frames to,
//! or drop, every connected socket.

#![allow(dead_code)]

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode, header::COOKIE},
    response::{IntoResponse, Response},
    routing::get,
};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::{
    net::TcpListener,
    sync::{broadcast, mpsc},
    task::JoinHandle,
};

pub const TOKEN: &str = "secret-token";

#[derive(Debug, Clone)]
pub enum Push {
    Frame(String),
    Disconnect,
}

struct BackendState {
    connections: AtomicUsize,
    ws_paths: Mutex<Vec<String>>,
    received: mpsc::UnboundedSender<Value>,
    push: broadcast::Sender<Push>,
    next_message_id: AtomicUsize,
}

pub struct TestServer {
    addr: std::net::SocketAddr,
    state: Arc<BackendState>,
    received: mpsc::UnboundedReceiver<Value>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start the backend on an ephemeral port.
    pub async fn start() -> Self {
        let (received_tx, received) = mpsc::unbounded_channel();
        let (push, _) = broadcast::channel(16);
        let state = Arc::new(BackendState {
            connections: AtomicUsize::new(0),
            ws_paths: Mutex::new(Vec::new()),
            received: received_tx,
            push,
            next_message_id: AtomicUsize::new(100),
        });

        let app = Router::new()
            .route("/api/me", get(me))
            .route("/api/users", get(users))
            .route("/api/messages/{user_id}", get(messages))
            .route("/ws", get(ws_handshake))
            .route("/ws/{user_id}", get(ws_user_path))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test server");
        let addr = listener.local_addr().expect("No local address");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server failed");
        });

        Self {
            addr,
            state,
            received,
            handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of WebSocket upgrades accepted so far.
    pub fn connections(&self) -> usize {
        self.state.connections.load(Ordering::SeqCst)
    }

    pub fn ws_paths(&self) -> Vec<String> {
        self.state.ws_paths.lock().unwrap().clone()
    }

    /// Next chat frame a client wrote (auth frames excluded).
    pub async fn next_received(&mut self) -> Value {
        tokio::time::timeout(Duration::from_secs(5), self.received.recv())
            .await
            .expect("Timed out waiting for a client frame")
            .expect("Backend stopped")
    }

    pub fn push(&self, push: Push) {
        let _ = self.state.push.send(push);
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn has_token(headers: &HeaderMap) -> bool {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.split_once('='))
        .any(|(name, value)| name.trim() == "access_token" && value.trim() == TOKEN)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Not authenticated"})),
    )
        .into_response()
}

async fn me(headers: HeaderMap) -> Response {
    if !has_token(&headers) {
        return unauthorized();
    }
    Json(json!({
        "user": {"id": 1, "username": "alice", "display_name": "Alice", "is_online": true}
    }))
    .into_response()
}

async fn users(headers: HeaderMap) -> Response {
    if !has_token(&headers) {
        return unauthorized();
    }
    Json(json!({
        "users": [
            {"id": 1, "username": "alice", "display_name": "Alice", "is_online": true},
            {"id": 2, "username": "bob", "display_name": null, "is_online": false},
            {"id": 3, "username": "carol", "display_name": "Carol", "is_online": true},
            {"id": 0, "username": "ghost", "is_online": false}
        ]
    }))
    .into_response()
}

async fn messages(headers: HeaderMap, Path(user_id): Path<i64>) -> Response {
    if !has_token(&headers) {
        return unauthorized();
    }
    Json(json!({
        "messages": [
            {
                "id": 2,
                "content": "hello alice",
                "from_user_id": user_id,
                "sender": {"id": user_id, "username": "bob", "display_name": "Bob"},
                "created_at": "2024-01-01T10:00:05"
            },
            {
                "id": 1,
                "content": "hi",
                "from_user_id": 1,
                "created_at": "2024-01-01T10:00:00Z"
            }
        ]
    }))
    .into_response()
}

async fn ws_handshake(ws: WebSocketUpgrade, State(state): State<Arc<BackendState>>) -> Response {
    state.ws_paths.lock().unwrap().push("/ws".to_string());
    ws.on_upgrade(move |socket| handle_socket(socket, state, true))
}

async fn ws_user_path(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    Path(user_id): Path<i64>,
    State(state): State<Arc<BackendState>>,
) -> Response {
    if !has_token(&headers) {
        return unauthorized();
    }
    state.ws_paths.lock().unwrap().push(format!("/ws/{user_id}"));
    ws.on_upgrade(move |socket| handle_socket(socket, state, false))
}

async fn handle_socket(socket: WebSocket, state: Arc<BackendState>, handshake: bool) {
    state.connections.fetch_add(1, Ordering::SeqCst);
    let mut push = state.push.subscribe();
    let (mut sender, mut receiver) = socket.split();
    let mut authenticated = !handshake;

    loop {
        tokio::select! {
            incoming = receiver.next() => {
                let Some(Ok(Message::Text(text))) = incoming else {
                    break;
                };
                let Ok(frame) = serde_json::from_str::<Value>(text.as_str()) else {
                    continue;
                };
                let reply = if !authenticated {
                    if frame["type"] == "auth" && frame["token"] == TOKEN {
                        authenticated = true;
                        json!({"type": "auth_success"})
                    } else {
                        json!({"type": "error", "message": "Invalid token"})
                    }
                } else {
                    let id = state.next_message_id.fetch_add(1, Ordering::SeqCst);
                    let _ = state.received.send(frame);
                    json!({"type": "message_sent", "id": id, "timestamp": "2024-01-01T00:00:00Z"})
                };
                if sender.send(Message::Text(reply.to_string().into())).await.is_err() {
                    break;
                }
            }
            pushed = push.recv() => match pushed {
                Ok(Push::Frame(frame)) => {
                    if sender.send(Message::Text(frame.into())).await.is_err() {
                        break;
                    }
                }
                Ok(Push::Disconnect) | Err(_) => {
                    let _ = sender.close().await;
                    break;
                }
            },
        }
    }
}

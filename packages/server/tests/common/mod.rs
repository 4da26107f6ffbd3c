//! Helpers for integration tests: an in-process server on an ephemeral port
//! and a thin WebSocket client.

#![allow(dead_code)]

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::{
    net::{TcpListener, TcpStream},
    sync::oneshot,
    task::JoinHandle,
};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use watchparty_server::{
    config::{RoomSeed, ServerConfig},
    infrastructure::dto::websocket::ServerEvent,
    ui::Server,
};

/// イベントを待つ最大時間
const RECV_TIMEOUT: Duration = Duration::from_secs(2);
/// 「何も届かない」ことを確認する待ち時間
const QUIET_PERIOD: Duration = Duration::from_millis(200);

/// Helper struct to manage an in-process server
pub struct TestServer {
    pub port: u16,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    /// Start a server with the given rooms registered as `CODE:HOST_ID`
    pub async fn start(rooms: &[&str]) -> Self {
        let config = ServerConfig {
            port: 0,
            seed_rooms: rooms
                .iter()
                .map(|r| r.parse::<RoomSeed>().unwrap())
                .collect(),
            ..ServerConfig::default()
        };
        Self::start_with_config(config).await
    }

    pub async fn start_with_config(config: ServerConfig) -> Self {
        let server = Server::new(config).await.unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = oneshot::channel();
        let handle = tokio::spawn(server.serve(listener, async {
            let _ = rx.await;
        }));

        TestServer {
            port,
            shutdown: Some(tx),
            handle,
        }
    }

    /// Get the WebSocket URL for this server
    pub fn ws_url(&self) -> String {
        format!("ws://127.0.0.1:{}/ws", self.port)
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }

    /// Trigger graceful shutdown and wait until the server stops
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = tokio::time::timeout(Duration::from_secs(5), &mut self.handle).await;
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Helper struct for a WebSocket client
pub struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    pub async fn connect(server: &TestServer) -> Self {
        let (ws, _) = connect_async(server.ws_url()).await.unwrap();
        TestClient { ws }
    }

    pub async fn send(&mut self, event: Value) {
        self.ws
            .send(Message::text(event.to_string()))
            .await
            .unwrap();
    }

    pub async fn send_raw(&mut self, text: &str) {
        self.ws.send(Message::text(text.to_string())).await.unwrap();
    }

    /// Send a `join` and wait for the resulting participant list
    pub async fn join(&mut self, room_code: &str, user_id: &str, username: &str) -> ServerEvent {
        self.send(json!({
            "type": "join",
            "roomCode": room_code,
            "userId": user_id,
            "username": username,
            "displayName": username,
        }))
        .await;
        self.recv_until(|e| matches!(e, ServerEvent::ParticipantList { .. }))
            .await
    }

    /// Receive the next event (ping / pong frames are skipped)
    pub async fn recv(&mut self) -> ServerEvent {
        self.try_recv(RECV_TIMEOUT)
            .await
            .expect("Timed out waiting for an event")
    }

    /// Receive events until one matches the predicate
    pub async fn recv_until(&mut self, predicate: impl Fn(&ServerEvent) -> bool) -> ServerEvent {
        loop {
            let event = self.recv().await;
            if predicate(&event) {
                return event;
            }
        }
    }

    /// Assert that no event arrives for a short while
    pub async fn expect_silence(&mut self) {
        if let Some(event) = self.try_recv(QUIET_PERIOD).await {
            panic!("Unexpected event: {:?}", event);
        }
    }

    async fn try_recv(&mut self, timeout: Duration) -> Option<ServerEvent> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let msg = tokio::time::timeout_at(deadline, self.ws.next())
                .await
                .ok()??
                .ok()?;
            match msg {
                Message::Text(text) => return Some(serde_json::from_str(text.as_str()).unwrap()),
                Message::Close(_) => return None,
                _ => continue,
            }
        }
    }

    pub async fn close(mut self) {
        let _ = self.ws.close(None).await;
    }
}

/// `participant-list` の user_id 一覧
pub fn participant_ids(event: &ServerEvent) -> Vec<String> {
    match event {
        ServerEvent::ParticipantList { participants } => {
            participants.iter().map(|p| p.user_id.clone()).collect()
        }
        other => panic!("Expected participant-list, got {:?}", other),
    }
}

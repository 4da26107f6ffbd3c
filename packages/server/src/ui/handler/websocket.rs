//! WebSocket connection handlers.

use std::{sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use tokio::sync::{mpsc, oneshot};

use crate::{domain::ConnectionId, ui::state::AppState};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// Also sends a ping every `ping_interval`. The task ends when the channel is closed
/// or the socket can no longer be written to.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: SplitSink<WebSocket, Message>,
    ping_interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(ping_interval);
        // 最初の tick は即時
        ticker.tick().await;

        loop {
            tokio::select! {
                msg = rx.recv() => {
                    let Some(msg) = msg else { break };
                    if sender.send(Message::Text(msg.into())).await.is_err() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if sender.send(Message::Ping(Bytes::new())).await.is_err() {
                        break;
                    }
                }
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = ConnectionId::generate();
    let (sender, mut receiver) = socket.split();

    // Register this connection's outbound channel
    let (tx, rx) = mpsc::unbounded_channel();
    state.gateway.connect(connection_id, tx).await;

    // Spawn a task to receive events from this client
    // 停止の合図は次のフレームを待っている間だけ受け付け、処理中のイベントは最後まで処理する
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
    let gateway = state.gateway.clone();
    let mut recv_task = tokio::spawn(async move {
        loop {
            let msg = tokio::select! {
                msg = receiver.next() => msg,
                _ = &mut stop_rx => break,
            };
            let msg = match msg {
                Some(Ok(msg)) => msg,
                Some(Err(e)) => {
                    tracing::warn!("WebSocket error on '{}': {}", connection_id, e);
                    break;
                }
                None => break,
            };

            match msg {
                Message::Text(text) => {
                    tracing::debug!("Received from '{}': {}", connection_id, text.as_str());
                    gateway.handle_text(connection_id, text.as_str()).await;
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", connection_id);
                    break;
                }
                // Ping/pong is handled automatically by the WebSocket protocol
                _ => {}
            }
        }
    });

    // Spawn a task to push events from the room to this client
    let mut send_task = pusher_loop(rx, sender, state.ping_interval);

    // If the receiving side completes, abort the pushing side.
    // If the pushing side completes, stop the receiving side and wait for it.
    let push_ended = tokio::select! {
        _ = &mut recv_task => false,
        _ = &mut send_task => true,
    };
    if push_ended {
        let _ = stop_tx.send(());
        if let Err(e) = recv_task.await {
            tracing::warn!("Receive task of '{}' failed: {}", connection_id, e);
        }
    } else {
        send_task.abort();
    }

    state.gateway.disconnect(connection_id).await;
}

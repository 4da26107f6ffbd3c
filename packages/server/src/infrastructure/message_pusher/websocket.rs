//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - コネクションごとの `UnboundedSender` を管理
//! - ドメインイベントを JSON にエンコードして送信（push_to, broadcast）
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、メッセージ送信に使用します。
//! 送信に失敗した sender は受信側（ソケットのタスク）が終了しているため、
//! その場で登録を解除します。切断時のクリーンアップはソケット側のタスクが行います。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    BroadcastReport, ConnectionId, MessagePushError, MessagePusher, PusherChannel, RoomEvent,
};
use crate::infrastructure::dto::websocket::ServerEvent;

/// WebSocket を使った MessagePusher 実装
///
/// ## 使用例
///
/// ```ignore
/// let pusher = WebSocketMessagePusher::new();
/// pusher.register_client(connection_id, tx).await;
/// pusher.push_to(&connection_id, &RoomEvent::Kicked).await?;
/// ```
#[derive(Default)]
pub struct WebSocketMessagePusher {
    /// 接続中のコネクションの sender
    clients: Mutex<HashMap<ConnectionId, PusherChannel>>,
}

impl WebSocketMessagePusher {
    /// 新しい WebSocketMessagePusher を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 登録中のコネクション数
    pub async fn count_clients(&self) -> usize {
        self.clients.lock().await.len()
    }

    fn encode(event: &RoomEvent) -> Result<String, MessagePushError> {
        serde_json::to_string(&ServerEvent::from(event))
            .map_err(|e| MessagePushError::EncodeFailed(e.to_string()))
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel) {
        let mut clients = self.clients.lock().await;
        clients.insert(connection_id, sender);
        tracing::debug!("Connection '{}' registered to MessagePusher", connection_id);
    }

    async fn unregister_client(&self, connection_id: &ConnectionId) {
        let mut clients = self.clients.lock().await;
        if clients.remove(connection_id).is_some() {
            tracing::debug!(
                "Connection '{}' unregistered from MessagePusher",
                connection_id
            );
        }
    }

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        event: &RoomEvent,
    ) -> Result<(), MessagePushError> {
        let content = Self::encode(event)?;
        let mut clients = self.clients.lock().await;

        let outcome = clients
            .get(connection_id)
            .map(|sender| sender.send(content));
        match outcome {
            Some(Ok(())) => {}
            Some(Err(e)) => {
                clients.remove(connection_id);
                return Err(MessagePushError::PushFailed(e.to_string()));
            }
            None => {
                return Err(MessagePushError::ConnectionNotFound(
                    connection_id.to_string(),
                ));
            }
        }
        tracing::debug!("Pushed '{}' to connection '{}'", event.name(), connection_id);
        Ok(())
    }

    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        event: &RoomEvent,
    ) -> Result<BroadcastReport, MessagePushError> {
        let content = Self::encode(event)?;
        let mut clients = self.clients.lock().await;
        let mut report = BroadcastReport::default();

        for target in targets {
            let outcome = clients
                .get(&target)
                .map(|sender| sender.send(content.clone()));
            match outcome {
                Some(Ok(())) => report.delivered += 1,
                Some(Err(e)) => {
                    // ブロードキャストでは一部の送信失敗を許容
                    tracing::warn!(
                        "Failed to push '{}' to connection '{}': {}",
                        event.name(),
                        target,
                        e
                    );
                    clients.remove(&target);
                    report.failed.push(target);
                }
                None => {
                    tracing::warn!(
                        "Connection '{}' not found during broadcast, skipping",
                        target
                    );
                    report.failed.push(target);
                }
            }
        }

        tracing::debug!(
            "Broadcasted '{}' to {} connection(s), {} failed",
            event.name(),
            report.delivered,
            report.failed.len()
        );
        Ok(report)
    }
}

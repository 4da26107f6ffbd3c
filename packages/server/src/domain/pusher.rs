//! MessagePusher trait 定義
//!
//! コネクションへの通知のインターフェース。
//! WebSocket などの具体的な実装は Infrastructure 層が提供します。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ConnectionId, MessagePushError, RoomEvent};

/// コネクションごとの送信チャンネル（エンコード済みのテキストフレーム）
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// ブロードキャストの結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    /// 送信に失敗した（切断済みの）コネクション。登録は解除済み
    pub failed: Vec<ConnectionId>,
}

#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// コネクションを登録
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// コネクションの登録を解除
    async fn unregister_client(&self, connection_id: &ConnectionId);

    /// 特定のコネクションへ送信
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        event: &RoomEvent,
    ) -> Result<(), MessagePushError>;

    /// 複数のコネクションへ送信
    ///
    /// 一部の送信失敗は許容し、残りのコネクションへの配信を続ける。
    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        event: &RoomEvent,
    ) -> Result<BroadcastReport, MessagePushError>;
}

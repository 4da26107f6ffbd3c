//! UseCase: チャット送信
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendChatMessageUseCase::execute() メソッド
//! - 本文の検証、送信者の確認、流量制限、ID の採番
//!
//! ### なぜこのテストが必要か
//! - 送信者を含む全員に同じメッセージが届くことを保証
//! - メッセージ ID が重複しないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：送信と配信
//! - 異常系：空の本文、長すぎる本文、Room にいない送信者、流量制限
//! - エッジケース：同じミリ秒内の連投

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use watchparty_shared::time::Clock;

use crate::domain::{
    ChatMessage, ChatText, ChatThrottle, MessagePusher, RoomCode, RoomEvent, RoomRepository,
    Timestamp, UserId, ValueObjectError,
};

use super::error::ChatError;

/// プロセス全体で単調増加するメッセージ番号
static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// チャット送信のユースケース
pub struct SendChatMessageUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    throttle: Arc<dyn ChatThrottle>,
    clock: Arc<dyn Clock>,
}

impl SendChatMessageUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        throttle: Arc<dyn ChatThrottle>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            throttle,
            clock,
        }
    }

    /// チャット送信を実行
    ///
    /// 送信者の名前は参加時に登録されたものを使う。
    ///
    /// # Returns
    ///
    /// * `Ok(ChatMessage)` - 配信したメッセージ
    /// * `Err(ChatError)` - 本文が不正、Room にいない、または流量制限
    pub async fn execute(
        &self,
        room_code: &RoomCode,
        sender_id: &UserId,
        text: String,
    ) -> Result<ChatMessage, ChatError> {
        let text = ChatText::new(text).map_err(|e| match e {
            ValueObjectError::ChatTextTooLong(len) => ChatError::MessageTooLong(len),
            _ => ChatError::EmptyMessage,
        })?;

        let sender = self
            .repository
            .find_participant(room_code, sender_id)
            .await
            .ok_or(ChatError::NotInRoom)?;

        if !self.throttle.try_acquire(room_code, sender_id).await {
            tracing::warn!(
                "Chat from '{}' in room '{}' was rate limited",
                sender_id,
                room_code
            );
            return Err(ChatError::RateLimited);
        }

        let timestamp = Timestamp::new(self.clock.now_millis());
        let sequence = NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let message = ChatMessage {
            id: format!("{}-{}-{}", timestamp.value(), sender_id, sequence),
            sender_id: sender.user_id,
            username: sender.username,
            display_name: sender.display_name,
            text,
            timestamp,
        };

        // 送信者を含む全員へ
        let targets = self
            .repository
            .participants(room_code)
            .await
            .into_iter()
            .map(|p| p.connection_id)
            .collect();
        let event = RoomEvent::Chat(message.clone());
        if let Err(e) = self.message_pusher.broadcast(targets, &event).await {
            tracing::warn!("Failed to broadcast chat in room '{}': {}", room_code, e);
        }

        tracing::debug!("Chat '{}' relayed in room '{}'", message.id, room_code);
        Ok(message)
    }
}

//! UseCase: 切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 切断が明示的な退出と同じ後処理になることを保証
//! - 参加していないコネクションの切断で何も起きないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加中のコネクションの切断
//! - エッジケース：join していないコネクション、再接続で置き換えられたコネクション

use std::sync::Arc;

use crate::domain::{BindingRepository, ConnectionId, MessagePusher, Participant, RoomRepository};

use super::departure::remove_and_announce;

/// 切断のユースケース
pub struct DisconnectParticipantUseCase {
    repository: Arc<dyn RoomRepository>,
    bindings: Arc<dyn BindingRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl DisconnectParticipantUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        bindings: Arc<dyn BindingRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            bindings,
            message_pusher,
        }
    }

    /// 切断を実行
    ///
    /// コネクションの登録を解除し、紐付いていた参加者がいれば退出させる。
    pub async fn execute(&self, connection_id: ConnectionId) -> Option<Participant> {
        self.message_pusher.unregister_client(&connection_id).await;

        let Some(binding) = self.bindings.get(&connection_id).await else {
            tracing::debug!("Connection '{}' closed without a room", connection_id);
            return None;
        };

        // 参加者を外してから紐付けを解除する
        let departure = remove_and_announce(
            self.repository.as_ref(),
            self.message_pusher.as_ref(),
            &binding.room_code,
            &binding.user_id,
            Some(connection_id),
        )
        .await;

        self.bindings.unbind_if(&connection_id, &binding).await;
        departure.map(|d| d.participant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        infrastructure::dto::websocket::ServerEvent,
        usecase::test_support::{Harness, participant_ids, room, user},
    };

    fn create_usecase(harness: &Harness) -> DisconnectParticipantUseCase {
        DisconnectParticipantUseCase::new(
            harness.repository.clone(),
            harness.bindings.clone(),
            harness.pusher.clone(),
        )
    }

    #[tokio::test]
    async fn test_disconnect_behaves_like_leave() {
        // テスト項目: 切断で user-left と participant-list が残りの参加者に届く
        // given (前提条件):
        let harness = Harness::new();
        let code = room("ABCD1234");
        let alice = harness.connect().await;
        let mut bob = harness.connect().await;
        harness.seat(&code, "u1", "u1", &alice).await;
        harness.seat(&code, "u2", "u1", &bob).await;

        // when (操作):
        let departed = create_usecase(&harness).execute(alice.id).await;

        // then (期待する結果):
        assert_eq!(departed.map(|p| p.user_id), Some(user("u1")));
        let events = bob.drain();
        assert!(matches!(events[0], ServerEvent::UserLeft { .. }));
        assert_eq!(participant_ids(&events[1]), vec!["u2".to_string()]);
        assert_eq!(harness.pusher.count_clients().await, 1);
    }

    #[tokio::test]
    async fn test_disconnect_last_participant_removes_room() {
        // テスト項目: 最後の参加者の切断で Room が削除される
        let harness = Harness::new();
        let code = room("ABCD1234");
        let alice = harness.connect().await;
        harness.seat(&code, "u1", "u1", &alice).await;

        create_usecase(&harness).execute(alice.id).await;

        assert!(harness.repository.get_room(&code).await.is_none());
    }

    #[tokio::test]
    async fn test_disconnect_without_join_is_noop() {
        // テスト項目: join していないコネクションの切断は何もしない
        let harness = Harness::new();
        let conn = harness.connect().await;

        let departed = create_usecase(&harness).execute(conn.id).await;

        assert!(departed.is_none());
        assert_eq!(harness.pusher.count_clients().await, 0);
    }
}

//! UseCase: Room の終了（end party）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - EndPartyUseCase::execute() / end_all() メソッド
//!
//! ### なぜこのテストが必要か
//! - 全員に ended が届き、Room と紐付けが消えることを保証
//! - 終了後の同じ room code への参加が空の Room から始まることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加者のいる Room の終了、サーバー停止時の全 Room の終了
//! - 異常系：存在しない Room

use std::sync::Arc;

use crate::domain::{
    Binding, BindingRepository, MessagePusher, RoomCode, RoomEvent, RoomRepository, RoomState,
};

use super::error::EndPartyError;

/// Room 終了のユースケース
pub struct EndPartyUseCase {
    repository: Arc<dyn RoomRepository>,
    bindings: Arc<dyn BindingRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl EndPartyUseCase {
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

    /// Room を終了し、終了時の Room を返す
    pub async fn execute(&self, room_code: &RoomCode) -> Result<RoomState, EndPartyError> {
        let room = self
            .repository
            .remove_room(room_code)
            .await
            .ok_or_else(|| EndPartyError::RoomNotFound(room_code.as_str().to_string()))?;

        for participant in room.participants.values() {
            self.bindings
                .unbind_if(
                    &participant.connection_id,
                    &Binding {
                        room_code: room_code.clone(),
                        user_id: participant.user_id.clone(),
                    },
                )
                .await;
        }

        match self
            .message_pusher
            .broadcast(room.connection_ids(), &RoomEvent::Ended)
            .await
        {
            Ok(report) => tracing::info!(
                "Room '{}' ended, {} participant(s) notified",
                room_code,
                report.delivered
            ),
            Err(e) => tracing::warn!("Failed to broadcast 'ended' in room '{}': {}", room_code, e),
        }

        Ok(room)
    }

    /// すべての Room を終了する（サーバー停止時）
    pub async fn end_all(&self) -> usize {
        let rooms = self.repository.list_rooms().await;
        let mut ended = 0;
        for room in rooms {
            if self.execute(&room.code).await.is_ok() {
                ended += 1;
            }
        }
        ended
    }
}

//! UseCase: Room からの退出
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - LeaveRoomUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 残りの参加者に user-left と participant-list が届くことを保証
//! - 最後の参加者の退出で Room がメモリから消えることを確認
//! - 冪等性（二重の退出、存在しない参加者）を確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加者が残る退出、最後の参加者の退出
//! - エッジケース：二重の退出、古いコネクションからの退出

use std::sync::Arc;

use crate::domain::{
    Binding, BindingRepository, ConnectionId, MessagePusher, Participant, RoomRepository,
};

use super::departure::remove_and_announce;

/// Room 退出のユースケース
pub struct LeaveRoomUseCase {
    repository: Arc<dyn RoomRepository>,
    bindings: Arc<dyn BindingRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl LeaveRoomUseCase {
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

    /// 退出を実行
    ///
    /// そのコネクションが運んでいる参加者を外してから、紐付けを解除する。
    /// 参加していなければ何もせず `None` を返す。
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        binding: &Binding,
    ) -> Option<Participant> {
        let departure = remove_and_announce(
            self.repository.as_ref(),
            self.message_pusher.as_ref(),
            &binding.room_code,
            &binding.user_id,
            Some(connection_id),
        )
        .await;

        self.bindings.unbind_if(&connection_id, binding).await;
        departure.map(|d| d.participant)
    }
}

//! UseCase: 参加者の kick
//!
//! 権限（ホストであること）の確認は呼び出し側（Gateway / API）で行います。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - KickParticipantUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 対象に kicked がちょうど 1 回届き、他の参加者に participant-list が届くことを保証
//! - 認証済みユーザーのみ退出が永続化されることを確認
//! - 永続化の失敗が kick 自体を失敗させないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：認証済みユーザー・ゲストの kick
//! - 異常系：存在しない参加者、Membership Persistence の障害

use std::sync::Arc;

use crate::domain::{
    Binding, BindingRepository, MembershipStore, MessagePusher, Participant, RoomCode, RoomEvent,
    RoomRepository, UserId,
};

use super::{departure::announce_departure, error::KickError};

/// kick のユースケース
pub struct KickParticipantUseCase {
    repository: Arc<dyn RoomRepository>,
    bindings: Arc<dyn BindingRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    membership_store: Arc<dyn MembershipStore>,
}

impl KickParticipantUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        bindings: Arc<dyn BindingRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        membership_store: Arc<dyn MembershipStore>,
    ) -> Self {
        Self {
            repository,
            bindings,
            message_pusher,
            membership_store,
        }
    }

    /// kick を実行
    ///
    /// # Returns
    ///
    /// * `Ok(Participant)` - 外した参加者
    /// * `Err(KickError)` - 対象が Room にいない
    pub async fn execute(
        &self,
        room_code: &RoomCode,
        target: &UserId,
    ) -> Result<Participant, KickError> {
        // 1. 無条件に外す
        let departure = self
            .repository
            .remove_participant(room_code, target, None)
            .await
            .ok_or_else(|| KickError::ParticipantNotFound(target.as_str().to_string()))?;
        let kicked = departure.participant.clone();

        // 2. 紐付けを解除し、終端通知を送る
        self.bindings
            .unbind_if(
                &kicked.connection_id,
                &Binding {
                    room_code: room_code.clone(),
                    user_id: target.clone(),
                },
            )
            .await;
        if let Err(e) = self
            .message_pusher
            .push_to(&kicked.connection_id, &RoomEvent::Kicked)
            .await
        {
            tracing::warn!("Failed to send 'kicked' to '{}': {}", target, e);
        }
        tracing::info!("Participant '{}' was kicked from room '{}'", target, room_code);

        // 3. 退出と同じ後処理
        announce_departure(
            self.repository.as_ref(),
            self.message_pusher.as_ref(),
            room_code,
            &departure,
        )
        .await;

        // 4. 認証済みユーザーの退出を永続化
        if !target.is_guest()
            && let Err(e) = self.membership_store.record_removal(room_code, target).await
        {
            tracing::warn!(
                "Failed to record removal of '{}' from room '{}': {}",
                target,
                room_code,
                e
            );
        }

        Ok(kicked)
    }
}

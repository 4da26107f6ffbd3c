//! UseCase: Room への参加
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinRoomUseCase::execute() メソッド
//! - Room Lookup による検証、ホストのサーバー側での決定、通知
//!
//! ### なぜこのテストが必要か
//! - 未知・無効な Room への参加で何も登録されないことを保証
//! - クライアントの申告ではなく Room Lookup のホストが採用されることを確認
//! - 再接続（同じ user_id）で参加者が重複しないことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：ホスト・ゲストの参加と user-joined / participant-list の配信
//! - 異常系：未知の Room、無効な Room、Room Lookup の障害
//! - エッジケース：再接続、別 Room への移動、再生状態が残っている Room への参加

use std::sync::Arc;

use watchparty_shared::time::Clock;

use crate::domain::{
    Binding, BindingRepository, ConnectionId, MessagePusher, Name, Participant, RoomCode,
    RoomEvent, RoomInfo, RoomLookup, RoomRepository, RoomState, Timestamp, UserId,
};

use super::{departure::remove_and_announce, error::JoinError};

/// 参加リクエスト
#[derive(Debug, Clone)]
pub struct JoinRequest {
    pub room_code: RoomCode,
    pub user_id: UserId,
    pub username: Name,
    pub display_name: Name,
    /// クライアントが申告したホストフラグ（参考値）
    pub claims_host: bool,
}

/// 参加の結果
#[derive(Debug, Clone, PartialEq)]
pub struct JoinOutcome {
    /// 参加直後の Room
    pub room: RoomState,
    /// 同じ user_id の既存エントリを置き換えたか
    pub was_replace: bool,
}

/// Room 参加のユースケース
pub struct JoinRoomUseCase {
    repository: Arc<dyn RoomRepository>,
    bindings: Arc<dyn BindingRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    room_lookup: Arc<dyn RoomLookup>,
    clock: Arc<dyn Clock>,
}

impl JoinRoomUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        bindings: Arc<dyn BindingRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        room_lookup: Arc<dyn RoomLookup>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            bindings,
            message_pusher,
            room_lookup,
            clock,
        }
    }

    /// 参加を実行
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 参加するコネクション
    /// * `request` - 参加リクエスト
    ///
    /// # Returns
    ///
    /// * `Ok(JoinOutcome)` - 参加成功
    /// * `Err(JoinError)` - Room が存在しない・無効、または Room Lookup の障害
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        request: JoinRequest,
    ) -> Result<JoinOutcome, JoinError> {
        // 1. Room Lookup で Room を検証し、ホストを決定
        let info = self.lookup_active_room(&request.room_code).await?;
        let is_host = info.host_id == request.user_id;
        if is_host != request.claims_host {
            tracing::warn!(
                "User '{}' claimed host={} for room '{}', but the room lookup says host={}",
                request.user_id,
                request.claims_host,
                request.room_code,
                is_host
            );
        }

        let binding = Binding {
            room_code: request.room_code.clone(),
            user_id: request.user_id.clone(),
        };

        // 2. このコネクションが別の (room, user) に紐付いていれば先に退出
        //    参加者を外してから紐付けを差し替える
        if let Some(previous) = self.bindings.get(&connection_id).await
            && previous != binding
        {
            remove_and_announce(
                self.repository.as_ref(),
                self.message_pusher.as_ref(),
                &previous.room_code,
                &previous.user_id,
                Some(connection_id),
            )
            .await;
        }

        // 3. 紐付けは参加者の追加より先に記録する（紐付けのない参加者を作らない）
        self.bindings.bind(connection_id, binding.clone()).await;

        // 4. 参加者を追加（同じ user_id は置き換え）。置き換えた古いコネクションの紐付けは解除する
        let now = Timestamp::new(self.clock.now_millis());
        let participant = Participant::new(
            request.user_id.clone(),
            request.username,
            request.display_name,
            is_host,
            now,
            connection_id,
        );
        let snapshot = self
            .repository
            .upsert_participant(&request.room_code, Some(info.host_id), participant.clone())
            .await;
        if let Some(replaced) = &snapshot.replaced
            && replaced.connection_id != connection_id
        {
            self.bindings
                .unbind_if(&replaced.connection_id, &binding)
                .await;
        }

        tracing::info!(
            "Participant '{}' joined room '{}' (host: {}, replaced: {})",
            participant.user_id,
            request.room_code,
            is_host,
            snapshot.replaced.is_some()
        );

        // 5. 通知
        self.announce_join(connection_id, &participant, &snapshot.room)
            .await;

        Ok(JoinOutcome {
            was_replace: snapshot.replaced.is_some(),
            room: snapshot.room,
        })
    }

    async fn lookup_active_room(&self, room_code: &RoomCode) -> Result<RoomInfo, JoinError> {
        match self.room_lookup.lookup(room_code).await {
            Ok(Some(info)) if info.active => Ok(info),
            Ok(_) => {
                tracing::warn!("Join rejected: room '{}' is unknown or inactive", room_code);
                Err(JoinError::RoomNotFound(room_code.as_str().to_string()))
            }
            Err(e) => {
                tracing::warn!("Join rejected: room lookup for '{}' failed: {}", room_code, e);
                Err(JoinError::LookupFailed(e.to_string()))
            }
        }
    }

    /// user-joined を他の参加者へ、participant-list を全員へ、
    /// 再生状態があれば参加者本人へ sync を送る
    async fn announce_join(
        &self,
        connection_id: ConnectionId,
        participant: &Participant,
        room: &RoomState,
    ) {
        let everyone = room.connection_ids();
        let others: Vec<ConnectionId> = everyone
            .iter()
            .copied()
            .filter(|id| *id != connection_id)
            .collect();

        let events = [
            (others, RoomEvent::user_joined(participant)),
            (
                everyone,
                RoomEvent::ParticipantList(room.participant_snapshot()),
            ),
        ];
        for (targets, event) in &events {
            if let Err(e) = self.message_pusher.broadcast(targets.clone(), event).await {
                tracing::warn!(
                    "Failed to broadcast '{}' in room '{}': {}",
                    event.name(),
                    room.code,
                    e
                );
            }
        }

        if let Some(playback) = room.playback {
            let now = Timestamp::new(self.clock.now_millis());
            let sync = RoomEvent::Sync {
                position: playback.position_at(now),
                is_playing: playback.is_playing,
            };
            if let Err(e) = self.message_pusher.push_to(&connection_id, &sync).await {
                tracing::warn!("Failed to send 'sync' to joiner '{}': {}", connection_id, e);
            }
        }
    }
}

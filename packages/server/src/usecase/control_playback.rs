//! UseCase: 再生操作（play / pause / seek / request-sync）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ControlPlaybackUseCase::execute() / request_sync() メソッド
//!
//! ### なぜこのテストが必要か
//! - ホスト以外の操作がブロードキャストされず、本人にだけ host-only が届くことを保証
//! - ホストの操作がホスト以外の全員に届き、ホストへは返らないことを確認
//! - 最後の再生状態が保持され、sync がそこから答えられることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：ホストの play / pause / seek、sync 要求
//! - 異常系：ゲストの操作、Room にいないユーザー
//! - エッジケース：範囲外の位置、再生状態がない Room での sync 要求

use std::sync::Arc;

use watchparty_shared::time::Clock;

use crate::domain::{
    ConnectionId, MessagePusher, PlaybackCommand, PlaybackPosition, PlaybackState, RoomCode,
    RoomEvent, RoomRepository, Timestamp, UserId,
};

use super::error::PlaybackError;

/// 再生操作のユースケース
pub struct ControlPlaybackUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl ControlPlaybackUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            clock,
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }

    /// 再生操作を実行
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 操作を送ってきたコネクション
    /// * `room_code` / `user_id` - コネクションの紐付け
    /// * `command` - play / pause / seek
    /// * `position` - 再生位置（範囲内に丸め済み）
    ///
    /// # Returns
    ///
    /// * `Ok(PlaybackState)` - 記録した再生状態
    /// * `Err(PlaybackError::NotHost)` - ホスト以外の操作（本人に host-only を送信済み）
    /// * `Err(PlaybackError::NotInRoom)` - Room に参加していない
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        room_code: &RoomCode,
        user_id: &UserId,
        command: PlaybackCommand,
        position: PlaybackPosition,
    ) -> Result<PlaybackState, PlaybackError> {
        self.repository
            .find_participant(room_code, user_id)
            .await
            .ok_or(PlaybackError::NotInRoom)?;

        // 1. ホストの確認
        if self.repository.host_id(room_code).await.as_ref() != Some(user_id) {
            tracing::warn!(
                "Rejected '{}' from non-host '{}' in room '{}'",
                command.as_str(),
                user_id,
                room_code
            );
            if let Err(e) = self
                .message_pusher
                .push_to(&connection_id, &RoomEvent::host_only(command))
                .await
            {
                tracing::warn!("Failed to send 'host-only' to '{}': {}", user_id, e);
            }
            return Err(PlaybackError::NotHost);
        }

        // 2. 再生状態を記録
        let previous = self.repository.playback(room_code).await;
        let state = PlaybackState::apply(previous.as_ref(), command, position, self.now());
        self.repository
            .record_playback(room_code, state)
            .await
            .map_err(|_| PlaybackError::NotInRoom)?;

        // 3. ホスト以外へブロードキャスト
        let targets: Vec<ConnectionId> = self
            .repository
            .participants(room_code)
            .await
            .into_iter()
            .map(|p| p.connection_id)
            .filter(|id| *id != connection_id)
            .collect();
        let event = RoomEvent::Playback { command, position };
        if let Err(e) = self.message_pusher.broadcast(targets, &event).await {
            tracing::warn!(
                "Failed to broadcast '{}' in room '{}': {}",
                event.name(),
                room_code,
                e
            );
        }

        tracing::debug!(
            "Host '{}' sent '{}' at {:.3}s in room '{}'",
            user_id,
            command.as_str(),
            position.seconds(),
            room_code
        );
        Ok(state)
    }

    /// 保持している再生状態から sync を Room 全体へ送る
    ///
    /// 再生中であれば最後の操作からの経過時間分だけ位置を進める。
    /// 再生状態がなければ先頭・停止中として答える。
    pub async fn request_sync(
        &self,
        room_code: &RoomCode,
        user_id: &UserId,
    ) -> Result<(PlaybackPosition, bool), PlaybackError> {
        self.repository
            .find_participant(room_code, user_id)
            .await
            .ok_or(PlaybackError::NotInRoom)?;

        let now = self.now();
        let (position, is_playing) = match self.repository.playback(room_code).await {
            Some(state) => (state.position_at(now), state.is_playing),
            None => (PlaybackPosition::zero(), false),
        };

        let targets: Vec<ConnectionId> = self
            .repository
            .participants(room_code)
            .await
            .into_iter()
            .map(|p| p.connection_id)
            .collect();
        let event = RoomEvent::Sync {
            position,
            is_playing,
        };
        if let Err(e) = self.message_pusher.broadcast(targets, &event).await {
            tracing::warn!("Failed to broadcast 'sync' in room '{}': {}", room_code, e);
        }

        Ok((position, is_playing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        infrastructure::dto::websocket::ServerEvent,
        usecase::test_support::{Harness, NOW, TestConnection, room, user},
    };

    fn create_usecase(harness: &Harness) -> ControlPlaybackUseCase {
        ControlPlaybackUseCase::new(
            harness.repository.clone(),
            harness.pusher.clone(),
            harness.clock.clone(),
        )
    }

    /// ホスト u1 とゲスト u2 のいる Room
    async fn seated_room(harness: &Harness) -> (RoomCode, TestConnection, TestConnection) {
        let code = room("ABCD1234");
        let alice = harness.connect().await;
        let bob = harness.connect().await;
        harness.seat(&code, "u1", "u1", &alice).await;
        harness.seat(&code, "u2", "u1", &bob).await;
        (code, alice, bob)
    }

    #[tokio::test]
    async fn test_non_host_command_is_rejected() {
        // テスト項目: ゲストの pause は本人に host-only が 1 回だけ届き、ホストには何も届かない
        // given (前提条件):
        let harness = Harness::new();
        let (code, mut alice, mut bob) = seated_room(&harness).await;

        // when (操作):
        let result = create_usecase(&harness)
            .execute(
                bob.id,
                &code,
                &user("u2"),
                PlaybackCommand::Pause,
                PlaybackPosition::new(42.0),
            )
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(PlaybackError::NotHost));
        assert_eq!(
            bob.drain(),
            vec![ServerEvent::HostOnly {
                message: "Only the host can pause the video".to_string(),
            }]
        );
        assert!(alice.drain().is_empty());
        assert!(harness.repository.playback(&code).await.is_none());
    }

    #[tokio::test]
    async fn test_host_command_is_broadcast_to_others() {
        // テスト項目: ホストの pause はゲストに届き、ホストには返らない
        // given (前提条件):
        let harness = Harness::new();
        let (code, mut alice, mut bob) = seated_room(&harness).await;

        // when (操作):
        let state = create_usecase(&harness)
            .execute(
                alice.id,
                &code,
                &user("u1"),
                PlaybackCommand::Pause,
                PlaybackPosition::new(42.0),
            )
            .await
            .unwrap();

        // then (期待する結果):
        assert!(!state.is_playing);
        assert_eq!(bob.drain(), vec![ServerEvent::Pause { timestamp: 42.0 }]);
        assert!(alice.drain().is_empty());
        assert_eq!(harness.repository.playback(&code).await, Some(state));
    }

    #[tokio::test]
    async fn test_seek_keeps_play_state() {
        // テスト項目: seek は再生中かどうかを変えない
        let harness = Harness::new();
        let (code, alice, _bob) = seated_room(&harness).await;
        let usecase = create_usecase(&harness);

        usecase
            .execute(
                alice.id,
                &code,
                &user("u1"),
                PlaybackCommand::Play,
                PlaybackPosition::new(5.0),
            )
            .await
            .unwrap();
        let state = usecase
            .execute(
                alice.id,
                &code,
                &user("u1"),
                PlaybackCommand::Seek,
                PlaybackPosition::new(120.0),
            )
            .await
            .unwrap();

        assert!(state.is_playing);
        assert_eq!(state.position, PlaybackPosition::new(120.0));
    }

    #[tokio::test]
    async fn test_negative_position_is_clamped() {
        // テスト項目: 負の位置は 0 に丸めて配信される
        let harness = Harness::new();
        let (code, alice, mut bob) = seated_room(&harness).await;

        create_usecase(&harness)
            .execute(
                alice.id,
                &code,
                &user("u1"),
                PlaybackCommand::Seek,
                PlaybackPosition::new(-3.0),
            )
            .await
            .unwrap();

        assert_eq!(bob.drain(), vec![ServerEvent::Seek { timestamp: 0.0 }]);
    }

    #[tokio::test]
    async fn test_command_from_outsider() {
        // テスト項目: Room にいないユーザーの操作は NotInRoom
        let harness = Harness::new();
        let (code, _alice, _bob) = seated_room(&harness).await;
        let outsider = harness.connect().await;

        let result = create_usecase(&harness)
            .execute(
                outsider.id,
                &code,
                &user("u9"),
                PlaybackCommand::Play,
                PlaybackPosition::zero(),
            )
            .await;

        assert_eq!(result, Err(PlaybackError::NotInRoom));
    }

    #[tokio::test]
    async fn test_request_sync_extrapolates_while_playing() {
        // テスト項目: 再生中の sync は経過時間分だけ進めた位置で Room 全員に届く
        // given (前提条件): 2.5 秒前に 40 秒の位置から再生開始
        let harness = Harness::new();
        let (code, mut alice, mut bob) = seated_room(&harness).await;
        harness
            .repository
            .record_playback(
                &code,
                PlaybackState {
                    is_playing: true,
                    position: PlaybackPosition::new(40.0),
                    updated_at: Timestamp::new(NOW - 2500),
                },
            )
            .await
            .unwrap();

        // when (操作):
        let answer = create_usecase(&harness)
            .request_sync(&code, &user("u2"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(answer, (PlaybackPosition::new(42.5), true));
        let expected = ServerEvent::Sync {
            timestamp: 42.5,
            is_playing: true,
        };
        assert_eq!(alice.drain(), vec![expected.clone()]);
        assert_eq!(bob.drain(), vec![expected]);
    }

    #[tokio::test]
    async fn test_request_sync_without_state() {
        // テスト項目: 再生状態がなければ先頭・停止中で答える
        let harness = Harness::new();
        let (code, _alice, mut bob) = seated_room(&harness).await;

        create_usecase(&harness)
            .request_sync(&code, &user("u2"))
            .await
            .unwrap();

        assert_eq!(
            bob.drain(),
            vec![ServerEvent::Sync {
                timestamp: 0.0,
                is_playing: false,
            }]
        );
    }
}

//! Connection Gateway
//!
//! 物理的なコネクションと (room, user) の紐付けを管理し、
//! 受信したイベントを各ユースケースへ振り分けます。
//!
//! - join 以外のイベントは payload ではなく、コネクションの紐付けから
//!   room と user を決める（payload の room code が食い違う場合はログに残して無視）
//! - kick-participant / end-party はホストのみ
//! - コネクションの終了時は disconnect

use std::sync::Arc;

use watchparty_shared::time::Clock;

use crate::{
    domain::{
        Binding, BindingRepository, ChatThrottle, ConnectionId, MembershipStore, MessagePusher,
        Name, PlaybackCommand, PlaybackPosition, PusherChannel, RoomCode, RoomEvent, RoomLookup,
        RoomRepository, UserId, ValueObjectError,
    },
    infrastructure::dto::websocket::ClientEvent,
    usecase::{
        ControlPlaybackUseCase, DisconnectParticipantUseCase, EndPartyUseCase, JoinRequest,
        JoinRoomUseCase, KickParticipantUseCase, LeaveRoomUseCase, PlaybackError,
        SendChatMessageUseCase,
    },
};

pub struct Gateway {
    repository: Arc<dyn RoomRepository>,
    bindings: Arc<dyn BindingRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    join_room: JoinRoomUseCase,
    leave_room: LeaveRoomUseCase,
    disconnect_participant: DisconnectParticipantUseCase,
    kick_participant: KickParticipantUseCase,
    control_playback: ControlPlaybackUseCase,
    send_chat_message: SendChatMessageUseCase,
    end_party: Arc<EndPartyUseCase>,
}

impl Gateway {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        bindings: Arc<dyn BindingRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        room_lookup: Arc<dyn RoomLookup>,
        membership_store: Arc<dyn MembershipStore>,
        throttle: Arc<dyn ChatThrottle>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            join_room: JoinRoomUseCase::new(
                repository.clone(),
                bindings.clone(),
                message_pusher.clone(),
                room_lookup,
                clock.clone(),
            ),
            leave_room: LeaveRoomUseCase::new(
                repository.clone(),
                bindings.clone(),
                message_pusher.clone(),
            ),
            disconnect_participant: DisconnectParticipantUseCase::new(
                repository.clone(),
                bindings.clone(),
                message_pusher.clone(),
            ),
            kick_participant: KickParticipantUseCase::new(
                repository.clone(),
                bindings.clone(),
                message_pusher.clone(),
                membership_store,
            ),
            control_playback: ControlPlaybackUseCase::new(
                repository.clone(),
                message_pusher.clone(),
                clock.clone(),
            ),
            send_chat_message: SendChatMessageUseCase::new(
                repository.clone(),
                message_pusher.clone(),
                throttle,
                clock,
            ),
            end_party: Arc::new(EndPartyUseCase::new(
                repository.clone(),
                bindings.clone(),
                message_pusher.clone(),
            )),
            repository,
            bindings,
            message_pusher,
        }
    }

    /// HTTP API・シャットダウン処理と共有する EndPartyUseCase
    pub fn end_party_usecase(&self) -> Arc<EndPartyUseCase> {
        self.end_party.clone()
    }

    /// 新しいコネクションを登録
    pub async fn connect(&self, connection_id: ConnectionId, sender: PusherChannel) {
        self.message_pusher
            .register_client(connection_id, sender)
            .await;
        tracing::info!("Connection '{}' opened", connection_id);
    }

    /// コネクションの終了
    pub async fn disconnect(&self, connection_id: ConnectionId) {
        match self.disconnect_participant.execute(connection_id).await {
            Some(participant) => tracing::info!(
                "Connection '{}' closed, participant '{}' removed",
                connection_id,
                participant.user_id
            ),
            None => tracing::info!("Connection '{}' closed", connection_id),
        }
    }

    /// 受信したテキストフレームを処理
    pub async fn handle_text(&self, connection_id: ConnectionId, text: &str) {
        match serde_json::from_str::<ClientEvent>(text) {
            Ok(event) => self.dispatch(connection_id, event).await,
            Err(e) => {
                tracing::warn!("Invalid event from '{}': {}", connection_id, e);
                self.notify_error(connection_id, format!("Invalid event: {e}"))
                    .await;
            }
        }
    }

    /// イベントを各ユースケースへ振り分ける
    pub async fn dispatch(&self, connection_id: ConnectionId, event: ClientEvent) {
        match event {
            ClientEvent::Join {
                room_code,
                user_id,
                username,
                display_name,
                is_host,
            } => {
                let request = join_request(room_code, user_id, username, display_name, is_host);
                self.handle_join(connection_id, request).await
            }
            ClientEvent::Leave { room_code, user_id } => {
                let Some(binding) = self.require_binding(connection_id, &room_code).await else {
                    return;
                };
                warn_on_user_mismatch(connection_id, &binding, user_id.as_deref());
                self.leave_room.execute(connection_id, &binding).await;
            }
            ClientEvent::Play {
                room_code,
                timestamp,
                user_id,
            } => {
                self.handle_playback(
                    connection_id,
                    &room_code,
                    user_id.as_deref(),
                    PlaybackCommand::Play,
                    timestamp,
                )
                .await
            }
            ClientEvent::Pause {
                room_code,
                timestamp,
                user_id,
            } => {
                self.handle_playback(
                    connection_id,
                    &room_code,
                    user_id.as_deref(),
                    PlaybackCommand::Pause,
                    timestamp,
                )
                .await
            }
            ClientEvent::Seek {
                room_code,
                timestamp,
                user_id,
            } => {
                self.handle_playback(
                    connection_id,
                    &room_code,
                    user_id.as_deref(),
                    PlaybackCommand::Seek,
                    timestamp,
                )
                .await
            }
            ClientEvent::RequestSync { room_code } => {
                let Some(binding) = self.require_binding(connection_id, &room_code).await else {
                    return;
                };
                if let Err(e) = self
                    .control_playback
                    .request_sync(&binding.room_code, &binding.user_id)
                    .await
                {
                    self.notify_error(connection_id, e.to_string()).await;
                }
            }
            ClientEvent::ChatMessage {
                room_code,
                message,
                user_id,
                ..
            } => {
                let Some(binding) = self.require_binding(connection_id, &room_code).await else {
                    return;
                };
                warn_on_user_mismatch(connection_id, &binding, user_id.as_deref());
                if let Err(e) = self
                    .send_chat_message
                    .execute(&binding.room_code, &binding.user_id, message)
                    .await
                {
                    self.notify_error(connection_id, e.to_string()).await;
                }
            }
            ClientEvent::KickParticipant { room_code, user_id } => {
                let Some(binding) = self
                    .require_host(connection_id, &room_code, "kick participants")
                    .await
                else {
                    return;
                };
                let target = match UserId::new(user_id) {
                    Ok(target) => target,
                    Err(e) => {
                        self.notify_error(connection_id, e.to_string()).await;
                        return;
                    }
                };
                if let Err(e) = self
                    .kick_participant
                    .execute(&binding.room_code, &target)
                    .await
                {
                    self.notify_error(connection_id, e.to_string()).await;
                }
            }
            ClientEvent::EndParty { room_code } => {
                let Some(binding) = self
                    .require_host(connection_id, &room_code, "end the party")
                    .await
                else {
                    return;
                };
                if let Err(e) = self.end_party.execute(&binding.room_code).await {
                    self.notify_error(connection_id, e.to_string()).await;
                }
            }
        }
    }

    async fn handle_join(
        &self,
        connection_id: ConnectionId,
        request: Result<JoinRequest, ValueObjectError>,
    ) {
        let request = match request {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!("Invalid join from '{}': {}", connection_id, e);
                self.notify_error(connection_id, e.to_string()).await;
                return;
            }
        };

        if let Err(e) = self.join_room.execute(connection_id, request).await {
            self.notify_error(connection_id, e.to_string()).await;
        }
    }

    async fn handle_playback(
        &self,
        connection_id: ConnectionId,
        room_code: &str,
        user_id: Option<&str>,
        command: PlaybackCommand,
        timestamp: f64,
    ) {
        let Some(binding) = self.require_binding(connection_id, room_code).await else {
            return;
        };
        warn_on_user_mismatch(connection_id, &binding, user_id);

        let result = self
            .control_playback
            .execute(
                connection_id,
                &binding.room_code,
                &binding.user_id,
                command,
                PlaybackPosition::new(timestamp),
            )
            .await;
        match result {
            // host-only は送信済み
            Ok(_) | Err(PlaybackError::NotHost) => {}
            Err(e) => self.notify_error(connection_id, e.to_string()).await,
        }
    }

    /// コネクションの紐付けを取得する。未参加なら error を返して `None`
    async fn require_binding(
        &self,
        connection_id: ConnectionId,
        payload_room_code: &str,
    ) -> Option<Binding> {
        let Some(binding) = self.bindings.get(&connection_id).await else {
            tracing::warn!("Event from '{}' before joining a room", connection_id);
            self.notify_error(connection_id, "Join a room first").await;
            return None;
        };
        if RoomCode::new(payload_room_code.to_string()).as_ref() != Ok(&binding.room_code) {
            tracing::warn!(
                "Connection '{}' sent room code '{}' but is bound to '{}', using the binding",
                connection_id,
                payload_room_code,
                binding.room_code
            );
        }
        Some(binding)
    }

    /// 紐付けを取得し、ホストであることを確認する
    async fn require_host(
        &self,
        connection_id: ConnectionId,
        payload_room_code: &str,
        action: &str,
    ) -> Option<Binding> {
        let binding = self
            .require_binding(connection_id, payload_room_code)
            .await?;
        if self.repository.host_id(&binding.room_code).await.as_ref() == Some(&binding.user_id) {
            return Some(binding);
        }

        tracing::warn!(
            "Non-host '{}' tried to {} in room '{}'",
            binding.user_id,
            action,
            binding.room_code
        );
        let event = RoomEvent::HostOnly {
            message: format!("Only the host can {action}"),
        };
        if let Err(e) = self.message_pusher.push_to(&connection_id, &event).await {
            tracing::warn!("Failed to send 'host-only' to '{}': {}", connection_id, e);
        }
        None
    }

    async fn notify_error(&self, connection_id: ConnectionId, message: impl Into<String>) {
        if let Err(e) = self
            .message_pusher
            .push_to(&connection_id, &RoomEvent::error(message))
            .await
        {
            tracing::warn!("Failed to send 'error' to '{}': {}", connection_id, e);
        }
    }
}

fn join_request(
    room_code: String,
    user_id: String,
    username: String,
    display_name: String,
    claims_host: bool,
) -> Result<JoinRequest, ValueObjectError> {
    Ok(JoinRequest {
        room_code: RoomCode::new(room_code)?,
        user_id: UserId::new(user_id)?,
        username: Name::new(username)?,
        display_name: Name::new(display_name)?,
        claims_host,
    })
}

fn warn_on_user_mismatch(connection_id: ConnectionId, binding: &Binding, user_id: Option<&str>) {
    if let Some(user_id) = user_id
        && user_id != binding.user_id.as_str()
    {
        tracing::warn!(
            "Connection '{}' sent user id '{}' but is bound to '{}', using the binding",
            connection_id,
            user_id,
            binding.user_id
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        infrastructure::{dto::websocket::ServerEvent, rate_limit::ChatRateLimiter},
        usecase::test_support::{Harness, TestConnection, participant_ids, room},
    };

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - JSON のイベントから各ユースケースまでの振り分け
    // - 紐付けによる room / user の決定、ホスト権限の確認
    // - 代表的なシナリオ（ホストとゲストの参加、再生操作、チャット、切断）
    // ========================================

    fn create_gateway(harness: &Harness) -> Gateway {
        Gateway::new(
            harness.repository.clone(),
            harness.bindings.clone(),
            harness.pusher.clone(),
            harness.directory.clone(),
            harness.directory.clone(),
            Arc::new(ChatRateLimiter::new(5, 1.0, harness.clock.clone())),
            harness.clock.clone(),
        )
    }

    async fn join(gateway: &Gateway, conn: &TestConnection, user: &str, name: &str, host: bool) {
        let frame = format!(
            r#"{{"type":"join","roomCode":"ABCD1234","userId":"{user}","username":"{name}","displayName":"{name}","isHost":{host}}}"#
        );
        gateway.handle_text(conn.id, &frame).await;
    }

    /// alice (u1, ホスト) と bob (u2) が参加済みの状態
    async fn alice_and_bob(
        harness: &Harness,
        gateway: &Gateway,
    ) -> (TestConnection, TestConnection) {
        harness.register_room("ABCD1234", "u1").await;
        let mut alice = harness.connect().await;
        let mut bob = harness.connect().await;
        join(gateway, &alice, "u1", "alice", true).await;
        join(gateway, &bob, "u2", "bob", false).await;
        alice.drain();
        bob.drain();
        (alice, bob)
    }

    #[tokio::test]
    async fn test_scenario_host_and_guest_join() {
        // テスト項目: ホスト・ゲストの参加で participant-list と user-joined が届く
        // given (前提条件):
        let harness = Harness::new();
        let gateway = create_gateway(&harness);
        harness.register_room("ABCD1234", "u1").await;
        let mut alice = harness.connect().await;
        let mut bob = harness.connect().await;

        // when (操作): alice が参加
        join(&gateway, &alice, "u1", "alice", true).await;

        // then (期待する結果):
        let events = alice.drain();
        assert_eq!(participant_ids(&events[0]), vec!["u1".to_string()]);

        // when (操作): bob が参加
        join(&gateway, &bob, "u2", "bob", false).await;

        // then (期待する結果):
        let alice_events = alice.drain();
        assert_eq!(
            alice_events[0],
            ServerEvent::UserJoined {
                user_id: "u2".to_string(),
                username: "bob".to_string(),
                display_name: "bob".to_string(),
            }
        );
        assert_eq!(participant_ids(&alice_events[1]).len(), 2);
        assert_eq!(participant_ids(&bob.drain()[0]).len(), 2);
    }

    #[tokio::test]
    async fn test_scenario_guest_pause_is_host_only() {
        // テスト項目: ゲストの pause は本人に host-only、ホストには何も届かない
        let harness = Harness::new();
        let gateway = create_gateway(&harness);
        let (mut alice, mut bob) = alice_and_bob(&harness, &gateway).await;

        gateway
            .handle_text(
                bob.id,
                r#"{"type":"pause","roomCode":"ABCD1234","timestamp":42.0,"userId":"u2"}"#,
            )
            .await;

        assert!(matches!(
            bob.drain().as_slice(),
            [ServerEvent::HostOnly { .. }]
        ));
        assert!(alice.drain().is_empty());
    }

    #[tokio::test]
    async fn test_scenario_host_pause_reaches_guest() {
        // テスト項目: ホストの pause はゲストに届き、ホストには返らない
        let harness = Harness::new();
        let gateway = create_gateway(&harness);
        let (mut alice, mut bob) = alice_and_bob(&harness, &gateway).await;

        gateway
            .handle_text(
                alice.id,
                r#"{"type":"pause","roomCode":"ABCD1234","timestamp":42.0,"userId":"u1"}"#,
            )
            .await;

        assert_eq!(bob.drain(), vec![ServerEvent::Pause { timestamp: 42.0 }]);
        assert!(alice.drain().is_empty());
    }

    #[tokio::test]
    async fn test_scenario_chat_reaches_everyone() {
        // テスト項目: チャットが送信者を含む全員に同じ内容で届く
        let harness = Harness::new();
        let gateway = create_gateway(&harness);
        let (mut alice, mut bob) = alice_and_bob(&harness, &gateway).await;

        gateway
            .handle_text(
                bob.id,
                r#"{"type":"chat-message","roomCode":"ABCD1234","message":"hi"}"#,
            )
            .await;

        let alice_events = alice.drain();
        assert_eq!(alice_events, bob.drain());
        assert!(matches!(
            alice_events.as_slice(),
            [ServerEvent::ChatMessage { message, .. }] if message == "hi"
        ));
    }

    #[tokio::test]
    async fn test_scenario_disconnects() {
        // テスト項目: ホストの切断で bob に user-left と 1 人の participant-list、
        //             bob の切断で Room が削除される
        // given (前提条件):
        let harness = Harness::new();
        let gateway = create_gateway(&harness);
        let (alice, mut bob) = alice_and_bob(&harness, &gateway).await;

        // when (操作):
        gateway.disconnect(alice.id).await;

        // then (期待する結果):
        let events = bob.drain();
        assert_eq!(
            events[0],
            ServerEvent::UserLeft {
                user_id: "u1".to_string(),
                username: "alice".to_string(),
            }
        );
        assert_eq!(participant_ids(&events[1]), vec!["u2".to_string()]);
        assert!(harness.repository.get_room(&room("ABCD1234")).await.is_some());

        // when (操作):
        gateway.disconnect(bob.id).await;

        // then (期待する結果):
        assert!(harness.repository.get_room(&room("ABCD1234")).await.is_none());
    }

    #[tokio::test]
    async fn test_binding_overrides_payload_identity() {
        // テスト項目: payload の userId を偽っても紐付けのユーザーとして扱われる
        let harness = Harness::new();
        let gateway = create_gateway(&harness);
        let (mut alice, mut bob) = alice_and_bob(&harness, &gateway).await;

        // bob がホストになりすまして play を送る
        gateway
            .handle_text(
                bob.id,
                r#"{"type":"play","roomCode":"ABCD1234","timestamp":1.0,"userId":"u1"}"#,
            )
            .await;

        assert!(matches!(
            bob.drain().as_slice(),
            [ServerEvent::HostOnly { .. }]
        ));
        assert!(alice.drain().is_empty());
    }

    #[tokio::test]
    async fn test_unbound_connection_gets_error() {
        // テスト項目: join 前のイベントには error が返る
        let harness = Harness::new();
        let gateway = create_gateway(&harness);
        let mut conn = harness.connect().await;

        gateway
            .handle_text(
                conn.id,
                r#"{"type":"play","roomCode":"ABCD1234","timestamp":1.0}"#,
            )
            .await;

        assert_eq!(
            conn.drain(),
            vec![ServerEvent::Error {
                message: "Join a room first".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_malformed_frames_get_error() {
        // テスト項目: 不正な JSON・不正な room code には error が返る
        let harness = Harness::new();
        let gateway = create_gateway(&harness);
        let mut conn = harness.connect().await;

        gateway.handle_text(conn.id, "not json").await;
        gateway
            .handle_text(
                conn.id,
                r#"{"type":"join","roomCode":"bad","userId":"u1","username":"a","displayName":"a"}"#,
            )
            .await;

        let events = conn.drain();
        assert_eq!(events.len(), 2);
        assert!(
            events
                .iter()
                .all(|event| matches!(event, ServerEvent::Error { .. }))
        );
        assert!(harness.repository.list_rooms().await.is_empty());
    }

    #[tokio::test]
    async fn test_join_unknown_room_gets_error() {
        // テスト項目: 未知の Room への参加には error が返り、何も登録されない
        let harness = Harness::new();
        let gateway = create_gateway(&harness);
        let mut conn = harness.connect().await;

        join(&gateway, &conn, "u1", "alice", true).await;

        assert!(matches!(
            conn.drain().as_slice(),
            [ServerEvent::Error { .. }]
        ));
        assert!(harness.repository.list_rooms().await.is_empty());
    }

    #[tokio::test]
    async fn test_kick_requires_host() {
        // テスト項目: ホスト以外の kick は host-only、ホストの kick は対象に kicked が届く
        // given (前提条件):
        let harness = Harness::new();
        let gateway = create_gateway(&harness);
        let (mut alice, mut bob) = alice_and_bob(&harness, &gateway).await;
        let kick_alice = r#"{"type":"kick-participant","roomCode":"ABCD1234","userId":"u1"}"#;
        let kick_bob = r#"{"type":"kick-participant","roomCode":"ABCD1234","userId":"u2"}"#;

        // when (操作): bob がホストを kick しようとする
        gateway.handle_text(bob.id, kick_alice).await;

        // then (期待する結果):
        assert_eq!(
            bob.drain(),
            vec![ServerEvent::HostOnly {
                message: "Only the host can kick participants".to_string(),
            }]
        );
        assert!(alice.drain().is_empty());

        // when (操作): alice が bob を kick
        gateway.handle_text(alice.id, kick_bob).await;

        // then (期待する結果):
        assert_eq!(bob.drain(), vec![ServerEvent::Kicked]);
        let alice_events = alice.drain();
        assert_eq!(participant_ids(&alice_events[1]), vec!["u1".to_string()]);

        // kick 後の bob のイベントは未参加として扱われる
        gateway
            .handle_text(
                bob.id,
                r#"{"type":"chat-message","roomCode":"ABCD1234","message":"hey"}"#,
            )
            .await;
        assert!(matches!(
            bob.drain().as_slice(),
            [ServerEvent::Error { .. }]
        ));
    }

    #[tokio::test]
    async fn test_end_party_by_host() {
        // テスト項目: ホストの end-party で全員に ended が届き Room が消える
        let harness = Harness::new();
        let gateway = create_gateway(&harness);
        let (mut alice, mut bob) = alice_and_bob(&harness, &gateway).await;

        gateway
            .handle_text(bob.id, r#"{"type":"end-party","roomCode":"ABCD1234"}"#)
            .await;
        assert!(matches!(
            bob.drain().as_slice(),
            [ServerEvent::HostOnly { .. }]
        ));

        gateway
            .handle_text(alice.id, r#"{"type":"end-party","roomCode":"ABCD1234"}"#)
            .await;

        assert_eq!(alice.drain(), vec![ServerEvent::Ended]);
        assert_eq!(bob.drain(), vec![ServerEvent::Ended]);
        assert!(harness.repository.get_room(&room("ABCD1234")).await.is_none());
    }

    #[tokio::test]
    async fn test_explicit_leave() {
        // テスト項目: leave で退出し、残りの参加者に通知される
        let harness = Harness::new();
        let gateway = create_gateway(&harness);
        let (mut alice, bob) = alice_and_bob(&harness, &gateway).await;

        gateway
            .handle_text(
                bob.id,
                r#"{"type":"leave","roomCode":"ABCD1234","userId":"u2"}"#,
            )
            .await;

        let events = alice.drain();
        assert!(matches!(events[0], ServerEvent::UserLeft { .. }));
        assert_eq!(participant_ids(&events[1]), vec!["u1".to_string()]);
        assert!(harness.bindings.get(&bob.id).await.is_none());
    }

    #[tokio::test]
    async fn test_request_sync_after_host_play() {
        // テスト項目: ホストの play 後の sync 要求に保持した状態で答える
        let harness = Harness::new();
        let gateway = create_gateway(&harness);
        let (mut alice, mut bob) = alice_and_bob(&harness, &gateway).await;
        gateway
            .handle_text(
                alice.id,
                r#"{"type":"play","roomCode":"ABCD1234","timestamp":42.0}"#,
            )
            .await;
        bob.drain();

        gateway
            .handle_text(bob.id, r#"{"type":"request-sync","roomCode":"ABCD1234"}"#)
            .await;

        let expected = ServerEvent::Sync {
            timestamp: 42.0,
            is_playing: true,
        };
        assert_eq!(bob.drain(), vec![expected.clone()]);
        assert_eq!(alice.drain(), vec![expected]);
    }
}

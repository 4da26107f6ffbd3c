//! UseCase テスト用の共通部品
//!
//! 実際のインメモリ実装と WebSocketMessagePusher を組み合わせ、
//! コネクションごとの受信チャンネルから push されたイベントを読み出します。

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::sync::mpsc;
use watchparty_shared::time::FixedClock;

use crate::{
    domain::{
        Binding, BindingRepository, ConnectionId, MessagePusher, Name, Participant,
        RoomCode, RoomRepository, Timestamp, UserId,
    },
    infrastructure::{
        directory::InMemoryRoomDirectory,
        dto::websocket::ServerEvent,
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryBindingRepository, InMemoryRoomRepository},
    },
};

pub const NOW: i64 = 1_700_000_000_000;

pub struct Harness {
    pub clock: Arc<FixedClock>,
    pub repository: Arc<InMemoryRoomRepository>,
    pub bindings: Arc<InMemoryBindingRepository>,
    pub pusher: Arc<WebSocketMessagePusher>,
    pub directory: Arc<InMemoryRoomDirectory>,
}

/// テスト用のコネクション
pub struct TestConnection {
    pub id: ConnectionId,
    pub rx: mpsc::UnboundedReceiver<String>,
}

impl TestConnection {
    /// これまでに push されたイベントをすべて取り出す
    pub fn drain(&mut self) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(raw) = self.rx.try_recv() {
            events.push(serde_json::from_str(&raw).unwrap());
        }
        events
    }
}

impl Harness {
    pub fn new() -> Self {
        Self::with_clock(NOW)
    }

    pub fn with_clock(now: i64) -> Self {
        let clock = Arc::new(FixedClock::new(now));
        Self {
            repository: Arc::new(InMemoryRoomRepository::new(clock.clone())),
            clock,
            bindings: Arc::new(InMemoryBindingRepository::new()),
            pusher: Arc::new(WebSocketMessagePusher::new()),
            directory: Arc::new(InMemoryRoomDirectory::new()),
        }
    }

    /// 有効な Room を directory に登録
    pub async fn register_room(&self, code: &str, host: &str) -> RoomCode {
        let room_code = room(code);
        self.directory.register(room_code.clone(), user(host)).await;
        room_code
    }

    /// 新しいコネクションを pusher に登録
    pub async fn connect(&self) -> TestConnection {
        let id = ConnectionId::generate();
        let (tx, rx) = mpsc::unbounded_channel();
        self.pusher.register_client(id, tx).await;
        TestConnection { id, rx }
    }

    /// UseCase を通さずに参加者を Room に置く
    pub async fn seat(&self, code: &RoomCode, user_id: &str, host: &str, conn: &TestConnection) {
        let participant = Participant::new(
            user(user_id),
            name(user_id),
            name(user_id),
            user_id == host,
            Timestamp::new(NOW),
            conn.id,
        );
        self.repository
            .upsert_participant(code, Some(user(host)), participant)
            .await;
        self.bindings
            .bind(
                conn.id,
                Binding {
                    room_code: code.clone(),
                    user_id: user(user_id),
                },
            )
            .await;
    }
}

/// 書き込みの途中で待たされる紐付けテーブル
///
/// タスクが `.await` の途中で abort された場合の後処理を確認するために使う。
/// `bind` は書き込みの前に、`unbind_if` は書き込みの後に待つ。
pub struct SlowBindingRepository {
    inner: Arc<InMemoryBindingRepository>,
    bind_delay: Duration,
    unbind_delay: Duration,
}

impl SlowBindingRepository {
    pub fn new(inner: Arc<InMemoryBindingRepository>) -> Self {
        Self {
            inner,
            bind_delay: Duration::ZERO,
            unbind_delay: Duration::ZERO,
        }
    }

    pub fn with_bind_delay(mut self, delay: Duration) -> Self {
        self.bind_delay = delay;
        self
    }

    pub fn with_unbind_delay(mut self, delay: Duration) -> Self {
        self.unbind_delay = delay;
        self
    }
}

#[async_trait]
impl BindingRepository for SlowBindingRepository {
    async fn bind(&self, connection_id: ConnectionId, binding: Binding) -> Option<Binding> {
        tokio::time::sleep(self.bind_delay).await;
        self.inner.bind(connection_id, binding).await
    }

    async fn get(&self, connection_id: &ConnectionId) -> Option<Binding> {
        self.inner.get(connection_id).await
    }

    async fn unbind_if(&self, connection_id: &ConnectionId, binding: &Binding) -> bool {
        let unbound = self.inner.unbind_if(connection_id, binding).await;
        tokio::time::sleep(self.unbind_delay).await;
        unbound
    }
}

pub fn room(code: &str) -> RoomCode {
    RoomCode::new(code.to_string()).unwrap()
}

pub fn user(id: &str) -> UserId {
    UserId::new(id.to_string()).unwrap()
}

pub fn name(value: &str) -> Name {
    Name::new(value.to_string()).unwrap()
}

/// participant-list イベントに含まれる user_id
pub fn participant_ids(event: &ServerEvent) -> Vec<String> {
    match event {
        ServerEvent::ParticipantList { participants } => {
            participants.iter().map(|p| p.user_id.clone()).collect()
        }
        other => panic!("expected participant-list, got {other:?}"),
    }
}

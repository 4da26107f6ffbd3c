//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! room code → Room の HashMap を 1 つの Mutex で保護します（粗粒度ロック）。
//! 参加・退出とブロードキャスト用スナップショットの取得は同じロックの中で行います。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;
use watchparty_shared::time::Clock;

use crate::domain::{
    ConnectionId, Departure, JoinSnapshot, Participant, PlaybackState, RepositoryError, RoomCode,
    RoomRepository, RoomState, Timestamp, UserId,
};

/// インメモリ Room Repository 実装
pub struct InMemoryRoomRepository {
    rooms: Mutex<HashMap<RoomCode, RoomState>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryRoomRepository {
    /// 新しい InMemoryRoomRepository を作成
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            clock,
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn get_or_create(&self, room_code: &RoomCode) -> RoomState {
        let now = self.now();
        let mut rooms = self.rooms.lock().await;
        rooms
            .entry(room_code.clone())
            .or_insert_with(|| {
                tracing::info!("Room '{}' created", room_code);
                RoomState::new(room_code.clone(), now)
            })
            .clone()
    }

    async fn get_room(&self, room_code: &RoomCode) -> Option<RoomState> {
        let rooms = self.rooms.lock().await;
        rooms.get(room_code).cloned()
    }

    async fn list_rooms(&self) -> Vec<RoomState> {
        let rooms = self.rooms.lock().await;
        let mut list: Vec<RoomState> = rooms.values().cloned().collect();
        list.sort_by(|a, b| a.code.cmp(&b.code));
        list
    }

    async fn upsert_participant(
        &self,
        room_code: &RoomCode,
        host_id: Option<UserId>,
        participant: Participant,
    ) -> JoinSnapshot {
        let now = self.now();
        let mut rooms = self.rooms.lock().await;
        let room = rooms.entry(room_code.clone()).or_insert_with(|| {
            tracing::info!("Room '{}' created", room_code);
            RoomState::new(room_code.clone(), now)
        });
        if host_id.is_some() {
            room.host_id = host_id;
        }
        let replaced = room
            .participants
            .insert(participant.user_id.clone(), participant);

        JoinSnapshot {
            room: room.clone(),
            replaced,
        }
    }

    async fn remove_participant(
        &self,
        room_code: &RoomCode,
        user_id: &UserId,
        expected_connection: Option<ConnectionId>,
    ) -> Option<Departure> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(room_code)?;

        if let Some(expected) = expected_connection {
            let current = room.participants.get(user_id)?;
            if current.connection_id != expected {
                tracing::debug!(
                    "Participant '{}' in room '{}' is carried by another connection, skipping removal",
                    user_id,
                    room_code
                );
                return None;
            }
        }

        let participant = room.participants.remove(user_id)?;
        Some(Departure {
            participant,
            remaining: room.participant_snapshot(),
        })
    }

    async fn find_participant(
        &self,
        room_code: &RoomCode,
        user_id: &UserId,
    ) -> Option<Participant> {
        let rooms = self.rooms.lock().await;
        rooms
            .get(room_code)
            .and_then(|room| room.participants.get(user_id).cloned())
    }

    async fn participants(&self, room_code: &RoomCode) -> Vec<Participant> {
        let rooms = self.rooms.lock().await;
        rooms
            .get(room_code)
            .map(RoomState::participant_snapshot)
            .unwrap_or_default()
    }

    async fn host_id(&self, room_code: &RoomCode) -> Option<UserId> {
        let rooms = self.rooms.lock().await;
        rooms.get(room_code).and_then(|room| room.host_id.clone())
    }

    async fn remove_if_empty(&self, room_code: &RoomCode) -> bool {
        let mut rooms = self.rooms.lock().await;
        if rooms.get(room_code).is_some_and(RoomState::is_empty) {
            rooms.remove(room_code);
            tracing::info!("Room '{}' is empty and has been removed", room_code);
            true
        } else {
            false
        }
    }

    async fn remove_room(&self, room_code: &RoomCode) -> Option<RoomState> {
        let mut rooms = self.rooms.lock().await;
        rooms.remove(room_code)
    }

    async fn record_playback(
        &self,
        room_code: &RoomCode,
        state: PlaybackState,
    ) -> Result<(), RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms
            .get_mut(room_code)
            .ok_or_else(|| RepositoryError::RoomNotFound(room_code.as_str().to_string()))?;
        room.playback = Some(state);
        Ok(())
    }

    async fn playback(&self, room_code: &RoomCode) -> Option<PlaybackState> {
        let rooms = self.rooms.lock().await;
        rooms.get(room_code).and_then(|room| room.playback)
    }
}

//! インメモリの Room directory
//!
//! プラットフォーム本体を持たない構成（開発・テスト・単体運用）向け。
//! Room は `--room CODE:HOST_ID` または `POST /api/rooms` で登録します。

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    DirectoryError, MembershipStore, RoomCode, RoomCodeFactory, RoomInfo, RoomLookup, UserId,
};

#[derive(Default)]
pub struct InMemoryRoomDirectory {
    rooms: Mutex<HashMap<RoomCode, RoomInfo>>,
    /// Room ごとの退出済みユーザー。Room の無効化で破棄する
    removals: Mutex<HashMap<RoomCode, HashSet<UserId>>>,
}

impl InMemoryRoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定した room code で有効な Room を登録（既存なら上書き）
    pub async fn register(&self, room_code: RoomCode, host_id: UserId) {
        let mut rooms = self.rooms.lock().await;
        tracing::info!("Room '{}' registered with host '{}'", room_code, host_id);
        rooms.insert(
            room_code,
            RoomInfo {
                active: true,
                host_id,
            },
        );
    }

    /// 新しい room code を払い出して Room を登録
    pub async fn create(&self, host_id: UserId) -> RoomCode {
        let mut rooms = self.rooms.lock().await;
        let room_code = loop {
            let candidate = RoomCodeFactory::generate();
            if !rooms.contains_key(&candidate) {
                break candidate;
            }
        };
        tracing::info!("Room '{}' created for host '{}'", room_code, host_id);
        rooms.insert(
            room_code.clone(),
            RoomInfo {
                active: true,
                host_id,
            },
        );
        room_code
    }

    /// Room を無効化し、その Room の退出記録を破棄する。登録されていなければ `false`
    pub async fn deactivate(&self, room_code: &RoomCode) -> bool {
        let deactivated = {
            let mut rooms = self.rooms.lock().await;
            match rooms.get_mut(room_code) {
                Some(info) => {
                    info.active = false;
                    true
                }
                None => false,
            }
        };
        self.removals.lock().await.remove(room_code);
        deactivated
    }

    /// Room から退出させられたユーザー（user_id 順）
    pub async fn removed_users(&self, room_code: &RoomCode) -> Vec<UserId> {
        let removals = self.removals.lock().await;
        let mut users: Vec<UserId> = removals
            .get(room_code)
            .map(|users| users.iter().cloned().collect())
            .unwrap_or_default();
        users.sort();
        users
    }
}

#[async_trait]
impl RoomLookup for InMemoryRoomDirectory {
    async fn lookup(&self, room_code: &RoomCode) -> Result<Option<RoomInfo>, DirectoryError> {
        let rooms = self.rooms.lock().await;
        Ok(rooms.get(room_code).cloned())
    }
}

#[async_trait]
impl MembershipStore for InMemoryRoomDirectory {
    async fn record_removal(
        &self,
        room_code: &RoomCode,
        user_id: &UserId,
    ) -> Result<(), DirectoryError> {
        let mut removals = self.removals.lock().await;
        removals
            .entry(room_code.clone())
            .or_default()
            .insert(user_id.clone());
        Ok(())
    }
}

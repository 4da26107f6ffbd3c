//! チャット送信の流量制限のインターフェース

use async_trait::async_trait;

use super::{RoomCode, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatThrottle: Send + Sync {
    /// (room, user) の送信枠を 1 つ消費する。枠がなければ `false`
    async fn try_acquire(&self, room_code: &RoomCode, user_id: &UserId) -> bool;
}

//! 外部コラボレーター（永続化を持つ側）のインターフェース
//!
//! - Room Lookup: room code の存在・有効性・ホストを問い合わせる
//! - Membership Persistence: 認証済みユーザーの退出（kick）を永続化する

use async_trait::async_trait;

use super::{DirectoryError, RoomCode, RoomInfo, UserId};

/// Room Lookup
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomLookup: Send + Sync {
    /// Room を問い合わせる。未知の Room は `Ok(None)`
    async fn lookup(&self, room_code: &RoomCode) -> Result<Option<RoomInfo>, DirectoryError>;
}

/// Membership Persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// 参加者の退出を記録する
    async fn record_removal(
        &self,
        room_code: &RoomCode,
        user_id: &UserId,
    ) -> Result<(), DirectoryError>;
}

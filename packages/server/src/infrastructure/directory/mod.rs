//! Room directory adapters
//!
//! Room Lookup / Membership Persistence の実装。
//!
//! - `memory`: 起動時の設定や HTTP API で登録された Room を保持する実装
//! - `http`: 動画プラットフォーム本体の API に問い合わせる実装

pub mod http;
pub mod memory;

use std::sync::Arc;

pub use http::HttpRoomDirectory;
pub use memory::InMemoryRoomDirectory;

use crate::domain::{MembershipStore, RoomLookup};

/// 起動時に選択された Room directory
#[derive(Clone)]
pub enum RoomDirectory {
    InMemory(Arc<InMemoryRoomDirectory>),
    Http(Arc<HttpRoomDirectory>),
}

impl RoomDirectory {
    pub fn room_lookup(&self) -> Arc<dyn RoomLookup> {
        match self {
            Self::InMemory(directory) => directory.clone(),
            Self::Http(directory) => directory.clone(),
        }
    }

    pub fn membership_store(&self) -> Arc<dyn MembershipStore> {
        match self {
            Self::InMemory(directory) => directory.clone(),
            Self::Http(directory) => directory.clone(),
        }
    }

    /// Room の登録ができる directory（インメモリの場合のみ）
    pub fn in_memory(&self) -> Option<&Arc<InMemoryRoomDirectory>> {
        match self {
            Self::InMemory(directory) => Some(directory),
            Self::Http(_) => None,
        }
    }
}

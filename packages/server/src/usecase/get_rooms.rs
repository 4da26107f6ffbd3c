//! UseCase: Room 一覧の取得

use std::sync::Arc;

use crate::domain::{RoomRepository, RoomState};

/// Room 一覧取得のユースケース
pub struct GetRoomsUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl GetRoomsUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// メモリ上の Room 一覧（room code 順）
    pub async fn execute(&self) -> Vec<RoomState> {
        self.repository.list_rooms().await
    }
}

//! UseCase: Room 詳細の取得

use std::sync::Arc;

use crate::domain::{RoomCode, RoomRepository, RoomState};

use super::error::GetRoomDetailError;

/// Room 詳細取得のユースケース
pub struct GetRoomDetailUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl GetRoomDetailUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self, room_code: &RoomCode) -> Result<RoomState, GetRoomDetailError> {
        self.repository
            .get_room(room_code)
            .await
            .ok_or_else(|| GetRoomDetailError::RoomNotFound(room_code.as_str().to_string()))
    }
}

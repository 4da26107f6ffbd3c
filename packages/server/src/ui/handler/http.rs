//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::{RoomCode, UserId},
    infrastructure::dto::http::{
        CreateRoomRequest, CreateRoomResponse, RoomDetailDto, RoomSummaryDto,
    },
    ui::state::AppState,
    usecase::{EndPartyError, GetRoomDetailError},
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get list of live rooms
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummaryDto>> {
    let rooms = state.get_rooms_usecase.execute().await;

    // Domain Model から DTO への変換
    Json(rooms.iter().map(RoomSummaryDto::from).collect())
}

/// Get live room detail by code
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_code): Path<String>,
) -> Result<Json<RoomDetailDto>, StatusCode> {
    let room_code = RoomCode::new(room_code).map_err(|_| StatusCode::BAD_REQUEST)?;
    match state.get_room_detail_usecase.execute(&room_code).await {
        Ok(room) => Ok(Json(RoomDetailDto::from(&room))),
        Err(GetRoomDetailError::RoomNotFound(_)) => Err(StatusCode::NOT_FOUND),
    }
}

/// Register a new room in the in-memory directory
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<CreateRoomResponse>), StatusCode> {
    let Some(directory) = state.room_directory.in_memory() else {
        return Err(StatusCode::NOT_IMPLEMENTED);
    };
    let host_id = UserId::new(request.host_id).map_err(|_| StatusCode::BAD_REQUEST)?;

    let room_code = directory.create(host_id).await;
    Ok((
        StatusCode::CREATED,
        Json(CreateRoomResponse {
            room_code: room_code.into_string(),
        }),
    ))
}

/// End a live room: every participant receives `ended`
///
/// With the in-memory directory the room code is also deactivated.
pub async fn end_room(
    State(state): State<Arc<AppState>>,
    Path(room_code): Path<String>,
) -> StatusCode {
    let Ok(room_code) = RoomCode::new(room_code) else {
        return StatusCode::BAD_REQUEST;
    };
    match state.end_party_usecase.execute(&room_code).await {
        Ok(_) => {
            if let Some(directory) = state.room_directory.in_memory() {
                directory.deactivate(&room_code).await;
            }
            StatusCode::NO_CONTENT
        }
        Err(EndPartyError::RoomNotFound(_)) => StatusCode::NOT_FOUND,
    }
}

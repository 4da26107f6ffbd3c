//! HTTP API request/response DTOs.

use serde::{Deserialize, Serialize};

/// Live room summary (`GET /api/rooms`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummaryDto {
    pub room_code: String,
    pub host_id: Option<String>,
    pub participants: Vec<String>,
    /// RFC 3339
    pub created_at: String,
}

/// Live room detail (`GET /api/rooms/{room_code}`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetailDto {
    pub room_code: String,
    pub host_id: Option<String>,
    pub participants: Vec<ParticipantDetailDto>,
    pub playback: Option<PlaybackDto>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDetailDto {
    pub user_id: String,
    pub username: String,
    pub display_name: String,
    pub is_host: bool,
    pub joined_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackDto {
    pub is_playing: bool,
    pub position: f64,
    pub updated_at: String,
}

/// `POST /api/rooms`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub host_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomResponse {
    pub room_code: String,
}

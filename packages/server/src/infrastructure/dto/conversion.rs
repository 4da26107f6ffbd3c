//! Conversion logic between DTOs and domain entities.

use watchparty_shared::time::timestamp_to_rfc3339;

use crate::domain::{Participant, PlaybackCommand, PlaybackState, RoomEvent, RoomState};
use crate::infrastructure::dto::{http, websocket as dto};

// ========================================
// Domain → WebSocket DTO
// ========================================

impl From<&Participant> for dto::ParticipantInfo {
    fn from(model: &Participant) -> Self {
        Self {
            user_id: model.user_id.as_str().to_string(),
            username: model.username.as_str().to_string(),
            display_name: model.display_name.as_str().to_string(),
            is_host: model.is_host,
            joined_at: model.joined_at.value(),
        }
    }
}

impl From<&RoomEvent> for dto::ServerEvent {
    fn from(event: &RoomEvent) -> Self {
        match event {
            RoomEvent::UserJoined {
                user_id,
                username,
                display_name,
            } => Self::UserJoined {
                user_id: user_id.as_str().to_string(),
                username: username.as_str().to_string(),
                display_name: display_name.as_str().to_string(),
            },
            RoomEvent::UserLeft { user_id, username } => Self::UserLeft {
                user_id: user_id.as_str().to_string(),
                username: username.as_str().to_string(),
            },
            RoomEvent::ParticipantList(participants) => Self::ParticipantList {
                participants: participants.iter().map(Into::into).collect(),
            },
            RoomEvent::Playback { command, position } => {
                let timestamp = position.seconds();
                match command {
                    PlaybackCommand::Play => Self::Play { timestamp },
                    PlaybackCommand::Pause => Self::Pause { timestamp },
                    PlaybackCommand::Seek => Self::Seek { timestamp },
                }
            }
            RoomEvent::Sync {
                position,
                is_playing,
            } => Self::Sync {
                timestamp: position.seconds(),
                is_playing: *is_playing,
            },
            RoomEvent::HostOnly { message } => Self::HostOnly {
                message: message.clone(),
            },
            RoomEvent::Chat(message) => Self::ChatMessage {
                id: message.id.clone(),
                user_id: message.sender_id.as_str().to_string(),
                username: message.username.as_str().to_string(),
                display_name: message.display_name.as_str().to_string(),
                message: message.text.as_str().to_string(),
                timestamp: message.timestamp.value(),
            },
            RoomEvent::Kicked => Self::Kicked,
            RoomEvent::Ended => Self::Ended,
            RoomEvent::Error { message } => Self::Error {
                message: message.clone(),
            },
        }
    }
}

// ========================================
// Domain → HTTP DTO
// ========================================

impl From<&RoomState> for http::RoomSummaryDto {
    fn from(room: &RoomState) -> Self {
        Self {
            room_code: room.code.as_str().to_string(),
            host_id: room.host_id.as_ref().map(|id| id.as_str().to_string()),
            participants: room
                .participant_snapshot()
                .iter()
                .map(|p| p.user_id.as_str().to_string())
                .collect(),
            created_at: timestamp_to_rfc3339(room.created_at.value()),
        }
    }
}

impl From<&PlaybackState> for http::PlaybackDto {
    fn from(state: &PlaybackState) -> Self {
        Self {
            is_playing: state.is_playing,
            position: state.position.seconds(),
            updated_at: timestamp_to_rfc3339(state.updated_at.value()),
        }
    }
}

impl From<&RoomState> for http::RoomDetailDto {
    fn from(room: &RoomState) -> Self {
        Self {
            room_code: room.code.as_str().to_string(),
            host_id: room.host_id.as_ref().map(|id| id.as_str().to_string()),
            participants: room
                .participant_snapshot()
                .iter()
                .map(|p| http::ParticipantDetailDto {
                    user_id: p.user_id.as_str().to_string(),
                    username: p.username.as_str().to_string(),
                    display_name: p.display_name.as_str().to_string(),
                    is_host: p.is_host,
                    joined_at: timestamp_to_rfc3339(p.joined_at.value()),
                })
                .collect(),
            playback: room.playback.as_ref().map(Into::into),
            created_at: timestamp_to_rfc3339(room.created_at.value()),
        }
    }
}

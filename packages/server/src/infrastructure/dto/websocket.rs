//! WebSocket event DTOs.
//!
//! Every frame is a JSON object tagged by `"type"` (kebab-case) with
//! camelCase fields, e.g. `{"type":"play","roomCode":"ABCD1234","timestamp":42.0}`.

use serde::{Deserialize, Serialize};

/// Client → Server events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    Join {
        room_code: String,
        user_id: String,
        username: String,
        display_name: String,
        /// Advisory only: the server derives host identity from the room lookup
        #[serde(default)]
        is_host: bool,
    },
    Leave {
        room_code: String,
        #[serde(default)]
        user_id: Option<String>,
    },
    Play {
        room_code: String,
        timestamp: f64,
        #[serde(default)]
        user_id: Option<String>,
    },
    Pause {
        room_code: String,
        timestamp: f64,
        #[serde(default)]
        user_id: Option<String>,
    },
    Seek {
        room_code: String,
        timestamp: f64,
        #[serde(default)]
        user_id: Option<String>,
    },
    RequestSync {
        room_code: String,
    },
    ChatMessage {
        room_code: String,
        message: String,
        #[serde(default)]
        user_id: Option<String>,
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        display_name: Option<String>,
    },
    KickParticipant {
        room_code: String,
        user_id: String,
    },
    EndParty {
        room_code: String,
    },
}

/// Participant entry of a `participant-list` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantInfo {
    pub user_id: String,
    pub username: String,
    pub display_name: String,
    pub is_host: bool,
    /// Unix timestamp (milliseconds)
    pub joined_at: i64,
}

/// Server → Client events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    UserJoined {
        user_id: String,
        username: String,
        display_name: String,
    },
    UserLeft {
        user_id: String,
        username: String,
    },
    ParticipantList {
        participants: Vec<ParticipantInfo>,
    },
    Play {
        timestamp: f64,
    },
    Pause {
        timestamp: f64,
    },
    Seek {
        timestamp: f64,
    },
    Sync {
        timestamp: f64,
        is_playing: bool,
    },
    HostOnly {
        message: String,
    },
    ChatMessage {
        id: String,
        user_id: String,
        username: String,
        display_name: String,
        message: String,
        /// Server timestamp (Unix milliseconds)
        timestamp: i64,
    },
    Kicked,
    Ended,
    Error {
        message: String,
    },
}

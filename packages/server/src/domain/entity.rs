//! Entity 定義

use std::collections::HashMap;

use serde::Serialize;

use super::value_object::{
    ChatText, ConnectionId, Name, PlaybackPosition, RoomCode, Timestamp, UserId,
};

/// Room の参加者
///
/// (room, user_id) ごとに 1 件。現在この参加者を運んでいるコネクションも保持する。
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub user_id: UserId,
    pub username: Name,
    pub display_name: Name,
    pub is_host: bool,
    pub joined_at: Timestamp,
    pub connection_id: ConnectionId,
}

impl Participant {
    pub fn new(
        user_id: UserId,
        username: Name,
        display_name: Name,
        is_host: bool,
        joined_at: Timestamp,
        connection_id: ConnectionId,
    ) -> Self {
        Self {
            user_id,
            username,
            display_name,
            is_host,
            joined_at,
            connection_id,
        }
    }
}

/// ホストによる再生操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackCommand {
    Play,
    Pause,
    Seek,
}

impl PlaybackCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Play => "play",
            Self::Pause => "pause",
            Self::Seek => "seek",
        }
    }
}

/// ホストが最後に報告した再生状態
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub position: PlaybackPosition,
    pub updated_at: Timestamp,
}

impl PlaybackState {
    /// 再生操作を適用した次の状態
    ///
    /// Seek は再生中かどうかを維持する。
    pub fn apply(
        previous: Option<&PlaybackState>,
        command: PlaybackCommand,
        position: PlaybackPosition,
        now: Timestamp,
    ) -> Self {
        let is_playing = match command {
            PlaybackCommand::Play => true,
            PlaybackCommand::Pause => false,
            PlaybackCommand::Seek => previous.is_some_and(|p| p.is_playing),
        };
        Self {
            is_playing,
            position,
            updated_at: now,
        }
    }

    /// `now` 時点の推定再生位置
    ///
    /// 再生中であれば最後の報告からの経過時間分だけ進める。
    pub fn position_at(&self, now: Timestamp) -> PlaybackPosition {
        if self.is_playing {
            self.position
                .advanced_by_millis(now.value() - self.updated_at.value())
        } else {
            self.position
        }
    }
}

/// メモリ上の Room
#[derive(Debug, Clone, PartialEq)]
pub struct RoomState {
    pub code: RoomCode,
    /// サーバー側で Room Lookup から決定したホスト
    pub host_id: Option<UserId>,
    pub active: bool,
    pub participants: HashMap<UserId, Participant>,
    pub playback: Option<PlaybackState>,
    pub created_at: Timestamp,
}

impl RoomState {
    pub fn new(code: RoomCode, created_at: Timestamp) -> Self {
        Self {
            code,
            host_id: None,
            active: true,
            participants: HashMap::new(),
            playback: None,
            created_at,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn is_host(&self, user_id: &UserId) -> bool {
        self.host_id.as_ref() == Some(user_id)
    }

    /// 参加者一覧のスナップショット（参加時刻 → user_id 順）
    pub fn participant_snapshot(&self) -> Vec<Participant> {
        let mut participants: Vec<Participant> = self.participants.values().cloned().collect();
        participants.sort_by(|a, b| {
            a.joined_at
                .cmp(&b.joined_at)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        participants
    }

    /// 全参加者のコネクション
    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.participants
            .values()
            .map(|p| p.connection_id)
            .collect()
    }
}

/// チャットメッセージ（保存はしない）
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub sender_id: UserId,
    pub username: Name,
    pub display_name: Name,
    pub text: ChatText,
    pub timestamp: Timestamp,
}

/// コネクションと (room, user) の紐付け
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub room_code: RoomCode,
    pub user_id: UserId,
}

/// Room Lookup の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub active: bool,
    pub host_id: UserId,
}

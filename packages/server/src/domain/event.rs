//! クライアントへ通知するドメインイベント
//!
//! UseCase 層はこの型で通知内容を表現し、ワイヤーフォーマットへの変換は
//! Infrastructure 層（MessagePusher 実装）が担当する。

use super::{
    entity::{ChatMessage, Participant, PlaybackCommand},
    value_object::{Name, PlaybackPosition, UserId},
};

/// Room の参加者へ push するイベント
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    UserJoined {
        user_id: UserId,
        username: Name,
        display_name: Name,
    },
    UserLeft {
        user_id: UserId,
        username: Name,
    },
    ParticipantList(Vec<Participant>),
    Playback {
        command: PlaybackCommand,
        position: PlaybackPosition,
    },
    Sync {
        position: PlaybackPosition,
        is_playing: bool,
    },
    HostOnly {
        message: String,
    },
    Chat(ChatMessage),
    /// 退出させられたコネクションへの終端通知
    Kicked,
    /// Room 終了の終端通知
    Ended,
    Error {
        message: String,
    },
}

impl RoomEvent {
    /// ホスト以外の再生操作に対する通知
    pub fn host_only(command: PlaybackCommand) -> Self {
        Self::HostOnly {
            message: format!("Only the host can {} the video", command.as_str()),
        }
    }

    pub fn user_joined(participant: &Participant) -> Self {
        Self::UserJoined {
            user_id: participant.user_id.clone(),
            username: participant.username.clone(),
            display_name: participant.display_name.clone(),
        }
    }

    pub fn user_left(participant: &Participant) -> Self {
        Self::UserLeft {
            user_id: participant.user_id.clone(),
            username: participant.username.clone(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// ログ用のイベント名
    pub fn name(&self) -> &'static str {
        match self {
            Self::UserJoined { .. } => "user-joined",
            Self::UserLeft { .. } => "user-left",
            Self::ParticipantList(_) => "participant-list",
            Self::Playback { command, .. } => command.as_str(),
            Self::Sync { .. } => "sync",
            Self::HostOnly { .. } => "host-only",
            Self::Chat(_) => "chat-message",
            Self::Kicked => "kicked",
            Self::Ended => "ended",
            Self::Error { .. } => "error",
        }
    }
}

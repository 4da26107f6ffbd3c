//! UseCase 層のエラー型

use thiserror::Error;

/// 参加のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("Room '{0}' does not exist or is not active")]
    RoomNotFound(String),

    #[error("Room lookup failed: {0}")]
    LookupFailed(String),
}

/// 再生操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("Only the host can control playback")]
    NotHost,

    #[error("Not a participant of the room")]
    NotInRoom,
}

/// チャット送信のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("Message must not be empty")]
    EmptyMessage,

    #[error("Message is too long ({0} characters)")]
    MessageTooLong(usize),

    #[error("Not a participant of the room")]
    NotInRoom,

    #[error("Too many messages, slow down")]
    RateLimited,
}

/// kick のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KickError {
    #[error("Participant '{0}' is not in the room")]
    ParticipantNotFound(String),
}

/// Room 終了のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndPartyError {
    #[error("Room '{0}' is not live")]
    RoomNotFound(String),
}

/// Room 詳細取得のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomDetailError {
    #[error("Room '{0}' is not live")]
    RoomNotFound(String),
}

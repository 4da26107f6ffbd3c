//! ドメイン層のエラー定義

use thiserror::Error;

/// Value Object の生成失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("Invalid room code: '{0}' (expected 8 alphanumeric characters)")]
    InvalidRoomCode(String),

    #[error("Invalid user id: '{0}'")]
    InvalidUserId(String),

    #[error("Invalid name: '{0}'")]
    InvalidName(String),

    #[error("Message must not be empty")]
    EmptyChatText,

    #[error("Message is too long ({0} characters)")]
    ChatTextTooLong(usize),
}

/// Repository 操作の失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("Room '{0}' not found")]
    RoomNotFound(String),
}

/// MessagePusher 操作の失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("Connection '{0}' not found")]
    ConnectionNotFound(String),

    #[error("Failed to push message: {0}")]
    PushFailed(String),

    #[error("Failed to encode message: {0}")]
    EncodeFailed(String),
}

/// 外部コラボレーター（Room Lookup / Membership Persistence）呼び出しの失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("Room directory unavailable: {0}")]
    Unavailable(String),

    #[error("Unexpected room directory response: {0}")]
    InvalidResponse(String),
}

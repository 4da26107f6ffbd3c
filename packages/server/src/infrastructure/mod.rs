//! Infrastructure layer: domain trait の具体的な実装とワイヤーフォーマット

pub mod directory;
pub mod dto;
pub mod message_pusher;
pub mod rate_limit;
pub mod repository;

//! Server configuration.
//!
//! The binary fills a [`ServerConfig`] from its command line (or the matching
//! `WATCHPARTY_*` environment variables) and validates it before startup.

use thiserror::Error;

use crate::domain::{RoomCode, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid room seed '{0}', expected CODE:HOST_ID")]
    InvalidRoomSeed(String),

    #[error("{0} must be > 0")]
    NotPositive(&'static str),

    #[error("Room lookup URL must start with http:// or https://: '{0}'")]
    InvalidLookupUrl(String),

    #[error("--room seeds cannot be combined with --room-lookup-url")]
    SeedsWithLookupUrl,
}

/// A room registered in the in-memory directory at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSeed {
    pub room_code: RoomCode,
    pub host_id: UserId,
}

impl std::str::FromStr for RoomSeed {
    type Err = ConfigError;

    /// Parses `CODE:HOST_ID`
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidRoomSeed(value.to_string());
        let (code, host) = value.split_once(':').ok_or_else(invalid)?;
        Ok(Self {
            room_code: RoomCode::new(code.to_string()).map_err(|_| invalid())?,
            host_id: UserId::new(host.to_string()).map_err(|_| invalid())?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Platform API base URL; the in-memory directory is used when absent
    pub room_lookup_url: Option<String>,
    pub seed_rooms: Vec<RoomSeed>,
    /// Chat messages a participant may send in a burst
    pub chat_burst: u32,
    /// Chat tokens refilled per second
    pub chat_per_sec: f64,
    pub ping_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            room_lookup_url: None,
            seed_rooms: Vec::new(),
            chat_burst: 5,
            chat_per_sec: 1.0,
            ping_interval_secs: 30,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chat_burst == 0 {
            return Err(ConfigError::NotPositive("chat_burst"));
        }
        if self.chat_per_sec.is_nan() || self.chat_per_sec <= 0.0 {
            return Err(ConfigError::NotPositive("chat_per_sec"));
        }
        if self.ping_interval_secs == 0 {
            return Err(ConfigError::NotPositive("ping_interval_secs"));
        }
        if let Some(url) = &self.room_lookup_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidLookupUrl(url.clone()));
            }
            if !self.seed_rooms.is_empty() {
                return Err(ConfigError::SeedsWithLookupUrl);
            }
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

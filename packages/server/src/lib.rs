//! Watch-party coordination server library.
//!
//! Keeps the people in a room watching the same video at the same moment:
//! room presence, host-driven playback synchronization and chat over WebSocket.

pub mod config;

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

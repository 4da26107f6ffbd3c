//! Watch-party server: HTTP / WebSocket entry points.

pub mod gateway;
mod handler;
mod server;
mod signal;
pub mod state;

pub use gateway::Gateway;
pub use server::{Server, build_app};

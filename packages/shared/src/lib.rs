//! Utilities shared by the watchparty packages.

pub mod logger;
pub mod time;

//! インメモリ実装

pub mod binding;
pub mod room;

pub use binding::InMemoryBindingRepository;
pub use room::InMemoryRoomRepository;

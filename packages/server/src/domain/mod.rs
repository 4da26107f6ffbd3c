//! Domain layer: value objects, entities, events and the interfaces the
//! use cases depend on.

pub mod directory;
pub mod entity;
pub mod error;
pub mod event;
pub mod pusher;
pub mod repository;
pub mod throttle;
pub mod value_object;

pub use directory::{MembershipStore, RoomLookup};
pub use entity::{
    Binding, ChatMessage, Participant, PlaybackCommand, PlaybackState, RoomInfo, RoomState,
};
pub use error::{DirectoryError, MessagePushError, RepositoryError, ValueObjectError};
pub use event::RoomEvent;
pub use pusher::{BroadcastReport, MessagePusher, PusherChannel};
pub use repository::{BindingRepository, Departure, JoinSnapshot, RoomRepository};
pub use throttle::ChatThrottle;
pub use value_object::{
    ChatText, ConnectionId, Name, PlaybackPosition, RoomCode, RoomCodeFactory, Timestamp, UserId,
};

#[cfg(test)]
pub use directory::{MockMembershipStore, MockRoomLookup};
#[cfg(test)]
pub use throttle::MockChatThrottle;

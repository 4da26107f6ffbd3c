//! UseCase layer: Presence Manager / Playback Synchronizer / Chat Relay の操作
//!
//! 各ユースケースは domain の trait にのみ依存します。

mod departure;
mod error;
#[cfg(test)]
pub(crate) mod test_support;

pub mod control_playback;
pub mod disconnect_participant;
pub mod end_party;
pub mod get_room_detail;
pub mod get_rooms;
pub mod join_room;
pub mod kick_participant;
pub mod leave_room;
pub mod send_chat_message;

pub use control_playback::ControlPlaybackUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use end_party::EndPartyUseCase;
pub use error::{
    ChatError, EndPartyError, GetRoomDetailError, JoinError, KickError, PlaybackError,
};
pub use get_room_detail::GetRoomDetailUseCase;
pub use get_rooms::GetRoomsUseCase;
pub use join_room::{JoinOutcome, JoinRequest, JoinRoomUseCase};
pub use kick_participant::KickParticipantUseCase;
pub use leave_room::LeaveRoomUseCase;
pub use send_chat_message::SendChatMessageUseCase;

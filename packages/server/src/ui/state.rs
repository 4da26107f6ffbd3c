//! Shared application state.

use std::{sync::Arc, time::Duration};

use watchparty_shared::time::Clock;

use crate::{
    config::ServerConfig,
    domain::{BindingRepository, MessagePusher, RoomRepository},
    infrastructure::{
        directory::RoomDirectory,
        message_pusher::WebSocketMessagePusher,
        rate_limit::ChatRateLimiter,
        repository::{InMemoryBindingRepository, InMemoryRoomRepository},
    },
    usecase::{EndPartyUseCase, GetRoomDetailUseCase, GetRoomsUseCase},
};

use super::gateway::Gateway;

/// Shared application state
pub struct AppState {
    /// Connection Gateway（WebSocket イベントの振り分け）
    pub gateway: Arc<Gateway>,
    /// EndPartyUseCase（Room 終了のユースケース）
    pub end_party_usecase: Arc<EndPartyUseCase>,
    /// GetRoomsUseCase（Room 一覧取得のユースケース）
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    /// GetRoomDetailUseCase（Room 詳細取得のユースケース）
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
    pub room_directory: RoomDirectory,
    pub chat_rate_limiter: Arc<ChatRateLimiter>,
    /// サーバーから送る WebSocket ping の間隔
    pub ping_interval: Duration,
}

impl AppState {
    /// Initialize dependencies in order:
    /// 1. Repository
    /// 2. MessagePusher
    /// 3. Gateway and UseCases
    pub fn new(config: &ServerConfig, room_directory: RoomDirectory, clock: Arc<dyn Clock>) -> Self {
        // 1. Repository（in-memory）
        let repository: Arc<dyn RoomRepository> =
            Arc::new(InMemoryRoomRepository::new(clock.clone()));
        let bindings: Arc<dyn BindingRepository> = Arc::new(InMemoryBindingRepository::new());

        // 2. MessagePusher（WebSocket）
        let message_pusher: Arc<dyn MessagePusher> = Arc::new(WebSocketMessagePusher::new());

        // 3. Gateway and UseCases
        let chat_rate_limiter = Arc::new(ChatRateLimiter::new(
            config.chat_burst,
            config.chat_per_sec,
            clock.clone(),
        ));
        let gateway = Arc::new(Gateway::new(
            repository.clone(),
            bindings,
            message_pusher,
            room_directory.room_lookup(),
            room_directory.membership_store(),
            chat_rate_limiter.clone(),
            clock,
        ));

        Self {
            end_party_usecase: gateway.end_party_usecase(),
            gateway,
            get_rooms_usecase: Arc::new(GetRoomsUseCase::new(repository.clone())),
            get_room_detail_usecase: Arc::new(GetRoomDetailUseCase::new(repository)),
            room_directory,
            chat_rate_limiter,
            ping_interval: Duration::from_secs(config.ping_interval_secs),
        }
    }
}

//! Server execution logic.

use std::{future::Future, sync::Arc, time::Duration};

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use watchparty_shared::time::{Clock, SystemClock};

use crate::{
    config::ServerConfig,
    infrastructure::directory::{HttpRoomDirectory, InMemoryRoomDirectory, RoomDirectory},
};

use super::{
    handler::{
        create_room, end_room, get_room_detail, get_rooms, health_check, websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// 流量制限の bucket を掃除する間隔
const RATE_LIMIT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);
/// この時間使われていない bucket は捨てる
const RATE_LIMIT_BUCKET_MAX_AGE: Duration = Duration::from_secs(300);

/// Build the router for the given state
pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        // WebSocket エンドポイント
        .route("/ws", get(websocket_handler))
        // HTTP エンドポイント
        .route("/api/health", get(health_check))
        .route("/api/rooms", get(get_rooms).post(create_room))
        .route("/api/rooms/{room_code}", get(get_room_detail))
        .route("/api/rooms/{room_code}/end", post(end_room))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Watch-party coordination server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(ServerConfig::default())?;
/// server.run().await?;
/// ```
pub struct Server {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl Server {
    /// Create a new Server instance
    ///
    /// Validates the configuration, selects the room directory and registers the seed rooms.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP directory cannot be built.
    pub async fn new(config: ServerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        Self::with_clock(config, Arc::new(SystemClock)).await
    }

    pub async fn with_clock(
        config: ServerConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        config.validate()?;

        let room_directory = match &config.room_lookup_url {
            Some(url) => {
                tracing::info!("Using room directory at {}", url);
                RoomDirectory::Http(Arc::new(HttpRoomDirectory::new(url.as_str())?))
            }
            None => {
                let directory = Arc::new(InMemoryRoomDirectory::new());
                for seed in &config.seed_rooms {
                    directory
                        .register(seed.room_code.clone(), seed.host_id.clone())
                        .await;
                    tracing::info!(
                        "Room '{}' registered with host '{}'",
                        seed.room_code,
                        seed.host_id
                    );
                }
                RoomDirectory::InMemory(directory)
            }
        };

        let state = Arc::new(AppState::new(&config, room_directory, clock));
        Ok(Self { config, state })
    }

    /// Shared state of this server
    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    /// Serve on an already bound listener until `shutdown` resolves
    ///
    /// Every live room receives `ended` before the server stops.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        // 使われなくなった bucket を定期的に捨てる
        let rate_limiter = self.state.chat_rate_limiter.clone();
        let cleanup_task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(RATE_LIMIT_CLEANUP_INTERVAL);
            loop {
                ticker.tick().await;
                let removed = rate_limiter.cleanup(RATE_LIMIT_BUCKET_MAX_AGE).await;
                if removed > 0 {
                    tracing::debug!("Removed {} idle chat rate limit buckets", removed);
                }
            }
        });

        let end_party_usecase = self.state.end_party_usecase.clone();
        let app = build_app(self.state);

        // Set up graceful shutdown: end every live room first
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.await;
                let ended = end_party_usecase.end_all().await;
                tracing::info!("Ended {} live room(s)", ended);
            })
            .await;

        cleanup_task.abort();
        tracing::info!("Server shutdown complete");
        result
    }

    /// Run the server on the configured address until Ctrl+C or SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the configured address or
    /// if there's an error during server execution.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        // Bind the server to the host and port
        let bind_addr = self.config.bind_addr();
        let listener = TcpListener::bind(&bind_addr).await?;

        // Start the server
        tracing::info!(
            "Watch-party server listening on {}",
            listener.local_addr()?
        );
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;
        Ok(())
    }
}

//! Watch-party coordination server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin watchparty-server
//! cargo run --bin watchparty-server -- --host 0.0.0.0 --port 3000 --room ABCD1234:u1
//! cargo run --bin watchparty-server -- --room-lookup-url https://platform.example.com/api
//! ```

use clap::Parser;
use watchparty_server::{
    config::{RoomSeed, ServerConfig},
    ui::Server,
};
use watchparty_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "watchparty-server")]
#[command(about = "Watch-party coordination server (presence, playback sync, chat)", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "WATCHPARTY_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "WATCHPARTY_PORT", default_value = "8080")]
    port: u16,

    /// Default log level (overridden by RUST_LOG)
    #[arg(long, env = "WATCHPARTY_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Platform API base URL used for room lookup and membership persistence
    #[arg(long, env = "WATCHPARTY_ROOM_LOOKUP_URL")]
    room_lookup_url: Option<String>,

    /// Room registered at startup as CODE:HOST_ID (repeatable)
    #[arg(long = "room", value_name = "CODE:HOST_ID")]
    rooms: Vec<RoomSeed>,

    /// Chat messages a participant may send in a burst
    #[arg(long, env = "WATCHPARTY_CHAT_BURST", default_value = "5")]
    chat_burst: u32,

    /// Chat messages refilled per second
    #[arg(long, env = "WATCHPARTY_CHAT_PER_SEC", default_value = "1.0")]
    chat_per_sec: f64,

    /// Interval of server-initiated WebSocket pings, in seconds
    #[arg(long, env = "WATCHPARTY_PING_INTERVAL_SECS", default_value = "30")]
    ping_interval_secs: u64,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            room_lookup_url: args.room_lookup_url,
            seed_rooms: args.rooms,
            chat_burst: args.chat_burst,
            chat_per_sec: args.chat_per_sec,
            ping_interval_secs: args.ping_interval_secs,
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "watchparty_server", &args.log_level);

    let server = match Server::new(ServerConfig::from(args)).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

//! Presence and signaling relay server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin yoriai-server
//! cargo run --bin yoriai-server -- --host 127.0.0.1 --port 8080
//! TURN_SECRET=... TURN_URLS=turn:turn.example.com:3478 cargo run --bin yoriai-server
//! ```

use std::sync::Arc;

use clap::Parser;
use yoriai_server::{
    config::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_RELAY_REALM, DEFAULT_RELAY_TTL_SECS},
    config::{ServerConfig, parse_url_list},
    domain::RelayConfig,
    infrastructure::{message_pusher::WebSocketMessagePusher, repository::InMemoryRoomRepository},
    ui::{AppState, Server},
};
use yoriai_shared::{
    logger::setup_logger,
    time::{Clock, SystemClock},
};

#[derive(Parser, Debug)]
#[command(name = "yoriai-server")]
#[command(about = "Presence and call-signaling relay server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "HOST", default_value = DEFAULT_HOST)]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Only WebSocket handshakes from this origin are accepted
    #[arg(long, env = "ALLOWED_ORIGIN")]
    allowed_origin: Option<String>,

    /// Shared secret of the TURN server; leave unset to disable /api/turn
    #[arg(long, env = "TURN_SECRET", hide_env_values = true)]
    turn_secret: Option<String>,

    /// TURN realm reported to clients
    #[arg(long, env = "TURN_REALM", default_value = DEFAULT_RELAY_REALM)]
    turn_realm: String,

    /// Lifetime of issued TURN credentials, in seconds
    #[arg(long, env = "TURN_TTL", default_value_t = DEFAULT_RELAY_TTL_SECS)]
    turn_ttl: u64,

    /// Comma-separated TURN URLs
    #[arg(long, env = "TURN_URLS", default_value = "")]
    turn_urls: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let relay = RelayConfig::from_parts(
        args.turn_secret,
        args.turn_realm,
        args.turn_ttl,
        parse_url_list(&args.turn_urls),
    );
    let config = match ServerConfig::new(args.host, args.port, args.allowed_origin, relay) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize dependencies in order:
    // 1. Clock
    // 2. Repository
    // 3. MessagePusher
    // 4. AppState (UseCases)
    // 5. Server
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let repository = Arc::new(InMemoryRoomRepository::new(clock.clone()));
    let message_pusher = Arc::new(WebSocketMessagePusher::default());
    let state = AppState::new(config, repository, message_pusher, clock);

    if let Err(e) = Server::new(state).run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

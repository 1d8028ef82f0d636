//! Study room server.
//!
//! Run with:
//! ```not_rust
//! JWT_SECRET=dev cargo run --bin studysync-server
//! JWT_SECRET=dev cargo run --bin studysync-server -- --host 0.0.0.0 --port 5000 --room focus
//! ```

use std::sync::Arc;

use clap::Parser;
use studysync_server::{
    config::ServerConfig,
    domain::{PersistedRoom, RoomName, RoomRegistry, Timestamp},
    infrastructure::{
        identity::JwtTokenVerifier,
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryMessageRepository, InMemoryRoomRepository},
    },
    ui::{AppState, Dependencies, Server},
};
use studysync_shared::{
    logger::setup_logger,
    time::{Clock, SystemClock},
};

#[tokio::main]
async fn main() {
    // `.env` is optional
    let _ = dotenvy::dotenv();

    let config = ServerConfig::parse();

    // Initialize tracing
    setup_logger(
        env!("CARGO_BIN_NAME"),
        &config.log_level,
        config.log_format(),
    );

    // Initialize dependencies in order:
    // 1. Repositories
    // 2. MessagePusher
    // 3. AppState (UseCases)
    // 4. Server

    // 1. Create Repositories (in-memory database)
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let room_repository = Arc::new(InMemoryRoomRepository::new());
    for raw in &config.rooms {
        match RoomName::new(raw.clone()) {
            Ok(name) => {
                tracing::info!("Room {} created!", name);
                room_repository
                    .insert(PersistedRoom::new(name, Timestamp::new(clock.now_millis())))
                    .await;
            }
            Err(e) => tracing::warn!("Skipping room '{}': {}", raw, e),
        }
    }
    let message_repository = Arc::new(InMemoryMessageRepository::new());

    // 2. Create MessagePusher (WebSocket implementation)
    let message_pusher = Arc::new(WebSocketMessagePusher::new());

    // 3. Wire UseCases
    let state = AppState::new(Dependencies {
        registry: Arc::new(RoomRegistry::new()),
        room_repository,
        message_repository,
        message_pusher,
        token_verifier: Arc::new(JwtTokenVerifier::new(&config.jwt_secret)),
        clock,
        teardown_delays: config.teardown_delays(),
    });

    // 4. Create and run the server
    let server = Server::new(state).with_allowed_origin(config.allowed_origin.clone());
    if let Err(e) = server.run(&config.host, config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

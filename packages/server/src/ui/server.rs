//! Server execution logic.

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::get,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{
    handler::{get_room_detail, get_rooms, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// WebSocket study room server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(AppState::new(dependencies))
///     .with_allowed_origin(Some("http://localhost:3000".to_string()));
/// server.run("127.0.0.1", 5000).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
    allowed_origin: Option<HeaderValue>,
}

impl Server {
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
            allowed_origin: None,
        }
    }

    /// CORS で許可するオリジンを設定する
    ///
    /// ヘッダー値として不正なオリジンは無視される。
    pub fn with_allowed_origin(mut self, origin: Option<String>) -> Self {
        self.allowed_origin = origin.and_then(|origin| match HeaderValue::from_str(&origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring invalid allowed origin '{}': {}", origin, e);
                None
            }
        });
        self
    }

    /// Build the router with all endpoints and layers
    pub fn router(&self) -> Router {
        let mut app: Router = Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms))
            .route("/api/rooms/{name}", get(get_room_detail))
            .with_state(self.state.clone());

        if let Some(origin) = &self.allowed_origin {
            app = app.layer(
                CorsLayer::new()
                    .allow_origin(origin.clone())
                    .allow_methods([Method::GET]),
            );
        }

        app.layer(TraceLayer::new_for_http())
    }

    /// Run the server until a shutdown signal is received
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.router();

        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        tracing::info!(
            "Study room server listening on {}",
            listener.local_addr()?
        );
        tracing::info!("Connect to: ws://{}/ws?token=<jwt>", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        let closed = self.state.registry.shutdown().await;
        tracing::info!("Server shutdown complete ({} room(s) discarded)", closed);

        Ok(())
    }
}

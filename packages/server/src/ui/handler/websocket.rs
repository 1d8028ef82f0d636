//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    domain::{Caller, ConnectionId},
    ui::state::AppState,
};

use super::event::handle_frame;

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub token: Option<String>,
}

/// Upgrade handler
///
/// トークンの検証に失敗した場合は 401 でアップグレードを拒否する。
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let connection_id = ConnectionId::generate();

    let identity = match state
        .resolve_identity_usecase
        .execute(query.token.as_deref(), &connection_id)
    {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!("Rejecting connection '{}': {}", connection_id, e);
            return Err((StatusCode::UNAUTHORIZED, e.to_string()));
        }
    };

    tracing::info!(
        "Client '{}' connected as '{}' ({})",
        connection_id,
        identity.display_name,
        identity.stable_id
    );
    let caller = Caller::new(connection_id, identity);
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, caller)))
}

/// Spawns a task that drains the rx channel into the WebSocket sender.
///
/// Events fanned out by the Broadcast Bus reach this client's socket through here.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, caller: Caller) {
    let (sender, mut receiver) = socket.split();

    // Create a channel for this client to receive events
    let (tx, rx) = mpsc::unbounded_channel();
    state
        .message_pusher
        .register_client(caller.connection_id.clone(), tx)
        .await;

    let recv_state = state.clone();
    let recv_caller = caller.clone();

    // Events from one connection are handled one at a time, in arrival order
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error on '{}': {}", recv_caller.connection_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    handle_frame(&recv_state, &recv_caller, text.as_str()).await;
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Client '{}' requested close", recv_caller.connection_id);
                    break;
                }
                _ => {}
            }
        }
    });

    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state
        .disconnect_participant_usecase
        .execute(&caller.connection_id)
        .await;
}

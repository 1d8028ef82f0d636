//! Inbound event dispatch.
//!
//! ワイヤ上の DTO をドメインの値に変換し、対応する UseCase を呼び出します。

use crate::{
    domain::{Caller, OutboundEvent, RoomName, StableUserId},
    infrastructure::dto::websocket::ClientEvent,
    ui::state::AppState,
    usecase::{ChatDraft, JoinRequest},
};

/// 1 つのテキストフレームを処理する
///
/// 解釈できないフレームには、その接続にだけ `error` を返す。
pub async fn handle_frame(state: &AppState, caller: &Caller, text: &str) {
    match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => dispatch(state, caller, event).await,
        Err(e) => {
            tracing::warn!(
                "Failed to parse frame from '{}': {}",
                caller.connection_id,
                e
            );
            reply_error(state, caller, format!("invalid event: {}", e)).await;
        }
    }
}

async fn dispatch(state: &AppState, caller: &Caller, event: ClientEvent) {
    let connection_id = &caller.connection_id;

    match event {
        ClientEvent::JoinRoom(payload) => {
            let Some(room) = room_name(state, caller, payload.room).await else {
                return;
            };
            let request = JoinRequest {
                room,
                user_name: payload.user_name,
                as_host: payload.as_host,
            };
            if let Err(e) = state.join_room_usecase.execute(caller, request).await {
                tracing::debug!("Join by '{}' failed: {}", connection_id, e);
            }
        }
        ClientEvent::LeaveRoom(payload) => {
            if let Some(room) = room_name(state, caller, payload.room).await {
                state.leave_room_usecase.execute(connection_id, &room).await;
            }
        }
        ClientEvent::SetRoomHost(payload) => {
            let Some(room) = room_name(state, caller, payload.room).await else {
                return;
            };
            match StableUserId::new(payload.user_id) {
                Ok(user_id) => {
                    state.set_room_host_usecase.execute(&room, user_id).await;
                }
                Err(e) => tracing::debug!("setRoomHost ignored: {}", e),
            }
        }
        ClientEvent::RequestChatHistory(payload) => {
            if let Some(room) = room_name(state, caller, payload.room).await {
                state
                    .get_chat_history_usecase
                    .execute(connection_id, &room)
                    .await;
            }
        }
        ClientEvent::RequestUserList(payload) => {
            if let Some(room) = room_name(state, caller, payload.room).await {
                state.get_user_list_usecase.execute(connection_id, &room).await;
            }
        }
        ClientEvent::RequestTimerState(payload) => {
            if let Some(room) = room_name(state, caller, payload.room).await {
                state
                    .sync_timer_usecase
                    .request_state(connection_id, &room)
                    .await;
            }
        }
        ClientEvent::TimerStart(payload) => {
            if let Some(room) = room_name(state, caller, payload.room).await {
                state
                    .sync_timer_usecase
                    .start(&room, payload.timer.into())
                    .await;
            }
        }
        ClientEvent::TimerPause(payload) => {
            if let Some(room) = room_name(state, caller, payload.room).await {
                state.sync_timer_usecase.pause(&room).await;
            }
        }
        ClientEvent::TimerTick(payload) => {
            if let Some(room) = room_name(state, caller, payload.room).await {
                state.sync_timer_usecase.tick(&room, payload.seconds).await;
            }
        }
        ClientEvent::TimerReset(payload) => {
            if let Some(room) = room_name(state, caller, payload.room).await {
                state
                    .sync_timer_usecase
                    .reset(&room, payload.timer.into())
                    .await;
            }
        }
        ClientEvent::ChatMessage(payload) => {
            let Some(room) = room_name(state, caller, payload.room).await else {
                return;
            };
            let message = payload.message;
            let draft = ChatDraft {
                text: message.text,
                user: message.user,
                user_id: message.user_id,
                is_authenticated: message.is_authenticated,
            };
            state.send_message_usecase.execute(caller, &room, draft).await;
        }
        ClientEvent::RoomDeleted(payload) => {
            if let Some(room) = room_name(state, caller, payload.room).await {
                state.end_session_usecase.room_deleted(caller, &room).await;
            }
        }
        ClientEvent::EndSession(payload) => {
            let Some(room) = room_name(state, caller, payload.room).await else {
                return;
            };
            if let Err(e) = state.end_session_usecase.end_session(caller, &room).await {
                tracing::info!("endSession by '{}' on '{}' failed: {}", connection_id, room, e);
            }
        }
    }
}

/// 空の Room 名は `error` を返して処理しない
async fn room_name(state: &AppState, caller: &Caller, raw: String) -> Option<RoomName> {
    match RoomName::new(raw) {
        Ok(room) => Some(room),
        Err(e) => {
            reply_error(state, caller, e.to_string()).await;
            None
        }
    }
}

async fn reply_error(state: &AppState, caller: &Caller, message: String) {
    let event = OutboundEvent::Error { message };
    if let Err(e) = state
        .message_pusher
        .push_to(&caller.connection_id, &event)
        .await
    {
        tracing::warn!("Failed to send error to '{}': {}", caller.connection_id, e);
    }
}

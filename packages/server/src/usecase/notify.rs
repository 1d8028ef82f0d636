//! Broadcast Bus への送信ヘルパー
//!
//! 送信失敗は呼び出し元の処理を止めず、ログに残すだけ。

use crate::domain::{ConnectionId, MessagePusher, OutboundEvent, RoomName};

pub(crate) async fn to_caller(
    pusher: &dyn MessagePusher,
    connection_id: &ConnectionId,
    event: OutboundEvent,
) {
    if let Err(e) = pusher.push_to(connection_id, &event).await {
        tracing::warn!(
            "Failed to send '{}' to '{}': {}",
            event.name(),
            connection_id,
            e
        );
    }
}

pub(crate) async fn to_room(pusher: &dyn MessagePusher, room: &RoomName, event: OutboundEvent) {
    match pusher.broadcast_to_room(room, &event).await {
        Ok(count) => {
            tracing::debug!("Broadcast '{}' to {} client(s) in '{}'", event.name(), count, room);
        }
        Err(e) => tracing::warn!("Failed to broadcast '{}' to '{}': {}", event.name(), room, e),
    }
}

/// Room 一覧の再取得を促す全体通知
pub(crate) async fn room_changed(pusher: &dyn MessagePusher, room: &RoomName) {
    let event = OutboundEvent::RoomChanged { room: room.clone() };
    if let Err(e) = pusher.broadcast_all(&event).await {
        tracing::error!("Failed to broadcast roomChanged for '{}': {}", room, e);
    }
}

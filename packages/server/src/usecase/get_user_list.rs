//! UseCase: メンバー一覧の取得

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, OutboundEvent, RoomName, RoomRegistry};

use super::notify;

pub struct GetUserListUseCase {
    registry: Arc<RoomRegistry>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl GetUserListUseCase {
    pub fn new(registry: Arc<RoomRegistry>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            registry,
            message_pusher,
        }
    }

    /// 現在のメンバー一覧を呼び出し元に送る。Room が無い場合は空の一覧
    pub async fn execute(&self, connection_id: &ConnectionId, room: &RoomName) -> usize {
        let users = self
            .registry
            .snapshot(room)
            .await
            .map(|state| state.users)
            .unwrap_or_default();
        if users.is_empty() {
            tracing::debug!("Room '{}' not found or has no users, sending empty list", room);
        }
        let count = users.len();
        notify::to_caller(
            self.message_pusher.as_ref(),
            connection_id,
            OutboundEvent::RoomUsers(users),
        )
        .await;
        count
    }
}

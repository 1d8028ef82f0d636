//! UseCase: Host の付け替え
//!
//! 権限チェックは行わない（呼び出し側の責務）。

use std::sync::Arc;

use crate::domain::{RoomName, RoomPatch, RoomRegistry, RoomRepository, StableUserId};

pub struct SetRoomHostUseCase {
    registry: Arc<RoomRegistry>,
    room_repository: Arc<dyn RoomRepository>,
}

impl SetRoomHostUseCase {
    pub fn new(registry: Arc<RoomRegistry>, room_repository: Arc<dyn RoomRepository>) -> Self {
        Self {
            registry,
            room_repository,
        }
    }

    /// 永続ストアに Room がある場合だけ Host を保存する。保存した場合 true
    pub async fn execute(&self, room: &RoomName, user_id: StableUserId) -> bool {
        let _gate = self.registry.lock_room(room).await;

        match self.room_repository.get_room(room).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                tracing::debug!("setRoomHost ignored: room '{}' does not exist", room);
                return false;
            }
            Err(e) => {
                tracing::error!("Failed to look up room '{}' for setRoomHost: {}", room, e);
                return false;
            }
        }

        let patch = RoomPatch::new(room.clone()).host(user_id.clone());
        if let Err(e) = self.room_repository.save_room(patch).await {
            tracing::error!("Failed to set host of room '{}': {}", room, e);
            return false;
        }

        self.registry
            .update(room, |state| state.host = Some(user_id.clone()))
            .await;
        tracing::info!("Set user '{}' as host of room '{}'", user_id, room);
        true
    }
}

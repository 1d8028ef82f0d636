//! UseCase: Room からの退出

use std::sync::Arc;

use studysync_shared::time::Clock;

use crate::domain::{ConnectionId, MessagePusher, RoomName, RoomRegistry, RoomRepository, Timestamp};

use super::{
    notify,
    reconcile::{self, Reconciled},
};

pub struct LeaveRoomUseCase {
    registry: Arc<RoomRegistry>,
    room_repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl LeaveRoomUseCase {
    pub fn new(
        registry: Arc<RoomRegistry>,
        room_repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            room_repository,
            message_pusher,
            clock,
        }
    }

    /// 接続を Room から外す
    ///
    /// Registry が Room を把握していない場合はチャンネルの購読解除だけを行い、false を返す。
    pub async fn execute(&self, connection_id: &ConnectionId, room: &RoomName) -> bool {
        let _gate = self.registry.lock_room(room).await;
        let pusher = self.message_pusher.as_ref();

        pusher.unsubscribe(room, connection_id).await;
        if !self.registry.contains(room).await {
            tracing::debug!("Leave ignored: room '{}' is not tracked", room);
            return false;
        }

        let now = Timestamp::new(self.clock.now_millis());
        let outcome = reconcile::depart(
            &self.registry,
            self.room_repository.as_ref(),
            pusher,
            room,
            connection_id,
            now,
        )
        .await;
        if let Reconciled::Remaining { users } = outcome {
            tracing::info!("'{}' left room '{}' ({} user(s) remain)", connection_id, room, users);
        }

        notify::room_changed(pusher, room).await;
        true
    }
}

//! UseCase: 稼働中の Room 詳細の取得

use std::sync::Arc;

use crate::domain::{RoomName, RoomRegistry, RoomState};

use super::error::GetRoomDetailError;

pub struct GetRoomDetailUseCase {
    registry: Arc<RoomRegistry>,
}

impl GetRoomDetailUseCase {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }

    pub async fn execute(&self, room: String) -> Result<RoomState, GetRoomDetailError> {
        let room = RoomName::new(room).map_err(|_| GetRoomDetailError::RoomNotFound)?;
        self.registry
            .snapshot(&room)
            .await
            .ok_or(GetRoomDetailError::RoomNotFound)
    }
}

//! UseCase: 稼働中の Room 一覧の取得

use std::sync::Arc;

use crate::domain::{RoomRegistry, RoomState};

pub struct GetRoomsUseCase {
    registry: Arc<RoomRegistry>,
}

impl GetRoomsUseCase {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }

    /// Registry が把握している Room（名前順）
    pub async fn execute(&self) -> Vec<RoomState> {
        self.registry.snapshots().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Timestamp;
    use crate::usecase::test_support::room;

    #[tokio::test]
    async fn test_rooms_are_sorted_by_name() {
        // テスト項目: Room 一覧が名前順で返される
        // given (前提条件):
        let registry = Arc::new(RoomRegistry::new());
        for name in ["reading", "focus"] {
            registry
                .get_or_create(&room(name), Timestamp::new(0), |_, _| ())
                .await;
        }
        let usecase = GetRoomsUseCase::new(registry);

        // when (操作):
        let rooms = usecase.execute().await;

        // then (期待する結果):
        let names: Vec<&str> = rooms.iter().map(|state| state.name.as_str()).collect();
        assert_eq!(names, vec!["focus", "reading"]);
    }
}

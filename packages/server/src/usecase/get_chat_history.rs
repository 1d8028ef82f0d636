//! UseCase: チャット履歴の再送

use std::sync::Arc;

use crate::domain::{
    ChatMessage, ConnectionId, MessagePusher, MessageRepository, OutboundEvent, RoomName,
};

use super::notify;

/// Room の全メッセージを取得する。取得に失敗した場合は空
pub(crate) async fn load_history(
    repository: &dyn MessageRepository,
    room: &RoomName,
) -> Vec<ChatMessage> {
    match repository.get_room_messages(room).await {
        Ok(messages) => messages,
        Err(e) => {
            tracing::error!("Failed to fetch chat history for '{}': {}", room, e);
            Vec::new()
        }
    }
}

pub struct GetChatHistoryUseCase {
    message_repository: Arc<dyn MessageRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl GetChatHistoryUseCase {
    pub fn new(
        message_repository: Arc<dyn MessageRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            message_repository,
            message_pusher,
        }
    }

    /// 履歴を 1 つのバッチとして呼び出し元にだけ送る。送ったメッセージ数を返す
    pub async fn execute(&self, connection_id: &ConnectionId, room: &RoomName) -> usize {
        let messages = load_history(self.message_repository.as_ref(), room).await;
        let count = messages.len();
        notify::to_caller(
            self.message_pusher.as_ref(),
            connection_id,
            OutboundEvent::ChatHistory(messages),
        )
        .await;
        count
    }
}

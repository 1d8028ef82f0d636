//! InMemory Message Repository 実装

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ChatMessage, MessageRepository, RepositoryError, RoomName};

/// インメモリ Message Repository 実装
///
/// 全 Room のメッセージを保存順に 1 つの Vec で保持します。
#[derive(Default)]
pub struct InMemoryMessageRepository {
    messages: Mutex<Vec<ChatMessage>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn save_message(&self, message: ChatMessage) -> Result<(), RepositoryError> {
        self.messages.lock().await.push(message);
        Ok(())
    }

    async fn get_room_messages(
        &self,
        room: &RoomName,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let messages = self.messages.lock().await;
        Ok(messages
            .iter()
            .filter(|message| &message.room == room)
            .cloned()
            .collect())
    }

    async fn delete_messages(&self, room: &RoomName) -> Result<u64, RepositoryError> {
        let mut messages = self.messages.lock().await;
        let before = messages.len();
        messages.retain(|message| &message.room != room);
        Ok((before - messages.len()) as u64)
    }
}

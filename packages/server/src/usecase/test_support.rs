//! UseCase テスト用のフィクスチャ

use std::sync::Arc;

use serde_json::Value;
use studysync_shared::time::FixedClock;
use tokio::sync::mpsc;

use crate::{
    domain::{
        Caller, ConnectionId, Identity, MessagePusher, PersistedRoom, RoomName, RoomRegistry,
        StableUserId, Timestamp,
    },
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryMessageRepository, InMemoryRoomRepository},
    },
};

pub(crate) const NOW: i64 = 1_700_000_000_000;

pub(crate) struct Fixture {
    pub registry: Arc<RoomRegistry>,
    pub pusher: Arc<WebSocketMessagePusher>,
    pub rooms: Arc<InMemoryRoomRepository>,
    pub messages: Arc<InMemoryMessageRepository>,
    pub clock: Arc<FixedClock>,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(RoomRegistry::new()),
            pusher: Arc::new(WebSocketMessagePusher::new()),
            rooms: Arc::new(InMemoryRoomRepository::new()),
            messages: Arc::new(InMemoryMessageRepository::new()),
            clock: Arc::new(FixedClock::new(NOW)),
        }
    }

    /// 永続ストアに Room レコードを作成する
    pub async fn seed_room(&self, name: &str) -> RoomName {
        let room = room(name);
        self.rooms
            .insert(PersistedRoom::new(room.clone(), Timestamp::new(NOW - 60_000)))
            .await;
        room
    }

    /// クライアントを Broadcast Bus に登録し、受信側を返す
    pub async fn connect(&self, caller: &Caller) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.pusher
            .register_client(caller.connection_id.clone(), tx)
            .await;
        rx
    }
}

pub(crate) fn room(name: &str) -> RoomName {
    RoomName::new(name.to_string()).unwrap()
}

pub(crate) fn connection(value: &str) -> ConnectionId {
    ConnectionId::new(value.to_string()).unwrap()
}

/// 認証済みの呼び出し元
pub(crate) fn member(connection_id: &str, stable_id: &str, name: &str) -> Caller {
    Caller::new(
        connection(connection_id),
        Identity {
            stable_id: StableUserId::new(stable_id.to_string()).unwrap(),
            display_name: name.to_string(),
            is_authenticated: true,
        },
    )
}

/// 受信済みのフレームを全て取り出す
pub(crate) fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<Value> {
    let mut frames = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        frames.push(serde_json::from_str(&frame).unwrap());
    }
    frames
}

pub(crate) fn named<'a>(frames: &'a [Value], event: &str) -> Vec<&'a Value> {
    frames
        .iter()
        .filter(|frame| frame["event"] == event)
        .collect()
}

//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - WebSocket の `UnboundedSender` を管理
//! - Room ごとの購読者集合を管理（トランスポート側の「実際に接続している」信号）
//! - クライアントへのイベント送信（push_to, broadcast_to_room, broadcast_all）
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、メッセージ送信に使用します。
//!
//! 同じ Room へのイベントは呼び出し順に各クライアントのチャンネルへ積まれるため、
//! Room 内の配信順序は送信順と一致します。

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{
        ConnectionId, MessagePushError, MessagePusher, OutboundEvent, PusherChannel, RoomName,
    },
    infrastructure::dto::conversion::encode_event,
};

/// WebSocket を使った MessagePusher 実装
///
/// ## 使用例
///
/// ```ignore
/// let pusher = WebSocketMessagePusher::new();
/// pusher.register_client(connection_id.clone(), tx).await;
/// pusher.subscribe(&room, &connection_id).await;
/// pusher.broadcast_to_room(&room, &event).await?;
/// ```
#[derive(Default)]
pub struct WebSocketMessagePusher {
    /// 接続中のクライアントの WebSocket sender
    clients: Mutex<HashMap<ConnectionId, PusherChannel>>,
    /// Room ごとの購読者
    channels: Mutex<HashMap<RoomName, BTreeSet<ConnectionId>>>,
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 接続中のクライアント数
    pub async fn client_count(&self) -> usize {
        self.clients.lock().await.len()
    }

    fn encode(event: &OutboundEvent) -> Result<String, MessagePushError> {
        encode_event(event).map_err(|e| MessagePushError::Serialization(e.to_string()))
    }

    /// 指定されたクライアントに送信する。一部の送信失敗は許容する
    async fn fan_out<'a>(
        &self,
        targets: impl IntoIterator<Item = &'a ConnectionId>,
        content: &str,
    ) -> usize {
        let clients = self.clients.lock().await;
        let mut delivered = 0;
        for target in targets {
            match clients.get(target) {
                Some(sender) => {
                    if let Err(e) = sender.send(content.to_string()) {
                        tracing::warn!("Failed to push message to client '{}': {}", target, e);
                    } else {
                        delivered += 1;
                    }
                }
                None => {
                    tracing::warn!("Client '{}' not found during broadcast, skipping", target);
                }
            }
        }
        delivered
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, client_id: ConnectionId, sender: PusherChannel) {
        let mut clients = self.clients.lock().await;
        tracing::debug!("Client '{}' registered to MessagePusher", client_id);
        clients.insert(client_id, sender);
    }

    async fn unregister_client(&self, client_id: &ConnectionId) -> Vec<RoomName> {
        self.clients.lock().await.remove(client_id);

        let mut channels = self.channels.lock().await;
        let mut left = Vec::new();
        channels.retain(|room, members| {
            if members.remove(client_id) {
                left.push(room.clone());
            }
            !members.is_empty()
        });
        tracing::debug!(
            "Client '{}' unregistered from MessagePusher (left {} room channels)",
            client_id,
            left.len()
        );
        left
    }

    async fn subscribe(&self, room: &RoomName, client_id: &ConnectionId) {
        let mut channels = self.channels.lock().await;
        channels
            .entry(room.clone())
            .or_default()
            .insert(client_id.clone());
    }

    async fn unsubscribe(&self, room: &RoomName, client_id: &ConnectionId) {
        let mut channels = self.channels.lock().await;
        if let Some(members) = channels.get_mut(room) {
            members.remove(client_id);
            if members.is_empty() {
                channels.remove(room);
            }
        }
    }

    async fn subscribers(&self, room: &RoomName) -> Vec<ConnectionId> {
        let channels = self.channels.lock().await;
        channels
            .get(room)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    async fn push_to(
        &self,
        client_id: &ConnectionId,
        event: &OutboundEvent,
    ) -> Result<(), MessagePushError> {
        let content = Self::encode(event)?;
        let clients = self.clients.lock().await;

        if let Some(sender) = clients.get(client_id) {
            sender
                .send(content)
                .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
            tracing::debug!("Pushed '{}' to client '{}'", event.name(), client_id);
            Ok(())
        } else {
            Err(MessagePushError::ClientNotFound(client_id.to_string()))
        }
    }

    async fn broadcast_to_room(
        &self,
        room: &RoomName,
        event: &OutboundEvent,
    ) -> Result<usize, MessagePushError> {
        let content = Self::encode(event)?;
        let targets = self.subscribers(room).await;
        let delivered = self.fan_out(&targets, &content).await;
        tracing::debug!(
            "Broadcasted '{}' to {}/{} subscribers of room '{}'",
            event.name(),
            delivered,
            targets.len(),
            room
        );
        Ok(delivered)
    }

    async fn broadcast_all(&self, event: &OutboundEvent) -> Result<usize, MessagePushError> {
        let content = Self::encode(event)?;
        let clients = self.clients.lock().await;
        let mut delivered = 0;
        for (client_id, sender) in clients.iter() {
            if let Err(e) = sender.send(content.clone()) {
                tracing::warn!("Failed to push message to client '{}': {}", client_id, e);
            } else {
                delivered += 1;
            }
        }
        tracing::debug!("Broadcasted '{}' to {} clients", event.name(), delivered);
        Ok(delivered)
    }
}

//! MessagePusher trait 定義（Broadcast Bus）
//!
//! クライアントへのイベント送信と、Room ごとの購読者集合を抽象化します。
//! 購読者集合はトランスポート側の「実際に接続している」信号として、
//! Registry が記録しているメンバー数とは独立に扱われます。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ConnectionId, MessagePushError, OutboundEvent, RoomName};

/// クライアントへの送信チャンネル
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// クライアントを登録
    async fn register_client(&self, client_id: ConnectionId, sender: PusherChannel);

    /// クライアントの登録を解除し、購読していた全ての Room から外す
    ///
    /// 購読していた Room 名を返す。
    async fn unregister_client(&self, client_id: &ConnectionId) -> Vec<RoomName>;

    /// クライアントを Room のチャンネルに購読させる
    async fn subscribe(&self, room: &RoomName, client_id: &ConnectionId);

    /// クライアントを Room のチャンネルから強制的に外す
    async fn unsubscribe(&self, room: &RoomName, client_id: &ConnectionId);

    /// Room のチャンネルを現在購読している接続の一覧
    async fn subscribers(&self, room: &RoomName) -> Vec<ConnectionId>;

    /// 特定のクライアントにイベントを送信
    async fn push_to(
        &self,
        client_id: &ConnectionId,
        event: &OutboundEvent,
    ) -> Result<(), MessagePushError>;

    /// Room の全購読者にイベントを送信し、送信できた数を返す
    async fn broadcast_to_room(
        &self,
        room: &RoomName,
        event: &OutboundEvent,
    ) -> Result<usize, MessagePushError>;

    /// 接続中の全クライアントにイベントを送信し、送信できた数を返す
    async fn broadcast_all(&self, event: &OutboundEvent) -> Result<usize, MessagePushError>;
}

//! サーバーからクライアントへ送るイベント
//!
//! ワイヤ形式への変換は Infrastructure 層の DTO が担う。

use super::{
    entity::{ChatMessage, TimerState, UserEntry},
    value_object::RoomName,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    /// 参加拒否（呼び出し元にのみ送る）
    JoinDenied { reason: String },
    /// 参加者が Host かどうか
    HostStatus { is_host: bool },
    /// Room のメンバー一覧
    RoomUsers(Vec<UserEntry>),
    TimerUpdate(TimerState),
    ChatHistory(Vec<ChatMessage>),
    ChatMessage(ChatMessage),
    /// セッション終了の通知
    RoomClosed {
        reason: String,
        host_id: String,
        room_name: RoomName,
    },
    /// Room 一覧の再取得を促す全体通知
    RoomChanged { room: RoomName },
    Error { message: String },
}

impl OutboundEvent {
    /// ワイヤ上のイベント名
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinDenied { .. } => "joinDenied",
            Self::HostStatus { .. } => "hostStatus",
            Self::RoomUsers(_) => "roomUsers",
            Self::TimerUpdate(_) => "timer:update",
            Self::ChatHistory(_) => "chat:history",
            Self::ChatMessage(_) => "chat:message",
            Self::RoomClosed { .. } => "roomClosed",
            Self::RoomChanged { .. } => "roomChanged",
            Self::Error { .. } => "error",
        }
    }
}

//! WebSocket event DTOs.
//!
//! Every frame is a JSON envelope `{"event": "<name>", "data": <payload>}`.

use serde::{Deserialize, Serialize};

fn default_timer_label() -> String {
    crate::domain::DEFAULT_TIMER_LABEL.to_string()
}

/// Events sent by clients
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "joinRoom")]
    JoinRoom(JoinRoomPayload),
    #[serde(rename = "leaveRoom")]
    LeaveRoom(RoomPayload),
    #[serde(rename = "setRoomHost")]
    SetRoomHost(SetRoomHostPayload),
    #[serde(rename = "requestChatHistory")]
    RequestChatHistory(RoomPayload),
    #[serde(rename = "requestUserList")]
    RequestUserList(RoomPayload),
    #[serde(rename = "requestTimerState")]
    RequestTimerState(RoomPayload),
    #[serde(rename = "timer:start")]
    TimerStart(TimerPayload),
    #[serde(rename = "timer:pause")]
    TimerPause(RoomPayload),
    #[serde(rename = "timer:tick")]
    TimerTick(TickPayload),
    #[serde(rename = "timer:reset")]
    TimerReset(TimerPayload),
    #[serde(rename = "chat:message")]
    ChatMessage(ChatMessagePayload),
    #[serde(rename = "roomDeleted")]
    RoomDeleted(RoomPayload),
    #[serde(rename = "endSession")]
    EndSession(RoomPayload),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomPayload {
    pub room: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub as_host: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RoomPayload {
    pub room: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRoomHostPayload {
    pub room: String,
    pub user_id: String,
}

/// Timer state as seen on the wire (both directions)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerDto {
    #[serde(default)]
    pub running: bool,
    pub seconds: i64,
    #[serde(default = "default_timer_label")]
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimerPayload {
    pub room: String,
    pub timer: TimerDto,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TickPayload {
    pub room: String,
    pub seconds: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatMessagePayload {
    pub room: String,
    pub message: IncomingChatMessage,
}

/// Chat message as declared by the client
///
/// `user`, `userId` and `isAuthenticated` are only trusted when the connection
/// itself is not authenticated.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingChatMessage {
    pub text: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub is_authenticated: bool,
}

/// Events sent by the server
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerMessage {
    #[serde(rename = "joinDenied")]
    JoinDenied(JoinDeniedDto),
    #[serde(rename = "hostStatus")]
    HostStatus(HostStatusDto),
    #[serde(rename = "roomUsers")]
    RoomUsers(Vec<UserEntryDto>),
    #[serde(rename = "timer:update")]
    TimerUpdate(TimerDto),
    #[serde(rename = "chat:history")]
    ChatHistory(Vec<ChatMessageDto>),
    #[serde(rename = "chat:message")]
    ChatMessage(ChatMessageDto),
    #[serde(rename = "roomClosed")]
    RoomClosed(RoomClosedDto),
    #[serde(rename = "roomChanged")]
    RoomChanged(RoomChangedDto),
    #[serde(rename = "error")]
    Error(ErrorDto),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinDeniedDto {
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostStatusDto {
    pub is_host: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEntryDto {
    /// Connection id (changes on reconnect)
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub is_authenticated: bool,
    /// RFC 3339
    pub joined_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageDto {
    pub room: String,
    pub user: String,
    pub user_id: String,
    pub text: String,
    pub is_authenticated: bool,
    /// RFC 3339
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomClosedDto {
    pub reason: String,
    pub host_id: String,
    pub room_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomChangedDto {
    pub room: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorDto {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_join_room_with_defaults() {
        // テスト項目: joinRoom の省略可能なフィールドは既定値になる
        // given (前提条件):
        let json = r#"{"event":"joinRoom","data":{"room":"focus"}}"#;

        // when (操作):
        let event: ClientEvent = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(
            event,
            ClientEvent::JoinRoom(JoinRoomPayload {
                room: "focus".to_string(),
                user_name: None,
                as_host: false,
            })
        );
    }

    #[test]
    fn test_parse_namespaced_timer_event() {
        // テスト項目: "timer:start" のような名前空間付きイベントを解釈できる
        // given (前提条件):
        let json = r#"{"event":"timer:start","data":{"room":"focus","timer":{"seconds":600,"label":"Focus"}}}"#;

        // when (操作):
        let event: ClientEvent = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        match event {
            ClientEvent::TimerStart(payload) => {
                assert_eq!(payload.room, "focus");
                assert_eq!(payload.timer.seconds, 600);
                assert_eq!(payload.timer.label, "Focus");
                assert!(!payload.timer.running);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_parse_chat_message_with_client_fields() {
        // テスト項目: チャットメッセージのクライアント申告フィールドを解釈できる
        // given (前提条件):
        let json = r#"{"event":"chat:message","data":{"room":"focus","message":{"text":"hi","user":"Bob","userId":"u-1","isAuthenticated":true}}}"#;

        // when (操作):
        let event: ClientEvent = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        match event {
            ClientEvent::ChatMessage(payload) => {
                assert_eq!(payload.message.text, "hi");
                assert_eq!(payload.message.user.as_deref(), Some("Bob"));
                assert_eq!(payload.message.user_id.as_deref(), Some("u-1"));
                assert!(payload.message.is_authenticated);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        // テスト項目: 未知のイベント名は解釈エラーになる
        // given (前提条件):
        let json = r#"{"event":"dance","data":{"room":"focus"}}"#;

        // when (操作):
        let result = serde_json::from_str::<ClientEvent>(json);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_host_status_envelope() {
        // テスト項目: サーバーイベントは event/data の封筒形式で出力される
        // given (前提条件):
        let message = ServerMessage::HostStatus(HostStatusDto { is_host: true });

        // when (操作):
        let json = serde_json::to_value(&message).unwrap();

        // then (期待する結果):
        assert_eq!(
            json,
            serde_json::json!({"event": "hostStatus", "data": {"isHost": true}})
        );
    }

    #[test]
    fn test_serialize_room_users_as_array() {
        // テスト項目: roomUsers の data は配列になる
        // given (前提条件):
        let message = ServerMessage::RoomUsers(vec![UserEntryDto {
            id: "c1".to_string(),
            user_id: "alice".to_string(),
            name: "Alice".to_string(),
            is_authenticated: true,
            joined_at: "2023-01-01T00:00:00.000Z".to_string(),
        }]);

        // when (操作):
        let json = serde_json::to_value(&message).unwrap();

        // then (期待する結果):
        assert_eq!(json["event"], "roomUsers");
        assert_eq!(json["data"][0]["userId"], "alice");
        assert_eq!(json["data"][0]["isAuthenticated"], true);
    }
}

//! Conversion logic between DTOs and domain entities.

use studysync_shared::time::timestamp_to_rfc3339;

use crate::domain::{ChatMessage, OutboundEvent, RoomState, TimerState, UserEntry};
use crate::infrastructure::dto::{http, websocket as dto};

// ========================================
// DTO → Domain Entity
// ========================================

impl From<dto::TimerDto> for TimerState {
    fn from(dto: dto::TimerDto) -> Self {
        Self {
            running: dto.running,
            seconds: TimerState::clamp_seconds(dto.seconds),
            label: dto.label,
        }
    }
}

// ========================================
// Domain Entity → DTO
// ========================================

impl From<TimerState> for dto::TimerDto {
    fn from(model: TimerState) -> Self {
        Self {
            running: model.running,
            seconds: i64::from(model.seconds),
            label: model.label,
        }
    }
}

impl From<UserEntry> for dto::UserEntryDto {
    fn from(model: UserEntry) -> Self {
        Self {
            id: model.connection_id.into_string(),
            user_id: model.stable_user_id.into_string(),
            name: model.display_name,
            is_authenticated: model.is_authenticated,
            joined_at: timestamp_to_rfc3339(model.joined_at.value()),
        }
    }
}

impl From<ChatMessage> for dto::ChatMessageDto {
    fn from(model: ChatMessage) -> Self {
        Self {
            room: model.room.into_string(),
            user: model.user,
            user_id: model.user_id,
            text: model.text,
            is_authenticated: model.is_authenticated,
            timestamp: timestamp_to_rfc3339(model.timestamp.value()),
        }
    }
}

impl From<OutboundEvent> for dto::ServerMessage {
    fn from(event: OutboundEvent) -> Self {
        match event {
            OutboundEvent::JoinDenied { reason } => {
                Self::JoinDenied(dto::JoinDeniedDto { reason })
            }
            OutboundEvent::HostStatus { is_host } => {
                Self::HostStatus(dto::HostStatusDto { is_host })
            }
            OutboundEvent::RoomUsers(users) => {
                Self::RoomUsers(users.into_iter().map(Into::into).collect())
            }
            OutboundEvent::TimerUpdate(timer) => Self::TimerUpdate(timer.into()),
            OutboundEvent::ChatHistory(messages) => {
                Self::ChatHistory(messages.into_iter().map(Into::into).collect())
            }
            OutboundEvent::ChatMessage(message) => Self::ChatMessage(message.into()),
            OutboundEvent::RoomClosed {
                reason,
                host_id,
                room_name,
            } => Self::RoomClosed(dto::RoomClosedDto {
                reason,
                host_id,
                room_name: room_name.into_string(),
            }),
            OutboundEvent::RoomChanged { room } => Self::RoomChanged(dto::RoomChangedDto {
                room: room.into_string(),
            }),
            OutboundEvent::Error { message } => Self::Error(dto::ErrorDto { message }),
        }
    }
}

impl From<RoomState> for http::RoomSummaryDto {
    fn from(model: RoomState) -> Self {
        Self {
            name: model.name.into_string(),
            user_count: model.users.len(),
            host: model.host.map(|host| host.into_string()),
            timer_running: model.timer.running,
            created_at: timestamp_to_rfc3339(model.created_at.value()),
        }
    }
}

impl From<RoomState> for http::RoomDetailDto {
    fn from(model: RoomState) -> Self {
        Self {
            name: model.name.into_string(),
            host: model.host.map(|host| host.into_string()),
            cycles: model.cycles,
            timer: model.timer.into(),
            users: model.users.into_iter().map(Into::into).collect(),
            created_at: timestamp_to_rfc3339(model.created_at.value()),
        }
    }
}

/// Serialize a domain event into a wire frame
pub fn encode_event(event: &OutboundEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(&dto::ServerMessage::from(event.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConnectionId, RoomName, StableUserId, Timestamp};

    #[test]
    fn test_dto_timer_clamps_negative_seconds() {
        // テスト項目: 負の秒数は 0 に丸められてドメインに変換される
        // given (前提条件):
        let dto_timer = dto::TimerDto {
            running: true,
            seconds: -5,
            label: "Focus".to_string(),
        };

        // when (操作):
        let timer: TimerState = dto_timer.into();

        // then (期待する結果):
        assert_eq!(timer.seconds, 0);
        assert!(timer.running);
    }

    #[test]
    fn test_domain_user_entry_to_dto() {
        // テスト項目: UserEntry が DTO に変換される
        // given (前提条件):
        let entry = UserEntry {
            connection_id: ConnectionId::new("c1".to_string()).unwrap(),
            stable_user_id: StableUserId::new("alice".to_string()).unwrap(),
            display_name: "Alice".to_string(),
            is_authenticated: true,
            joined_at: Timestamp::new(1672531200000),
        };

        // when (操作):
        let dto_entry: dto::UserEntryDto = entry.into();

        // then (期待する結果):
        assert_eq!(dto_entry.id, "c1");
        assert_eq!(dto_entry.user_id, "alice");
        assert_eq!(dto_entry.name, "Alice");
        assert_eq!(dto_entry.joined_at, "2023-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_encode_room_closed_event() {
        // テスト項目: roomClosed イベントがワイヤ形式にエンコードされる
        // given (前提条件):
        let event = OutboundEvent::RoomClosed {
            reason: "Alice has ended this study session".to_string(),
            host_id: "alice".to_string(),
            room_name: RoomName::new("focus".to_string()).unwrap(),
        };

        // when (操作):
        let json: serde_json::Value =
            serde_json::from_str(&encode_event(&event).unwrap()).unwrap();

        // then (期待する結果):
        assert_eq!(json["event"], "roomClosed");
        assert_eq!(json["data"]["hostId"], "alice");
        assert_eq!(json["data"]["roomName"], "focus");
    }

    #[test]
    fn test_event_name_matches_wire_tag() {
        // テスト項目: OutboundEvent::name とワイヤ上の event 名が一致する
        // given (前提条件):
        let events = vec![
            OutboundEvent::JoinDenied {
                reason: "nope".to_string(),
            },
            OutboundEvent::TimerUpdate(TimerState::default()),
            OutboundEvent::ChatHistory(vec![]),
            OutboundEvent::RoomChanged {
                room: RoomName::new("focus".to_string()).unwrap(),
            },
            OutboundEvent::Error {
                message: "oops".to_string(),
            },
        ];

        for event in events {
            // when (操作):
            let json: serde_json::Value =
                serde_json::from_str(&encode_event(&event).unwrap()).unwrap();

            // then (期待する結果):
            assert_eq!(json["event"], event.name());
        }
    }
}

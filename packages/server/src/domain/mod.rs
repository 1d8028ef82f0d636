//! Domain layer
//!
//! Value Object・Entity・ドメインサービスと、外部との境界になる trait を定義します。

pub mod entity;
pub mod error;
pub mod event;
pub mod host;
pub mod identity;
pub mod message_pusher;
pub mod registry;
pub mod repository;
pub mod timer;
pub mod value_object;

pub use entity::{
    ANONYMOUS_NAME, Caller, ChatMessage, Identity, Occupancy, PersistedRoom, RoomPatch,
    RoomState, TimerState, UserEntry,
};
pub use error::{MessagePushError, RepositoryError, TokenError, ValueObjectError};
pub use event::OutboundEvent;
pub use host::elect_host;
pub use identity::{TokenSubject, TokenVerifier};
pub use message_pusher::{MessagePusher, PusherChannel};
pub use registry::{RoomGate, RoomRegistry};
pub use repository::{MessageRepository, RoomRepository};
pub use timer::{DEFAULT_TIMER_LABEL, DEFAULT_TIMER_SECONDS, TickOutcome};
pub use value_object::{ConnectionId, RoomName, StableUserId, Timestamp};

#[cfg(test)]
pub use repository::{MockMessageRepository, MockRoomRepository};

//! UseCase layer
//!
//! クライアントからのイベントごとに 1 つの UseCase を用意します。
//! Room に触れる UseCase は処理の間その Room のゲートを保持します。

mod disconnect_participant;
mod end_session;
mod error;
mod get_chat_history;
mod get_room_detail;
mod get_rooms;
mod get_user_list;
mod join_room;
mod leave_room;
mod notify;
mod reconcile;
mod resolve_identity;
mod send_message;
mod set_room_host;
mod sync_timer;

#[cfg(test)]
pub(crate) mod test_support;

pub use disconnect_participant::DisconnectParticipantUseCase;
pub use end_session::{EndSessionUseCase, NOT_HOST_MESSAGE, ScheduledTeardown, TeardownDelays};
pub use error::{AuthError, EndSessionError, GetRoomDetailError, JoinError};
pub use get_chat_history::GetChatHistoryUseCase;
pub use get_room_detail::GetRoomDetailUseCase;
pub use get_rooms::GetRoomsUseCase;
pub use get_user_list::GetUserListUseCase;
pub use join_room::{JoinRequest, JoinRoomUseCase, JoinedRoom};
pub use leave_room::LeaveRoomUseCase;
pub use resolve_identity::ResolveIdentityUseCase;
pub use send_message::{ChatDraft, SendMessageUseCase};
pub use set_room_host::SetRoomHostUseCase;
pub use sync_timer::SyncTimerUseCase;

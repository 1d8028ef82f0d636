//! Server state and use case wiring.

use std::sync::Arc;

use studysync_shared::time::Clock;

use crate::{
    domain::{MessagePusher, MessageRepository, RoomRegistry, RoomRepository, TokenVerifier},
    usecase::{
        DisconnectParticipantUseCase, EndSessionUseCase, GetChatHistoryUseCase,
        GetRoomDetailUseCase, GetRoomsUseCase, GetUserListUseCase, JoinRoomUseCase,
        LeaveRoomUseCase, ResolveIdentityUseCase, SendMessageUseCase, SetRoomHostUseCase,
        SyncTimerUseCase, TeardownDelays,
    },
};

/// Shared application state
pub struct AppState {
    /// Room Registry（プロセス終了時に破棄する）
    pub registry: Arc<RoomRegistry>,
    /// MessagePusher（接続の登録に使う）
    pub message_pusher: Arc<dyn MessagePusher>,
    pub resolve_identity_usecase: Arc<ResolveIdentityUseCase>,
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    pub leave_room_usecase: Arc<LeaveRoomUseCase>,
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    pub set_room_host_usecase: Arc<SetRoomHostUseCase>,
    pub get_user_list_usecase: Arc<GetUserListUseCase>,
    pub sync_timer_usecase: Arc<SyncTimerUseCase>,
    pub send_message_usecase: Arc<SendMessageUseCase>,
    pub get_chat_history_usecase: Arc<GetChatHistoryUseCase>,
    pub end_session_usecase: Arc<EndSessionUseCase>,
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
}

/// AppState の依存関係
pub struct Dependencies {
    pub registry: Arc<RoomRegistry>,
    pub room_repository: Arc<dyn RoomRepository>,
    pub message_repository: Arc<dyn MessageRepository>,
    pub message_pusher: Arc<dyn MessagePusher>,
    pub token_verifier: Arc<dyn TokenVerifier>,
    pub clock: Arc<dyn Clock>,
    pub teardown_delays: TeardownDelays,
}

impl AppState {
    /// 依存関係から全ての UseCase を組み立てる
    pub fn new(deps: Dependencies) -> Self {
        let Dependencies {
            registry,
            room_repository,
            message_repository,
            message_pusher,
            token_verifier,
            clock,
            teardown_delays,
        } = deps;

        Self {
            resolve_identity_usecase: Arc::new(ResolveIdentityUseCase::new(token_verifier)),
            join_room_usecase: Arc::new(JoinRoomUseCase::new(
                registry.clone(),
                room_repository.clone(),
                message_repository.clone(),
                message_pusher.clone(),
                clock.clone(),
            )),
            leave_room_usecase: Arc::new(LeaveRoomUseCase::new(
                registry.clone(),
                room_repository.clone(),
                message_pusher.clone(),
                clock.clone(),
            )),
            disconnect_participant_usecase: Arc::new(DisconnectParticipantUseCase::new(
                registry.clone(),
                room_repository.clone(),
                message_pusher.clone(),
                clock.clone(),
            )),
            set_room_host_usecase: Arc::new(SetRoomHostUseCase::new(
                registry.clone(),
                room_repository.clone(),
            )),
            get_user_list_usecase: Arc::new(GetUserListUseCase::new(
                registry.clone(),
                message_pusher.clone(),
            )),
            sync_timer_usecase: Arc::new(SyncTimerUseCase::new(
                registry.clone(),
                message_pusher.clone(),
            )),
            send_message_usecase: Arc::new(SendMessageUseCase::new(
                message_repository.clone(),
                message_pusher.clone(),
                clock,
            )),
            get_chat_history_usecase: Arc::new(GetChatHistoryUseCase::new(
                message_repository.clone(),
                message_pusher.clone(),
            )),
            end_session_usecase: Arc::new(EndSessionUseCase::new(
                registry.clone(),
                room_repository,
                message_repository,
                message_pusher.clone(),
                teardown_delays,
            )),
            get_rooms_usecase: Arc::new(GetRoomsUseCase::new(registry.clone())),
            get_room_detail_usecase: Arc::new(GetRoomDetailUseCase::new(registry.clone())),
            registry,
            message_pusher,
        }
    }
}

//! UseCase: Room への参加
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinRoomUseCase::execute() メソッド
//! - 永続ストアでの Room 存在確認、メンバー追加、Host 選出、参加者への初期状態の送信
//!
//! ### なぜこのテストが必要か
//! - 再接続の競合で同じユーザーが重複しないことを保証する
//! - Host 選出の優先順位（明示的な要求 > 永続化された Host > 最初の参加者）を確認する
//!
//! ### どのような状況を想定しているか
//! - 正常系：最初の参加者が Host になり、空の履歴を受け取る
//! - 異常系：存在しない Room への参加は呼び出し元にだけ拒否が届く
//! - エッジケース：同じ認証済みユーザーが別の接続で参加し直す

use std::sync::Arc;

use studysync_shared::time::Clock;

use crate::domain::{
    Caller, MessagePusher, MessageRepository, OutboundEvent, RoomName, RoomPatch,
    RoomRegistry, RoomRepository, StableUserId, Timestamp, UserEntry, elect_host,
};

use super::{error::JoinError, get_chat_history::load_history, notify};

/// `joinRoom` の入力
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRequest {
    pub room: RoomName,
    /// クライアントが申告した表示名
    pub user_name: Option<String>,
    pub as_host: bool,
}

/// 参加の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedRoom {
    pub is_host: bool,
    pub user_count: usize,
}

pub struct JoinRoomUseCase {
    registry: Arc<RoomRegistry>,
    room_repository: Arc<dyn RoomRepository>,
    message_repository: Arc<dyn MessageRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl JoinRoomUseCase {
    pub fn new(
        registry: Arc<RoomRegistry>,
        room_repository: Arc<dyn RoomRepository>,
        message_repository: Arc<dyn MessageRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            room_repository,
            message_repository,
            message_pusher,
            clock,
        }
    }

    /// Room に参加する
    ///
    /// 永続ストアに Room が無い場合は呼び出し元にだけ `joinDenied` を送り、
    /// ブロードキャストは行わない。
    pub async fn execute(
        &self,
        caller: &Caller,
        request: JoinRequest,
    ) -> Result<JoinedRoom, JoinError> {
        let room = request.room;
        let pusher = self.message_pusher.as_ref();
        let _gate = self.registry.lock_room(&room).await;

        // 1. 永続ストアで Room の存在を確認
        let record = match self.room_repository.get_room(&room).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                tracing::warn!("Join denied: room '{}' does not exist", room);
                let event = OutboundEvent::JoinDenied {
                    reason: format!("Room \"{}\" does not exist!", room),
                };
                notify::to_caller(pusher, &caller.connection_id, event).await;
                return Err(JoinError::RoomNotFound(room.into_string()));
            }
            Err(e) => {
                tracing::error!("Failed to look up room '{}': {}", room, e);
                let event = OutboundEvent::JoinDenied {
                    reason: "Room not found or error occurred!".to_string(),
                };
                notify::to_caller(pusher, &caller.connection_id, event).await;
                return Err(JoinError::PersistenceFailure(e.to_string()));
            }
        };

        // 2. Room のチャンネルを購読
        pusher.subscribe(&room, &caller.connection_id).await;

        // 3. メンバーを追加し、Host を決める
        let now = Timestamp::new(self.clock.now_millis());
        let identity = &caller.identity;
        let entry = UserEntry {
            connection_id: caller.connection_id.clone(),
            stable_user_id: identity.stable_id.clone(),
            display_name: display_name_for(caller, request.user_name),
            is_authenticated: identity.is_authenticated,
            joined_at: now,
        };
        let (host, users, timer) = self
            .registry
            .get_or_create(&room, now, |state, _created| {
                let replaced = state.admit(entry);
                if replaced > 0 {
                    tracing::info!(
                        "User '{}' rejoined room '{}', replaced {} stale entr(ies)",
                        identity.stable_id,
                        state.name,
                        replaced
                    );
                }
                let host = elect_host(
                    request.as_host,
                    &identity.stable_id,
                    record.host.as_ref(),
                    &state.users,
                );
                state.host = host.clone();
                (host, state.users.clone(), state.timer.clone())
            })
            .await;

        // 4. メンバーと Host を永続ストアに反映（公開設定などは保持される）
        let mut patch = RoomPatch::new(room.clone())
            .users(users.clone())
            .last_active(now);
        if let Some(host) = host.clone() {
            patch = patch.host(host);
        }
        if let Err(e) = self.room_repository.save_room(patch).await {
            tracing::error!("Failed to save room '{}' after join: {}", room, e);
        }

        // 5. Host かどうかは保存後のレコードで判定する
        let is_host = self
            .persisted_host(&room)
            .await
            .or(host)
            .is_some_and(|host| host == identity.stable_id);
        if is_host {
            tracing::info!("User '{}' confirmed as host of room '{}'", identity.stable_id, room);
        }
        notify::to_caller(pusher, &caller.connection_id, OutboundEvent::HostStatus { is_host })
            .await;

        // 6. メンバー一覧・タイマー・Room 一覧の更新・履歴
        let user_count = users.len();
        notify::to_room(pusher, &room, OutboundEvent::RoomUsers(users)).await;
        notify::to_caller(pusher, &caller.connection_id, OutboundEvent::TimerUpdate(timer)).await;
        notify::room_changed(pusher, &room).await;

        let history = load_history(self.message_repository.as_ref(), &room).await;
        notify::to_caller(pusher, &caller.connection_id, OutboundEvent::ChatHistory(history))
            .await;

        tracing::info!(
            "User '{}' ({}) joined room '{}' ({} user(s))",
            identity.display_name,
            caller.connection_id,
            room,
            user_count
        );
        Ok(JoinedRoom {
            is_host,
            user_count,
        })
    }

    async fn persisted_host(&self, room: &RoomName) -> Option<StableUserId> {
        match self.room_repository.get_room(room).await {
            Ok(Some(record)) => record.host,
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Failed to re-read room '{}' for host status: {}", room, e);
                None
            }
        }
    }
}

/// 参加エントリの表示名
///
/// 認証済みの名前 > クライアント申告の名前 > Identity の表示名
fn display_name_for(caller: &Caller, user_name: Option<String>) -> String {
    let identity = &caller.identity;
    if identity.has_trusted_name() {
        return identity.display_name.clone();
    }
    user_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| identity.display_name.clone())
}

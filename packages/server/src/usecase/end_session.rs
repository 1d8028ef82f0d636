//! UseCase: セッション終了（endSession / roomDeleted）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - EndSessionUseCase::end_session() / room_deleted() メソッド
//! - Host の確認、`roomClosed` の通知、メモリ上の状態とメッセージの削除、
//!   遅延実行される削除確認と強制退出
//!
//! ### なぜこのテストが必要か
//! - Host 以外がセッションを終了できないことを保証する
//! - 遅延タスクが、その間に再作成された Room を壊さないことを確認する
//!
//! ### どのような状況を想定しているか
//! - 正常系：Host が終了し、全員に `roomClosed` が届いてレコードが削除される
//! - 異常系：Host 以外による終了、存在しない Room、永続ストアの障害
//! - エッジケース：遅延タスクの実行前に同名の Room が作り直される

use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;

use crate::domain::{
    Caller, MessagePusher, MessageRepository, OutboundEvent, RoomName, RoomRegistry,
    RoomRepository, Timestamp,
};

use super::{error::EndSessionError, notify};

/// Host 以外が endSession を送った場合のエラーメッセージ
pub const NOT_HOST_MESSAGE: &str = "Only the room host can end the session";

/// 遅延実行されるステップの待ち時間
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeardownDelays {
    /// レコード削除の確認までの時間
    pub verify: Duration,
    /// 残った購読者を強制的に外すまでの時間（クライアントが `roomClosed` を処理する猶予）
    pub evict: Duration,
}

impl Default for TeardownDelays {
    fn default() -> Self {
        Self {
            verify: Duration::from_millis(500),
            evict: Duration::from_millis(1000),
        }
    }
}

/// スケジュールされた遅延タスク
///
/// ハンドルを捨てても各タスクは実行される。
pub struct ScheduledTeardown {
    pub verification: JoinHandle<()>,
    pub eviction: JoinHandle<()>,
}

pub struct EndSessionUseCase {
    registry: Arc<RoomRegistry>,
    room_repository: Arc<dyn RoomRepository>,
    message_repository: Arc<dyn MessageRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    delays: TeardownDelays,
}

impl EndSessionUseCase {
    pub fn new(
        registry: Arc<RoomRegistry>,
        room_repository: Arc<dyn RoomRepository>,
        message_repository: Arc<dyn MessageRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        delays: TeardownDelays,
    ) -> Self {
        Self {
            registry,
            room_repository,
            message_repository,
            message_pusher,
            delays,
        }
    }

    /// Host によるセッション終了
    ///
    /// Room が見つからない場合や永続ストアの障害時も、Room 一覧の更新通知だけは送る。
    pub async fn end_session(
        &self,
        caller: &Caller,
        room: &RoomName,
    ) -> Result<ScheduledTeardown, EndSessionError> {
        let pusher = self.message_pusher.as_ref();
        let _gate = self.registry.lock_room(room).await;

        let record = match self.room_repository.get_room(room).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                tracing::warn!("endSession: room '{}' not found, it may already be deleted", room);
                notify::room_changed(pusher, room).await;
                return Err(EndSessionError::RoomNotFound(room.to_string()));
            }
            Err(e) => {
                tracing::error!("Error ending session for room '{}': {}", room, e);
                notify::room_changed(pusher, room).await;
                return Err(EndSessionError::PersistenceFailure(e.to_string()));
            }
        };

        let identity = &caller.identity;
        if record.host.as_ref() != Some(&identity.stable_id) {
            tracing::warn!(
                "endSession denied: '{}' is not the host of room '{}'",
                identity.stable_id,
                room
            );
            let event = OutboundEvent::Error {
                message: NOT_HOST_MESSAGE.to_string(),
            };
            notify::to_caller(pusher, &caller.connection_id, event).await;
            return Err(EndSessionError::Unauthorized);
        }

        let reason = format!("{} has ended this study session", identity.display_name);
        let teardown = self
            .teardown(room, reason, identity.stable_id.to_string(), Some(record.created_at))
            .await;
        Ok(teardown)
    }

    /// Room 削除の通知（権限の確認は上流で済んでいる前提）
    pub async fn room_deleted(&self, caller: &Caller, room: &RoomName) -> ScheduledTeardown {
        let _gate = self.registry.lock_room(room).await;

        let observed = match self.room_repository.get_room(room).await {
            Ok(record) => record.map(|record| record.created_at),
            Err(e) => {
                tracing::warn!("roomDeleted: failed to look up room '{}': {}", room, e);
                None
            }
        };

        let identity = &caller.identity;
        let reason = format!("Room has been deleted by {}", identity.display_name);
        self.teardown(room, reason, identity.stable_id.to_string(), observed)
            .await
    }

    /// 共通の終了処理。呼び出し元は Room のゲートを保持していること
    ///
    /// `observed` は終了時点で永続ストアにあったレコードの作成時刻。
    async fn teardown(
        &self,
        room: &RoomName,
        reason: String,
        host_id: String,
        observed: Option<Timestamp>,
    ) -> ScheduledTeardown {
        let pusher = self.message_pusher.as_ref();

        // 1. 購読者全員に終了を通知
        let event = OutboundEvent::RoomClosed {
            reason,
            host_id,
            room_name: room.clone(),
        };
        notify::to_room(pusher, room, event).await;

        // 2. メモリ上の状態を破棄
        if let Some(state) = self.registry.remove(room).await {
            tracing::info!(
                "Room '{}' closed, {} user(s) cleared from memory",
                room,
                state.users.len()
            );
        }

        // 3. 永続化されたメッセージを削除
        match self.message_repository.delete_messages(room).await {
            Ok(count) => tracing::info!("Deleted {} message(s) of room '{}'", count, room),
            Err(e) => {
                tracing::error!("Failed to delete messages of room '{}': {}", room, e);
                notify::room_changed(pusher, room).await;
            }
        }

        ScheduledTeardown {
            verification: self.schedule_verification(room.clone(), observed),
            eviction: self.schedule_eviction(room.clone()),
        }
    }

    /// 遅延後にレコードがまだ残っていれば削除する
    ///
    /// 作成時刻が終了時点のものと異なるレコードは、作り直された別の Room として残す。
    fn schedule_verification(&self, room: RoomName, observed: Option<Timestamp>) -> JoinHandle<()> {
        let registry = self.registry.clone();
        let room_repository = self.room_repository.clone();
        let delay = self.delays.verify;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _gate = registry.lock_room(&room).await;

            let record = match room_repository.get_room(&room).await {
                Ok(Some(record)) => record,
                Ok(None) => {
                    tracing::debug!("Deletion of room '{}' verified", room);
                    return;
                }
                Err(e) => {
                    tracing::error!("Error verifying deletion of room '{}': {}", room, e);
                    return;
                }
            };
            if Some(record.created_at) != observed {
                tracing::info!("Room '{}' was recreated, keeping its record", room);
                return;
            }

            tracing::warn!("Room '{}' still exists after session end, deleting", room);
            match room_repository.delete_room(&room).await {
                Ok(count) if count > 0 => tracing::info!("Room record '{}' deleted", room),
                Ok(_) => tracing::error!("Deletion of room '{}' removed nothing", room),
                Err(e) => tracing::error!("Failed to delete room '{}': {}", room, e),
            }
        })
    }

    /// 遅延後に残った購読者を Room のチャンネルから外し、Room 一覧の更新を通知する
    ///
    /// 作り直された Room のメンバーになっている接続は外さない。
    fn schedule_eviction(&self, room: RoomName) -> JoinHandle<()> {
        let registry = self.registry.clone();
        let message_pusher = self.message_pusher.clone();
        let delay = self.delays.evict;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let _gate = registry.lock_room(&room).await;
                let members = match registry.snapshot(&room).await {
                    Some(state) => {
                        tracing::info!(
                            "Room '{}' was recreated (generation {}), sparing its members",
                            room,
                            state.generation
                        );
                        state.connection_ids()
                    }
                    None => Vec::new(),
                };

                let mut evicted = 0;
                for connection_id in message_pusher.subscribers(&room).await {
                    if !members.contains(&connection_id) {
                        message_pusher.unsubscribe(&room, &connection_id).await;
                        evicted += 1;
                    }
                }
                tracing::info!("Evicted {} connection(s) from closed room '{}'", evicted, room);
            }
            notify::room_changed(message_pusher.as_ref(), &room).await;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChatMessage, MockRoomRepository, PersistedRoom, RepositoryError};
    use crate::usecase::{
        JoinRequest, JoinRoomUseCase,
        test_support::{Fixture, NOW, drain, member, named, room},
    };

    const FAST: TeardownDelays = TeardownDelays {
        verify: Duration::from_millis(10),
        evict: Duration::from_millis(20),
    };

    fn usecase(fixture: &Fixture, delays: TeardownDelays) -> EndSessionUseCase {
        EndSessionUseCase::new(
            fixture.registry.clone(),
            fixture.rooms.clone(),
            fixture.messages.clone(),
            fixture.pusher.clone(),
            delays,
        )
    }

    async fn join(fixture: &Fixture, caller: &Caller, name: &str) {
        JoinRoomUseCase::new(
            fixture.registry.clone(),
            fixture.rooms.clone(),
            fixture.messages.clone(),
            fixture.pusher.clone(),
            fixture.clock.clone(),
        )
        .execute(
            caller,
            JoinRequest {
                room: room(name),
                user_name: None,
                as_host: false,
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_host_ends_session() {
        // テスト項目: Host が終了すると全員に roomClosed が届き、Room が片付けられる
        // given (前提条件):
        let fixture = Fixture::new();
        fixture.seed_room("X").await;
        let alice = member("c1", "alice", "Alice");
        let bob = member("c2", "bob", "Bob");
        let mut alice_rx = fixture.connect(&alice).await;
        let mut bob_rx = fixture.connect(&bob).await;
        join(&fixture, &alice, "X").await;
        join(&fixture, &bob, "X").await;
        fixture
            .messages
            .save_message(ChatMessage {
                room: room("X"),
                user: "Alice".to_string(),
                user_id: "alice".to_string(),
                text: "bye".to_string(),
                is_authenticated: true,
                timestamp: Timestamp::new(NOW),
            })
            .await
            .unwrap();
        drain(&mut alice_rx);
        drain(&mut bob_rx);

        // when (操作):
        let teardown = usecase(&fixture, FAST)
            .end_session(&alice, &room("X"))
            .await
            .unwrap();

        // then (期待する結果):
        for frames in [drain(&mut alice_rx), drain(&mut bob_rx)] {
            let closed = named(&frames, "roomClosed");
            assert_eq!(closed.len(), 1);
            assert_eq!(
                closed[0]["data"],
                serde_json::json!({
                    "reason": "Alice has ended this study session",
                    "hostId": "alice",
                    "roomName": "X"
                })
            );
        }
        assert!(!fixture.registry.contains(&room("X")).await);
        assert!(fixture.messages.get_room_messages(&room("X")).await.unwrap().is_empty());

        teardown.verification.await.unwrap();
        assert_eq!(fixture.rooms.get_room(&room("X")).await.unwrap(), None);

        teardown.eviction.await.unwrap();
        assert!(fixture.pusher.subscribers(&room("X")).await.is_empty());
        assert_eq!(named(&drain(&mut bob_rx), "roomChanged").len(), 1);
    }

    #[tokio::test]
    async fn test_non_host_cannot_end_session() {
        // テスト項目: Host 以外による終了は呼び出し元へのエラーだけで、Room は残る
        // given (前提条件):
        let fixture = Fixture::new();
        fixture.seed_room("X").await;
        let alice = member("c1", "alice", "Alice");
        let bob = member("c2", "bob", "Bob");
        let mut alice_rx = fixture.connect(&alice).await;
        let mut bob_rx = fixture.connect(&bob).await;
        join(&fixture, &alice, "X").await;
        join(&fixture, &bob, "X").await;
        drain(&mut alice_rx);
        drain(&mut bob_rx);

        // when (操作):
        let result = usecase(&fixture, FAST).end_session(&bob, &room("X")).await;

        // then (期待する結果):
        assert!(matches!(result, Err(EndSessionError::Unauthorized)));
        let frames = drain(&mut bob_rx);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["event"], "error");
        assert_eq!(frames[0]["data"]["message"], NOT_HOST_MESSAGE);
        assert!(drain(&mut alice_rx).is_empty());
        let state = fixture.registry.snapshot(&room("X")).await.unwrap();
        assert_eq!(state.users.len(), 2);
        assert!(fixture.rooms.get_room(&room("X")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_missing_room_still_notifies_room_list() {
        // テスト項目: 存在しない Room の終了は RoomNotFound になり、Room 一覧の更新は送られる
        // given (前提条件):
        let fixture = Fixture::new();
        let alice = member("c1", "alice", "Alice");
        let mut rx = fixture.connect(&alice).await;

        // when (操作):
        let result = usecase(&fixture, FAST).end_session(&alice, &room("ghost")).await;

        // then (期待する結果):
        assert!(matches!(result, Err(EndSessionError::RoomNotFound(_))));
        let frames = drain(&mut rx);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["event"], "roomChanged");
    }

    #[tokio::test]
    async fn test_lookup_failure_falls_back_to_room_changed() {
        // テスト項目: 永続ストアの障害時も Room 一覧の更新だけは送られる
        // given (前提条件):
        let fixture = Fixture::new();
        let mut repository = MockRoomRepository::new();
        repository
            .expect_get_room()
            .returning(|_| Err(RepositoryError::Storage("unreachable".to_string())));
        let usecase = EndSessionUseCase::new(
            fixture.registry.clone(),
            Arc::new(repository),
            fixture.messages.clone(),
            fixture.pusher.clone(),
            FAST,
        );
        let alice = member("c1", "alice", "Alice");
        let mut rx = fixture.connect(&alice).await;

        // when (操作):
        let result = usecase.end_session(&alice, &room("X")).await;

        // then (期待する結果):
        assert!(matches!(result, Err(EndSessionError::PersistenceFailure(_))));
        assert_eq!(named(&drain(&mut rx), "roomChanged").len(), 1);
    }

    #[tokio::test]
    async fn test_deferred_steps_spare_recreated_room() {
        // テスト項目: 遅延タスクの実行前に作り直された Room のレコードとメンバーは残る
        // given (前提条件):
        let fixture = Fixture::new();
        fixture.seed_room("X").await;
        let alice = member("c1", "alice", "Alice");
        let bob = member("c2", "bob", "Bob");
        let _alice_rx = fixture.connect(&alice).await;
        let _bob_rx = fixture.connect(&bob).await;
        join(&fixture, &alice, "X").await;
        join(&fixture, &bob, "X").await;
        let delays = TeardownDelays {
            verify: Duration::from_millis(100),
            evict: Duration::from_millis(150),
        };
        let teardown = usecase(&fixture, delays)
            .end_session(&alice, &room("X"))
            .await
            .unwrap();

        // when (操作): 同名の Room を作り直し、alice だけが参加し直す
        fixture
            .rooms
            .insert(PersistedRoom::new(room("X"), Timestamp::new(NOW)))
            .await;
        join(&fixture, &alice, "X").await;
        teardown.verification.await.unwrap();
        teardown.eviction.await.unwrap();

        // then (期待する結果):
        assert!(fixture.rooms.get_room(&room("X")).await.unwrap().is_some());
        let subscribers = fixture.pusher.subscribers(&room("X")).await;
        assert_eq!(subscribers, vec![alice.connection_id.clone()]);
        assert!(fixture.registry.contains(&room("X")).await);
    }

    #[tokio::test]
    async fn test_room_deleted_skips_host_check() {
        // テスト項目: roomDeleted は Host の確認をせずに Room を閉じる
        // given (前提条件):
        let fixture = Fixture::new();
        fixture.seed_room("X").await;
        let alice = member("c1", "alice", "Alice");
        let bob = member("c2", "bob", "Bob");
        let mut alice_rx = fixture.connect(&alice).await;
        let _bob_rx = fixture.connect(&bob).await;
        join(&fixture, &alice, "X").await;
        join(&fixture, &bob, "X").await;
        drain(&mut alice_rx);

        // when (操作):
        let teardown = usecase(&fixture, FAST).room_deleted(&bob, &room("X")).await;

        // then (期待する結果):
        let frames = drain(&mut alice_rx);
        let closed = named(&frames, "roomClosed");
        assert_eq!(closed[0]["data"]["reason"], "Room has been deleted by Bob");
        assert_eq!(closed[0]["data"]["hostId"], "bob");
        assert!(!fixture.registry.contains(&room("X")).await);
        teardown.verification.await.unwrap();
        teardown.eviction.await.unwrap();
        assert_eq!(fixture.rooms.get_room(&room("X")).await.unwrap(), None);
    }
}

//! UseCase: 参加者切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//! - 切断した接続を、Registry が把握している全ての Room から取り除く処理
//!
//! ### なぜこのテストが必要か
//! - 1 つの接続が複数の Room に参加している場合も全て片付くことを保証する
//! - 再接続後に届いた古い接続の切断が、新しいエントリを消さないことを確認する
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加者が残る Room ではメンバー一覧が再送される
//! - 正常系：最後の参加者の切断で Room が削除される
//! - エッジケース：同じユーザーが別の接続で参加し直した後に古い接続が切断される

use std::sync::Arc;

use studysync_shared::time::Clock;

use crate::domain::{ConnectionId, MessagePusher, RoomRegistry, RoomRepository, Timestamp};

use super::{notify, reconcile};

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    registry: Arc<RoomRegistry>,
    room_repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl DisconnectParticipantUseCase {
    pub fn new(
        registry: Arc<RoomRegistry>,
        room_repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            room_repository,
            message_pusher,
            clock,
        }
    }

    /// 参加者切断を実行
    ///
    /// 接続に記録された Room だけでなく、Registry が把握している全ての Room を走査する。
    /// メンバーも購読者もいない Room が見つかった場合はついでに削除する。
    ///
    /// # Returns
    ///
    /// 接続が取り除かれた Room の数
    pub async fn execute(&self, connection_id: &ConnectionId) -> usize {
        let pusher = self.message_pusher.as_ref();

        // 1. MessagePusher からクライアントを削除（全てのチャンネルから外れる）
        let subscribed = pusher.unregister_client(connection_id).await;
        tracing::debug!(
            "Client '{}' was subscribed to {} room(s)",
            connection_id,
            subscribed.len()
        );

        // 2. Room ごとにメンバーシップを照合
        let mut affected = 0;
        for room in self.registry.room_names().await {
            let _gate = self.registry.lock_room(&room).await;
            let Some(state) = self.registry.snapshot(&room).await else {
                continue;
            };

            if state.has_connection(connection_id) {
                let now = Timestamp::new(self.clock.now_millis());
                reconcile::depart(
                    &self.registry,
                    self.room_repository.as_ref(),
                    pusher,
                    &room,
                    connection_id,
                    now,
                )
                .await;
                notify::room_changed(pusher, &room).await;
                affected += 1;
            } else if state.users.is_empty() && pusher.subscribers(&room).await.is_empty() {
                self.registry.remove(&room).await;
                tracing::info!("Pruned stale room '{}' with no members", room);
                notify::room_changed(pusher, &room).await;
            }
        }

        tracing::info!(
            "Client '{}' disconnected and removed from {} room(s)",
            connection_id,
            affected
        );
        affected
    }
}

//! 退出・切断で共有するメンバーシップの照合
//!
//! 呼び出し元は対象 Room のゲートを保持していること。

use crate::domain::{
    ConnectionId, MessagePusher, Occupancy, OutboundEvent, RoomName, RoomPatch, RoomRegistry,
    RoomRepository, Timestamp, UserEntry,
};

use super::notify;

/// 照合の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Reconciled {
    /// Registry が Room を把握していない
    Untracked,
    /// 両方の信号が空を示したため Room を削除した
    Removed,
    /// Room は残っている
    Remaining { users: usize },
}

/// 接続を Room から外し、空になったかを 2 つの信号から判定して永続ストアに反映する
///
/// 1. 接続 ID が一致するエントリを取り除く（何度呼んでも安全）
/// 2. 記録されたメンバーを実際の購読者で絞り込む
/// 3. メンバー数と購読者数の両方が 0 の場合だけ Room を削除する
/// 4. 永続ストアのメンバー一覧と最終アクティブ時刻を更新する
pub(crate) async fn depart(
    registry: &RoomRegistry,
    room_repository: &dyn RoomRepository,
    message_pusher: &dyn MessagePusher,
    room: &RoomName,
    connection_id: &ConnectionId,
    now: Timestamp,
) -> Reconciled {
    let live = message_pusher.subscribers(room).await;
    let Some((removed, pruned, users)) = registry
        .update(room, |state| {
            let removed = state.remove_connection(connection_id);
            let pruned = state.retain_connected(&live);
            (removed, pruned, state.users.clone())
        })
        .await
    else {
        return Reconciled::Untracked;
    };

    if pruned > 0 {
        tracing::info!(
            "Room '{}': pruned {} entr(ies) without a live connection",
            room,
            pruned
        );
    }
    tracing::debug!(
        "Room '{}': '{}' departed (removed: {}, users: {}, subscribers: {})",
        room,
        connection_id,
        removed,
        users.len(),
        live.len()
    );

    let outcome = match Occupancy::assess(users.len(), live.len()) {
        Occupancy::Empty => {
            registry.remove(room).await;
            tracing::info!("Room '{}' is empty, in-memory state cleaned up", room);
            Reconciled::Removed
        }
        Occupancy::Occupied => {
            let count = users.len();
            notify::to_room(message_pusher, room, OutboundEvent::RoomUsers(users.clone())).await;
            Reconciled::Remaining { users: count }
        }
        Occupancy::Inconsistent { users: count, subscribers } => {
            tracing::warn!(
                "Room '{}' is inconsistent (users: {}, subscribers: {}), keeping it",
                room,
                count,
                subscribers
            );
            notify::to_room(message_pusher, room, OutboundEvent::RoomUsers(users.clone())).await;
            Reconciled::Remaining { users: count }
        }
    };

    persist_members(room_repository, room, users, now).await;
    outcome
}

/// 永続ストアのメンバー一覧を更新する。レコードが無い場合は何もしない
pub(crate) async fn persist_members(
    room_repository: &dyn RoomRepository,
    room: &RoomName,
    users: Vec<UserEntry>,
    now: Timestamp,
) {
    match room_repository.get_room(room).await {
        Ok(Some(_)) => {
            let patch = RoomPatch::new(room.clone()).users(users).last_active(now);
            if let Err(e) = room_repository.save_room(patch).await {
                tracing::error!("Failed to update members of room '{}': {}", room, e);
            }
        }
        Ok(None) => {
            tracing::debug!("Room '{}' has no persisted record, skipping member update", room);
        }
        Err(e) => tracing::error!("Failed to look up room '{}': {}", room, e),
    }
}

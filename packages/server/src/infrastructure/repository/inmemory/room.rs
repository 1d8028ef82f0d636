//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。
//!
//! ## 技術的負債
//!
//! 現在、ドメインモデル（`PersistedRoom`）を直接ストレージとして使用しています。
//! これは InMemory 実装では許容される妥協ですが、DBMS を実装する際は
//! 行データとドメインモデルの変換層が必要になります。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{PersistedRoom, RepositoryError, RoomName, RoomPatch, RoomRepository};

/// インメモリ Room Repository 実装
#[derive(Default)]
pub struct InMemoryRoomRepository {
    rooms: Mutex<HashMap<RoomName, PersistedRoom>>,
}

impl InMemoryRoomRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Room レコードを作成（既存のレコードは置き換える）
    ///
    /// Room の作成は本来 REST API 側の責務。起動時のシードとテストで使う。
    pub async fn insert(&self, room: PersistedRoom) {
        let mut rooms = self.rooms.lock().await;
        rooms.insert(room.name.clone(), room);
    }

    pub async fn count(&self) -> usize {
        self.rooms.lock().await.len()
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn get_room(&self, name: &RoomName) -> Result<Option<PersistedRoom>, RepositoryError> {
        let rooms = self.rooms.lock().await;
        Ok(rooms.get(name).cloned())
    }

    async fn save_room(&self, patch: RoomPatch) -> Result<(), RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        let record = rooms
            .get_mut(&patch.name)
            .ok_or_else(|| RepositoryError::RoomNotFound(patch.name.to_string()))?;
        record.apply(patch);
        Ok(())
    }

    async fn delete_room(&self, name: &RoomName) -> Result<u64, RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        Ok(u64::from(rooms.remove(name).is_some()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{StableUserId, Timestamp};

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - InMemoryRoomRepository の取得・部分更新・削除
    //
    // 【なぜこのテストが必要か】
    // - 部分更新が公開設定・パスワードを上書きしないことを保証する
    // ========================================

    fn name(value: &str) -> RoomName {
        RoomName::new(value.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_get_missing_room_returns_none() {
        // テスト項目: 存在しない Room の取得は None を返す
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();

        // when (操作):
        let result = repo.get_room(&name("ghost")).await;

        // then (期待する結果):
        assert_eq!(result, Ok(None));
    }

    #[tokio::test]
    async fn test_save_room_preserves_privacy_fields() {
        // テスト項目: 部分更新の保存で公開設定とパスワードが保持される
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();
        let mut record = PersistedRoom::new(name("focus"), Timestamp::new(0));
        record.is_public = false;
        record.password = Some("secret".to_string());
        repo.insert(record).await;

        // when (操作):
        let patch =
            RoomPatch::new(name("focus")).host(StableUserId::new("alice".to_string()).unwrap());
        repo.save_room(patch).await.unwrap();

        // then (期待する結果):
        let saved = repo.get_room(&name("focus")).await.unwrap().unwrap();
        assert!(!saved.is_public);
        assert_eq!(saved.password.as_deref(), Some("secret"));
        assert_eq!(saved.host.unwrap().as_str(), "alice");
    }

    #[tokio::test]
    async fn test_save_missing_room_is_not_found() {
        // テスト項目: レコードの無い Room への保存は RoomNotFound になり、レコードは作られない
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();

        // when (操作):
        let patch = RoomPatch::new(name("ghost")).last_active(Timestamp::new(1_000));
        let result = repo.save_room(patch).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RepositoryError::RoomNotFound("ghost".to_string()))
        );
        assert_eq!(repo.count().await, 0);
    }

    #[tokio::test]
    async fn test_delete_room_reports_count() {
        // テスト項目: 削除件数が返され、2 回目の削除は 0 件になる
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();
        repo.insert(PersistedRoom::new(name("focus"), Timestamp::new(0)))
            .await;

        // when (操作):
        let first = repo.delete_room(&name("focus")).await.unwrap();
        let second = repo.delete_room(&name("focus")).await.unwrap();

        // then (期待する結果):
        assert_eq!(first, 1);
        assert_eq!(second, 0);
        assert_eq!(repo.count().await, 0);
    }
}

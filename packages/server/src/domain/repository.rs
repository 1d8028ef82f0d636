//! Repository trait 定義
//!
//! 永続ストアへのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! Room レコードの作成・一覧・削除 API や接続のライフサイクルはこのサーバーの外側が持ち、
//! ここではリアルタイム処理が必要とする操作だけを扱います。

use async_trait::async_trait;

use super::{ChatMessage, PersistedRoom, RepositoryError, RoomName, RoomPatch};

/// Room Repository trait
///
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Room レコードを取得（存在しなければ `None`）
    async fn get_room(&self, name: &RoomName) -> Result<Option<PersistedRoom>, RepositoryError>;

    /// Room レコードに部分更新を保存
    ///
    /// パッチに含まれないフィールド（公開設定・パスワードなど）は保持しなければならない。
    /// レコードが無い場合は作成せず `RepositoryError::RoomNotFound` を返す。
    async fn save_room(&self, patch: RoomPatch) -> Result<(), RepositoryError>;

    /// Room レコードを削除し、削除した件数を返す
    async fn delete_room(&self, name: &RoomName) -> Result<u64, RepositoryError>;
}

/// Message Repository trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// メッセージを保存
    async fn save_message(&self, message: ChatMessage) -> Result<(), RepositoryError>;

    /// Room の全メッセージを古い順に取得
    async fn get_room_messages(&self, room: &RoomName) -> Result<Vec<ChatMessage>, RepositoryError>;

    /// Room の全メッセージを削除し、削除した件数を返す
    async fn delete_messages(&self, room: &RoomName) -> Result<u64, RepositoryError>;
}

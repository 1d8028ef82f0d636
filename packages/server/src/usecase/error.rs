//! UseCase 層のエラー定義

use thiserror::Error;

/// 接続時のトークン検証エラー（接続は拒否される）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("token missing")]
    TokenMissing,
    #[error("token invalid")]
    TokenInvalid,
}

/// Room 参加のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("room '{0}' does not exist")]
    RoomNotFound(String),
    #[error("failed to look up room: {0}")]
    PersistenceFailure(String),
}

/// セッション終了のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndSessionError {
    #[error("room '{0}' not found")]
    RoomNotFound(String),
    #[error("only the room host can end the session")]
    Unauthorized,
    #[error("failed to end session: {0}")]
    PersistenceFailure(String),
}

/// Room 詳細取得のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomDetailError {
    #[error("room not found")]
    RoomNotFound,
}

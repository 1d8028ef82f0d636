//! ドメイン層のエラー定義

use thiserror::Error;

/// Value Object の生成エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("room name must not be empty")]
    RoomNameEmpty,
    #[error("connection id must not be empty")]
    ConnectionIdEmpty,
    #[error("stable user id must not be empty")]
    StableUserIdEmpty,
}

/// 永続ストアへのアクセスエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("room '{0}' not found")]
    RoomNotFound(String),
    #[error("storage failure: {0}")]
    Storage(String),
}

/// メッセージ送信（Broadcast Bus）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("client '{0}' not found")]
    ClientNotFound(String),
    #[error("failed to push message: {0}")]
    PushFailed(String),
    #[error("failed to serialize event: {0}")]
    Serialization(String),
}

/// トークン検証のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token missing")]
    Missing,
    #[error("token invalid: {0}")]
    Invalid(String),
}

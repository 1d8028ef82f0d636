//! トークン検証の trait 定義

use super::TokenError;

/// 検証済みトークンから取り出した主体の情報
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSubject {
    pub user_id: Option<String>,
    pub name: Option<String>,
}

/// 署名付きトークンの検証
///
/// 署名と有効期限を検証し、失敗した場合は接続を拒否させる。
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<TokenSubject, TokenError>;
}

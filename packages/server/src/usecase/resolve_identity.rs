//! UseCase: 接続時の身元解決
//!
//! 接続ごとに 1 度だけ実行され、失敗した場合は接続そのものを拒否します。
//! トランスポート層での匿名フォールバックは行いません。

use std::sync::Arc;

use crate::domain::{
    ANONYMOUS_NAME, ConnectionId, Identity, StableUserId, TokenError, TokenVerifier,
};

use super::error::AuthError;

pub struct ResolveIdentityUseCase {
    verifier: Arc<dyn TokenVerifier>,
}

impl ResolveIdentityUseCase {
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { verifier }
    }

    /// トークンを検証して Identity を作る
    ///
    /// トークンに subject が無い場合は接続 ID を StableUserId として使い、未認証扱いにする。
    pub fn execute(
        &self,
        token: Option<&str>,
        connection_id: &ConnectionId,
    ) -> Result<Identity, AuthError> {
        let token = token
            .filter(|token| !token.trim().is_empty())
            .ok_or(AuthError::TokenMissing)?;

        let subject = self.verifier.verify(token).map_err(|e| match e {
            TokenError::Missing => AuthError::TokenMissing,
            TokenError::Invalid(_) => AuthError::TokenInvalid,
        })?;

        let stable_id = subject.user_id.and_then(|id| StableUserId::new(id).ok());
        let identity = match stable_id {
            Some(stable_id) => Identity {
                stable_id,
                display_name: subject.name.unwrap_or_else(|| ANONYMOUS_NAME.to_string()),
                is_authenticated: true,
            },
            None => Identity::anonymous(connection_id, subject.name),
        };

        tracing::debug!(
            "Resolved identity '{}' ({}) for connection '{}'",
            identity.display_name,
            identity.stable_id,
            connection_id
        );
        Ok(identity)
    }
}

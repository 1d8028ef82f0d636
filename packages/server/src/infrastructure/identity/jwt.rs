//! HS256 JWT によるトークン検証
//!
//! 共有シークレットで署名されたトークンを検証し、`user.id` / `sub` と `user.name` を取り出す。

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::domain::{TokenError, TokenSubject, TokenVerifier};

/// トークンに含まれるユーザー情報
#[derive(Debug, Deserialize)]
struct UserClaims {
    id: Option<String>,
    name: Option<String>,
    #[allow(dead_code)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Claims {
    user: Option<UserClaims>,
    sub: Option<String>,
    #[allow(dead_code)]
    exp: u64,
}

pub struct JwtTokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtTokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

impl TokenVerifier for JwtTokenVerifier {
    fn verify(&self, token: &str) -> Result<TokenSubject, TokenError> {
        if token.trim().is_empty() {
            return Err(TokenError::Missing);
        }

        let data = jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| {
                tracing::debug!("JWT validation failed: {e}");
                TokenError::Invalid(e.to_string())
            })?;

        let claims = data.claims;
        let (user_id, name) = match claims.user {
            Some(user) => (user.id, user.name),
            None => (None, None),
        };

        Ok(TokenSubject {
            user_id: user_id.or(claims.sub).filter(|id| !id.is_empty()),
            name: name.filter(|name| !name.is_empty()),
        })
    }
}

//! トークン検証の実装

mod jwt;

pub use jwt::JwtTokenVerifier;

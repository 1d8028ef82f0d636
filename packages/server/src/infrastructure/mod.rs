//! Infrastructure layer
//!
//! ドメイン層の trait の具体的な実装と、ワイヤ形式の DTO を置きます。

pub mod dto;
pub mod identity;
pub mod message_pusher;
pub mod repository;

//! InMemory Repository 実装
//!
//! 永続ストアの代役。プロセスの再起動で内容は失われます。

mod message;
mod room;

pub use message::InMemoryMessageRepository;
pub use room::InMemoryRoomRepository;

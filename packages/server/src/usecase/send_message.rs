//! UseCase: チャットメッセージの中継
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - 送信者名の決定、Room へのブロードキャスト、永続化
//!
//! ### なぜこのテストが必要か
//! - 認証済みの接続ではクライアントが申告した名前が使われないことを保証する
//! - 永続化に失敗してもブロードキャストが届くことを確認する
//!
//! ### どのような状況を想定しているか
//! - 正常系：送信者を含む Room の全購読者にメッセージが届く
//! - 異常系：永続化の失敗
//! - エッジケース：未認証の接続からのメッセージ

use std::sync::Arc;

use studysync_shared::time::Clock;

use crate::domain::{
    Caller, ChatMessage, MessagePusher, MessageRepository, OutboundEvent, RoomName, Timestamp,
};

use super::notify;

/// クライアントが送ってきたメッセージ
///
/// `user`・`user_id`・`is_authenticated` は接続が未認証の場合にだけ参照される。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatDraft {
    pub text: String,
    pub user: Option<String>,
    pub user_id: Option<String>,
    pub is_authenticated: bool,
}

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    message_repository: Arc<dyn MessageRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl SendMessageUseCase {
    pub fn new(
        message_repository: Arc<dyn MessageRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            message_repository,
            message_pusher,
            clock,
        }
    }

    /// メッセージを Room の全購読者（送信者を含む）に送り、その後に永続化する
    ///
    /// 永続化の失敗はログに残すだけで、ブロードキャストは取り消さない。
    pub async fn execute(&self, caller: &Caller, room: &RoomName, draft: ChatDraft) -> ChatMessage {
        let (user, user_id, is_authenticated) = resolve_author(caller, &draft);
        let message = ChatMessage {
            room: room.clone(),
            user,
            user_id,
            text: draft.text,
            is_authenticated,
            timestamp: Timestamp::new(self.clock.now_millis()),
        };

        tracing::debug!(
            "Message from '{}' ({}) in room '{}'",
            message.user,
            message.user_id,
            room
        );
        notify::to_room(
            self.message_pusher.as_ref(),
            room,
            OutboundEvent::ChatMessage(message.clone()),
        )
        .await;

        if let Err(e) = self.message_repository.save_message(message.clone()).await {
            tracing::error!("Failed to save message in room '{}': {}", room, e);
        }
        message
    }
}

/// 送信者の表示名・ID・認証状態を決める
///
/// 1. 接続の Identity が認証済みならそれを使う
/// 2. クライアントが認証済みと申告し、ID を持っていればそれを使う
/// 3. それ以外は申告名（無ければ Identity の表示名）と接続 ID
fn resolve_author(caller: &Caller, draft: &ChatDraft) -> (String, String, bool) {
    let identity = &caller.identity;
    if identity.is_authenticated {
        return (
            identity.display_name.clone(),
            identity.stable_id.to_string(),
            true,
        );
    }

    let declared_user = draft.user.clone().filter(|user| !user.is_empty());
    if draft.is_authenticated
        && let Some(user_id) = draft.user_id.clone().filter(|id| !id.is_empty())
    {
        let user = declared_user.unwrap_or_else(|| identity.display_name.clone());
        return (user, user_id, true);
    }

    let user = declared_user.unwrap_or_else(|| identity.display_name.clone());
    (user, caller.connection_id.to_string(), false)
}

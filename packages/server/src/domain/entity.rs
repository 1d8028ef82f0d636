//! Entities
//!
//! Room のメンバーシップ、タイマー、チャットメッセージ、永続化される Room レコードを定義します。

use std::fmt;

use tokio::task::AbortHandle;

use super::value_object::{ConnectionId, RoomName, StableUserId, Timestamp};

/// 認証されていないユーザーに使われる表示名
pub const ANONYMOUS_NAME: &str = "Anonymous User";

/// 接続ごとに解決されるユーザーの身元
///
/// 接続の生存期間中は不変。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub stable_id: StableUserId,
    pub display_name: String,
    pub is_authenticated: bool,
}

impl Identity {
    /// トークンに subject が無い場合の接続単位のフォールバック
    pub fn anonymous(connection_id: &ConnectionId, display_name: Option<String>) -> Self {
        Self {
            stable_id: StableUserId::from(connection_id),
            display_name: display_name.unwrap_or_else(|| ANONYMOUS_NAME.to_string()),
            is_authenticated: false,
        }
    }

    /// 認証済みで、プレースホルダ以外の名前を持っているか
    pub fn has_trusted_name(&self) -> bool {
        self.is_authenticated && self.display_name != ANONYMOUS_NAME
    }
}

/// イベントを送ってきた接続
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub connection_id: ConnectionId,
    pub identity: Identity,
}

impl Caller {
    pub fn new(connection_id: ConnectionId, identity: Identity) -> Self {
        Self {
            connection_id,
            identity,
        }
    }
}

/// Room のメンバーシップレコード
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserEntry {
    pub connection_id: ConnectionId,
    pub stable_user_id: StableUserId,
    pub display_name: String,
    pub is_authenticated: bool,
    pub joined_at: Timestamp,
}

/// 共有カウントダウンタイマーの状態
///
/// サーバーは時間を進めない。`seconds` は最後にクライアントが報告した値。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerState {
    pub running: bool,
    pub seconds: u32,
    pub label: String,
}

/// Room が空かどうかの判定結果
///
/// 記録されたメンバー数とトランスポートの購読者数という独立した 2 つのシグナルから導く。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupancy {
    Occupied,
    Empty,
    /// 2 つのシグナルが食い違っている
    Inconsistent { users: usize, subscribers: usize },
}

impl Occupancy {
    pub fn assess(users: usize, subscribers: usize) -> Self {
        match (users, subscribers) {
            (0, 0) => Self::Empty,
            (0, _) | (_, 0) => Self::Inconsistent { users, subscribers },
            _ => Self::Occupied,
        }
    }

    /// 両方のシグナルが空を示したときだけ Room を削除してよい
    pub fn is_vacant(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// プロセス内でのみ生存する Room の状態
#[derive(Debug, Clone)]
pub struct RoomState {
    pub name: RoomName,
    /// Registry が作成順に振る世代番号。同名 Room の再作成を見分けるのに使う
    pub generation: u64,
    pub users: Vec<UserEntry>,
    pub timer: TimerState,
    pub host: Option<StableUserId>,
    pub cycles: u32,
    pub created_at: Timestamp,
    timer_handle: Option<AbortHandle>,
}

impl RoomState {
    pub fn new(name: RoomName, generation: u64, created_at: Timestamp) -> Self {
        Self {
            name,
            generation,
            users: Vec::new(),
            timer: TimerState::default(),
            host: None,
            cycles: 0,
            created_at,
            timer_handle: None,
        }
    }

    /// 新しいエントリを追加する
    ///
    /// 同じ接続、または（認証済みの場合）同じ StableUserId の古いエントリを先に取り除く。
    /// 取り除いたエントリ数を返す。
    pub fn admit(&mut self, entry: UserEntry) -> usize {
        let before = self.users.len();
        self.users.retain(|user| {
            user.connection_id != entry.connection_id
                && !(entry.is_authenticated && user.stable_user_id == entry.stable_user_id)
        });
        let replaced = before - self.users.len();
        self.users.push(entry);
        replaced
    }

    /// 接続 ID が一致するエントリを取り除く（何度呼んでも安全）
    pub fn remove_connection(&mut self, connection_id: &ConnectionId) -> bool {
        let before = self.users.len();
        self.users.retain(|user| &user.connection_id != connection_id);
        before != self.users.len()
    }

    /// 実際に購読している接続のエントリだけを残す。取り除いた数を返す
    pub fn retain_connected(&mut self, live: &[ConnectionId]) -> usize {
        let before = self.users.len();
        self.users.retain(|user| live.contains(&user.connection_id));
        before - self.users.len()
    }

    pub fn has_connection(&self, connection_id: &ConnectionId) -> bool {
        self.users
            .iter()
            .any(|user| &user.connection_id == connection_id)
    }

    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.users
            .iter()
            .map(|user| user.connection_id.clone())
            .collect()
    }

    pub fn attach_timer_handle(&mut self, handle: AbortHandle) {
        self.cancel_timer_handle();
        self.timer_handle = Some(handle);
    }

    /// 保持しているタイマーハンドルを中断する。ハンドルがあった場合 true
    pub fn cancel_timer_handle(&mut self) -> bool {
        match self.timer_handle.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn has_timer_handle(&self) -> bool {
        self.timer_handle.is_some()
    }
}

/// 永続ストアに保存されるチャットメッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub room: RoomName,
    pub user: String,
    pub user_id: String,
    pub text: String,
    pub is_authenticated: bool,
    pub timestamp: Timestamp,
}

/// 永続ストアの Room レコード
///
/// `is_public` と `password` は Room 作成側の持ち物で、このサーバーは書き換えない。
#[derive(Clone, PartialEq, Eq)]
pub struct PersistedRoom {
    pub name: RoomName,
    pub host: Option<StableUserId>,
    pub users: Vec<UserEntry>,
    pub is_public: bool,
    pub password: Option<String>,
    pub created_at: Timestamp,
    pub last_active: Timestamp,
}

impl PersistedRoom {
    pub fn new(name: RoomName, created_at: Timestamp) -> Self {
        Self {
            name,
            host: None,
            users: Vec::new(),
            is_public: true,
            password: None,
            created_at,
            last_active: created_at,
        }
    }

    /// 部分更新を適用する。パッチに無いフィールドは保持される
    pub fn apply(&mut self, patch: RoomPatch) {
        if let Some(host) = patch.host {
            self.host = Some(host);
        }
        if let Some(users) = patch.users {
            self.users = users;
        }
        if let Some(last_active) = patch.last_active {
            self.last_active = last_active;
        }
    }
}

impl fmt::Debug for PersistedRoom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistedRoom")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("users", &self.users.len())
            .field("is_public", &self.is_public)
            .field("has_password", &self.password.is_some())
            .field("created_at", &self.created_at)
            .field("last_active", &self.last_active)
            .finish()
    }
}

/// Room レコードへの部分更新
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomPatch {
    pub name: RoomName,
    pub host: Option<StableUserId>,
    pub users: Option<Vec<UserEntry>>,
    pub last_active: Option<Timestamp>,
}

impl RoomPatch {
    pub fn new(name: RoomName) -> Self {
        Self {
            name,
            host: None,
            users: None,
            last_active: None,
        }
    }

    pub fn host(mut self, host: StableUserId) -> Self {
        self.host = Some(host);
        self
    }

    pub fn users(mut self, users: Vec<UserEntry>) -> Self {
        self.users = Some(users);
        self
    }

    pub fn last_active(mut self, last_active: Timestamp) -> Self {
        self.last_active = Some(last_active);
        self
    }
}

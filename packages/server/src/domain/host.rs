//! Host 選出ポリシー

use super::{entity::UserEntry, value_object::StableUserId};

/// 参加直後の Room の Host を決める
///
/// 優先順位:
/// 1. `as_host` で明示的に要求した参加者
/// 2. 永続化されている Host
/// 3. Room の唯一の参加者（最初の参加者）
/// 4. ユーザーリストの先頭
///
/// `users` は参加者を追加した後のリスト。
pub fn elect_host(
    as_host: bool,
    joiner: &StableUserId,
    persisted_host: Option<&StableUserId>,
    users: &[UserEntry],
) -> Option<StableUserId> {
    if as_host {
        return Some(joiner.clone());
    }
    if let Some(host) = persisted_host {
        return Some(host.clone());
    }
    if users.len() == 1 {
        return Some(joiner.clone());
    }
    users.first().map(|user| user.stable_user_id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConnectionId, Timestamp};

    fn id(value: &str) -> StableUserId {
        StableUserId::new(value.to_string()).unwrap()
    }

    fn entry(stable: &str) -> UserEntry {
        UserEntry {
            connection_id: ConnectionId::new(format!("conn-{}", stable)).unwrap(),
            stable_user_id: id(stable),
            display_name: stable.to_string(),
            is_authenticated: true,
            joined_at: Timestamp::new(0),
        }
    }

    #[test]
    fn test_explicit_request_wins_over_persisted_host() {
        // テスト項目: as_host の要求は永続化された Host より優先される
        // given (前提条件):
        let users = vec![entry("alice"), entry("bob")];

        // when (操作):
        let host = elect_host(true, &id("bob"), Some(&id("alice")), &users);

        // then (期待する結果):
        assert_eq!(host, Some(id("bob")));
    }

    #[test]
    fn test_persisted_host_is_kept() {
        // テスト項目: 要求が無ければ永続化された Host が維持される
        // given (前提条件):
        let users = vec![entry("bob")];

        // when (操作):
        let host = elect_host(false, &id("bob"), Some(&id("alice")), &users);

        // then (期待する結果):
        assert_eq!(host, Some(id("alice")));
    }

    #[test]
    fn test_first_user_becomes_host() {
        // テスト項目: Host が決まっていない Room の最初の参加者が Host になる
        // given (前提条件):
        let users = vec![entry("alice")];

        // when (操作):
        let host = elect_host(false, &id("alice"), None, &users);

        // then (期待する結果):
        assert_eq!(host, Some(id("alice")));
    }

    #[test]
    fn test_fallback_to_head_of_list() {
        // テスト項目: それ以外の場合はユーザーリストの先頭が Host になる
        // given (前提条件):
        let users = vec![entry("alice"), entry("bob")];

        // when (操作):
        let host = elect_host(false, &id("bob"), None, &users);

        // then (期待する結果):
        assert_eq!(host, Some(id("alice")));
    }
}

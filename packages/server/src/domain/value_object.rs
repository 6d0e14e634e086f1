//! Value Object 定義
//!
//! 接続・ルーム・ユーザーを識別する値と、ユーザーが入力する表示用の値。
//! 生成時に長さと空文字をチェックするため、ドメイン層に不正な値は入らない。

use std::fmt;

use super::error::ValueObjectError;

pub const ROOM_ID_MAX_CHARS: usize = 64;
pub const PASSWORD_MAX_CHARS: usize = 64;
pub const NICKNAME_MAX_CHARS: usize = 32;
pub const USER_ID_MAX_CHARS: usize = 64;
pub const TARGET_ID_MAX_CHARS: usize = 32;

fn check_length(field: &'static str, value: &str, max_chars: usize) -> Result<(), ValueObjectError> {
    if value.chars().count() > max_chars {
        return Err(ValueObjectError::TooLong { field, max_chars });
    }
    Ok(())
}

/// Server-assigned connection identifier.
///
/// Allocated from a process-wide counter starting at 1 and never reused. On the wire it
/// is always the decimal string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Parse the wire form (`"12"`).
    pub fn parse(value: &str) -> Result<Self, ValueObjectError> {
        value
            .parse::<u64>()
            .map(Self)
            .map_err(|_| ValueObjectError::NotAConnectionId(value.to_string()))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Room identifier: 1 to 64 characters, case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.is_empty() {
            return Err(ValueObjectError::Empty { field: "roomId" });
        }
        check_length("roomId", &value, ROOM_ID_MAX_CHARS)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for RoomId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable client-side user identity, kept across reconnects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.is_empty() {
            return Err(ValueObjectError::Empty { field: "userId" });
        }
        check_length("userId", &value, USER_ID_MAX_CHARS)?;
        Ok(Self(value))
    }

    /// Fallback identity for clients that do not send a `userId`.
    pub fn from_connection(connection_id: ConnectionId) -> Self {
        Self(connection_id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Display name shown to other room members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nickname(String);

impl Nickname {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.is_empty() {
            return Err(ValueObjectError::Empty { field: "nickname" });
        }
        check_length("nickname", &value, NICKNAME_MAX_CHARS)?;
        Ok(Self(value))
    }

    /// `Guest-<connectionId>`
    pub fn guest(connection_id: ConnectionId) -> Self {
        Self(format!("Guest-{}", connection_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Room password. Empty means "no password": an unprotected room when stored, nothing
/// offered when supplied by a joiner.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Password(String);

impl Password {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        check_length("password", &value, PASSWORD_MAX_CHARS)?;
        Ok(Self(value))
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("Password(<none>)")
        } else {
            f.write_str("Password(<redacted>)")
        }
    }
}

/// Unix timestamp in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_id_rejects_empty_and_too_long() {
        // テスト項目: 空文字と 65 文字以上の RoomId は生成できない
        // given (前提条件):
        let empty = String::new();
        let too_long = "a".repeat(ROOM_ID_MAX_CHARS + 1);

        // when (操作):
        let empty_result = RoomId::new(empty);
        let too_long_result = RoomId::new(too_long);

        // then (期待する結果):
        assert_eq!(empty_result, Err(ValueObjectError::Empty { field: "roomId" }));
        assert_eq!(
            too_long_result,
            Err(ValueObjectError::TooLong {
                field: "roomId",
                max_chars: ROOM_ID_MAX_CHARS
            })
        );
    }

    #[test]
    fn test_room_id_counts_characters_not_bytes() {
        // テスト項目: 文字数の上限はバイト数ではなく文字数で判定される
        // given (前提条件):
        let value = "部".repeat(ROOM_ID_MAX_CHARS);

        // when (操作):
        let result = RoomId::new(value);

        // then (期待する結果):
        assert!(result.is_ok());
    }

    #[test]
    fn test_connection_id_wire_form() {
        // テスト項目: ConnectionId は 10 進文字列と相互変換できる
        // given (前提条件):
        let id = ConnectionId::new(42);

        // when (操作):
        let parsed = ConnectionId::parse(&id.to_string());

        // then (期待する結果):
        assert_eq!(parsed, Ok(id));
        assert!(ConnectionId::parse("abc").is_err());
    }

    #[test]
    fn test_guest_nickname_and_fallback_user_id() {
        // テスト項目: デフォルトのニックネームとユーザー ID が接続 ID から作られる
        // given (前提条件):
        let id = ConnectionId::new(7);

        // when (操作):
        let nickname = Nickname::guest(id);
        let user_id = UserId::from_connection(id);

        // then (期待する結果):
        assert_eq!(nickname.as_str(), "Guest-7");
        assert_eq!(user_id.as_str(), "7");
    }

    #[test]
    fn test_password_debug_is_redacted() {
        // テスト項目: パスワードはデバッグ出力に平文で現れない
        // given (前提条件):
        let password = Password::new("hunter2".to_string()).unwrap();

        // when (操作):
        let debug = format!("{:?}", password);

        // then (期待する結果):
        assert!(!debug.contains("hunter2"));
        assert_eq!(format!("{:?}", Password::none()), "Password(<none>)");
    }
}

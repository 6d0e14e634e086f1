//! Validation of untrusted client fields.
//!
//! Every inbound field goes through one of these functions before it reaches a use
//! case. Strings are trimmed and clamped to their maximum length, never rejected for
//! being too long. Fields that are not strings are treated as absent.

use serde_json::Value;

use super::value_object::{
    ConnectionId, NICKNAME_MAX_CHARS, Nickname, PASSWORD_MAX_CHARS, Password, ROOM_ID_MAX_CHARS,
    RoomId, TARGET_ID_MAX_CHARS, USER_ID_MAX_CHARS, UserId,
};

/// Trim and clamp a string field.
///
/// Returns `None` when the value is missing or not a string, and when it is empty after
/// trimming unless `allow_empty` is set.
pub fn sanitize_string(value: Option<&Value>, max_chars: usize, allow_empty: bool) -> Option<String> {
    let trimmed = value?.as_str()?.trim();
    if !allow_empty && trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(max_chars).collect())
}

pub fn room_id(value: Option<&Value>) -> Option<RoomId> {
    sanitize_string(value, ROOM_ID_MAX_CHARS, false).and_then(|v| RoomId::new(v).ok())
}

/// Missing, non-string and blank passwords all mean "no password offered".
pub fn password(value: Option<&Value>) -> Password {
    sanitize_string(value, PASSWORD_MAX_CHARS, true)
        .and_then(|v| Password::new(v).ok())
        .unwrap_or_default()
}

pub fn nickname(value: Option<&Value>) -> Option<Nickname> {
    sanitize_string(value, NICKNAME_MAX_CHARS, true).and_then(|v| Nickname::new(v).ok())
}

pub fn user_id(value: Option<&Value>) -> Option<UserId> {
    sanitize_string(value, USER_ID_MAX_CHARS, true).and_then(|v| UserId::new(v).ok())
}

pub fn target_id(value: Option<&Value>) -> Option<ConnectionId> {
    sanitize_string(value, TARGET_ID_MAX_CHARS, false).and_then(|v| ConnectionId::parse(&v).ok())
}

pub fn muted(value: Option<&Value>) -> Option<bool> {
    value?.as_bool()
}

/// Latest client timestamp accepted, 9999-12-31T23:59:59.999Z in epoch milliseconds.
pub const MAX_CLIENT_TIMESTAMP_MS: i64 = 253_402_300_799_999;

/// Client timestamps are JavaScript numbers; fractional parts are dropped.
///
/// Zero, negative and out-of-range values count as absent.
pub fn timestamp(value: Option<&Value>) -> Option<i64> {
    let value = value?;
    let ts = match value.as_i64() {
        Some(ts) => ts,
        None => {
            let v = value.as_f64()?;
            if !(1.0..=MAX_CLIENT_TIMESTAMP_MS as f64).contains(&v) {
                return None;
            }
            v as i64
        }
    };
    (1..=MAX_CLIENT_TIMESTAMP_MS).contains(&ts).then_some(ts)
}

/// Signal payloads are opaque but must be objects carrying a string `type`.
pub fn signal_payload(value: Option<&Value>) -> Option<Value> {
    let value = value?;
    value.get("type")?.as_str()?;
    Some(value.clone())
}

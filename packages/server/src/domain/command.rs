//! Validated client-to-server protocol messages.

use serde_json::Value;

use super::value_object::{ConnectionId, Nickname, Password, RoomId, UserId};

/// One inbound protocol message after every field went through the validator.
///
/// Messages whose mandatory fields are invalid never become a `ClientCommand`, with one
/// exception: `join` keeps an invalid room id as `None` so the sender can be told.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCommand {
    Join {
        room_id: Option<RoomId>,
        password: Password,
        nickname: Option<Nickname>,
        user_id: Option<UserId>,
    },
    Signal {
        room_id: RoomId,
        target_id: ConnectionId,
        payload: Value,
    },
    State {
        nickname: Option<Nickname>,
        muted: Option<bool>,
    },
    Ping {
        ts: Option<i64>,
    },
    Kick {
        target_id: ConnectionId,
    },
}

impl ClientCommand {
    /// Wire name of the message, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Signal { .. } => "signal",
            Self::State { .. } => "state",
            Self::Ping { .. } => "ping",
            Self::Kick { .. } => "kick",
        }
    }
}

//! WebSocket message DTOs.
//!
//! Every frame is a JSON object with a `type` discriminator. Server frames use
//! kebab-case type names and camelCase fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::ClientCommand;

/// Server → client frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    Rooms {
        rooms: Vec<RoomSummaryDto>,
    },
    Joined {
        room_id: String,
        connection_id: String,
        count: usize,
    },
    RoomState {
        room_id: String,
        count: usize,
        participants: Vec<ParticipantDto>,
    },
    Signal {
        from: String,
        payload: Value,
    },
    Pong {
        ts: i64,
    },
    Kicked {
        room_id: String,
    },
    Error {
        message: String,
    },
}

/// Room entry of a `rooms` frame and of `GET /api/rooms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummaryDto {
    pub room_id: String,
    pub count: usize,
    pub has_password: bool,
}

/// Participant entry of a `room-state` frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    pub connection_id: String,
    pub nickname: String,
    pub muted: bool,
    /// Last round-trip estimate in milliseconds, `null` until the first timed ping.
    pub ping: Option<i64>,
    pub connection_health: String,
    pub is_owner: bool,
}

/// Client → server frame before validation.
///
/// Only the discriminator is typed; the remaining fields stay raw JSON so that each
/// one can be validated on its own.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ClientMessage {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// Why an inbound frame was ignored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed frame: {0}")]
    Malformed(String),

    #[error("unknown message type '{0}'")]
    UnknownType(String),

    #[error("missing or invalid field '{0}'")]
    InvalidField(&'static str),
}

/// Parse and validate one text frame.
pub fn decode_client_command(text: &str) -> Result<ClientCommand, DecodeError> {
    let message: ClientMessage =
        serde_json::from_str(text).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    ClientCommand::try_from(message)
}

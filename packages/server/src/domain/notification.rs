//! Server-to-client notifications.
//!
//! Use cases describe what a connection should receive with `Notification`; turning it
//! into a wire frame is the job of the `MessagePusher` implementation.

use serde_json::Value;

use super::entity::{RoomSnapshot, RoomSummary};
use super::value_object::{ConnectionId, RoomId};

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Lobby view of every room.
    Rooms(Vec<RoomSummary>),
    /// Reply to a successful join.
    Joined {
        room_id: RoomId,
        connection_id: ConnectionId,
        count: usize,
    },
    /// Full participant list of one room.
    RoomState(RoomSnapshot),
    /// Opaque negotiation payload relayed from another member.
    Signal { from: ConnectionId, payload: Value },
    Pong { ts: i64 },
    /// Sent to a member right before the room owner closes its connection.
    Kicked { room_id: RoomId },
    Error { message: String },
}

impl Notification {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

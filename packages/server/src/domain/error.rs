//! Domain error types.

use thiserror::Error;

/// Value object construction errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} must be at most {max_chars} characters")]
    TooLong {
        field: &'static str,
        max_chars: usize,
    },

    #[error("'{0}' is not a connection id")]
    NotAConnectionId(String),
}

/// Reasons a `join` is refused. The display text is sent to the client as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("Invalid room ID.")]
    InvalidRoomId,

    #[error("Wrong password for this room.")]
    WrongPassword,

    #[error("Room is full (maximum {capacity} participants).")]
    RoomFull { capacity: usize },

    #[error("Connection is closed.")]
    ConnectionClosed,
}

/// Message push errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("Client '{0}' is not registered")]
    ClientNotFound(String),

    #[error("Failed to push message: {0}")]
    PushFailed(String),

    #[error("Failed to encode message: {0}")]
    EncodeFailed(String),
}

//! Conversion logic between DTOs and domain types.

use crate::domain::{
    ClientCommand, Notification, ParticipantView, RelayCredentials, RoomSnapshot, RoomSummary,
    validator,
};
use crate::infrastructure::dto::{
    http::RelayCredentialsResponse,
    websocket::{ClientMessage, DecodeError, ParticipantDto, RoomSummaryDto, ServerMessage},
};

// ========================================
// DTO → Domain
// ========================================

impl TryFrom<ClientMessage> for ClientCommand {
    type Error = DecodeError;

    fn try_from(message: ClientMessage) -> Result<Self, Self::Error> {
        let command = match message.kind.as_str() {
            "join" => Self::Join {
                room_id: validator::room_id(message.field("roomId")),
                password: validator::password(message.field("password")),
                nickname: validator::nickname(message.field("nickname")),
                user_id: validator::user_id(message.field("userId")),
            },
            "signal" => Self::Signal {
                room_id: validator::room_id(message.field("roomId"))
                    .ok_or(DecodeError::InvalidField("roomId"))?,
                target_id: validator::target_id(message.field("targetId"))
                    .ok_or(DecodeError::InvalidField("targetId"))?,
                payload: validator::signal_payload(message.field("payload"))
                    .ok_or(DecodeError::InvalidField("payload"))?,
            },
            "state" => Self::State {
                nickname: validator::nickname(message.field("nickname")),
                muted: validator::muted(message.field("muted")),
            },
            "ping" => Self::Ping {
                ts: validator::timestamp(message.field("ts")),
            },
            "kick" => Self::Kick {
                target_id: validator::target_id(message.field("targetId"))
                    .ok_or(DecodeError::InvalidField("targetId"))?,
            },
            _ => return Err(DecodeError::UnknownType(message.kind)),
        };
        Ok(command)
    }
}

// ========================================
// Domain → DTO
// ========================================

impl From<RoomSummary> for RoomSummaryDto {
    fn from(model: RoomSummary) -> Self {
        Self {
            room_id: model.room_id.into_string(),
            count: model.count,
            has_password: model.has_password,
        }
    }
}

impl From<ParticipantView> for ParticipantDto {
    fn from(model: ParticipantView) -> Self {
        Self {
            connection_id: model.connection_id.to_string(),
            nickname: model.nickname.into_string(),
            muted: model.muted,
            ping: model.ping_ms,
            connection_health: model.health.as_str().to_string(),
            is_owner: model.is_owner,
        }
    }
}

impl From<RoomSnapshot> for ServerMessage {
    fn from(model: RoomSnapshot) -> Self {
        Self::RoomState {
            room_id: model.room_id.into_string(),
            count: model.count,
            participants: model.participants.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<Notification> for ServerMessage {
    fn from(model: Notification) -> Self {
        match model {
            Notification::Rooms(rooms) => Self::Rooms {
                rooms: rooms.into_iter().map(Into::into).collect(),
            },
            Notification::Joined {
                room_id,
                connection_id,
                count,
            } => Self::Joined {
                room_id: room_id.into_string(),
                connection_id: connection_id.to_string(),
                count,
            },
            Notification::RoomState(snapshot) => snapshot.into(),
            Notification::Signal { from, payload } => Self::Signal {
                from: from.to_string(),
                payload,
            },
            Notification::Pong { ts } => Self::Pong { ts },
            Notification::Kicked { room_id } => Self::Kicked {
                room_id: room_id.into_string(),
            },
            Notification::Error { message } => Self::Error { message },
        }
    }
}

impl From<RelayCredentials> for RelayCredentialsResponse {
    fn from(model: RelayCredentials) -> Self {
        Self {
            urls: model.urls,
            username: model.username,
            credential: model.credential,
            ttl: model.ttl_secs,
            realm: model.realm,
        }
    }
}

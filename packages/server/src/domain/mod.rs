//! Domain layer: value objects, entities, and the interfaces the use cases depend on.

pub mod command;
pub mod entity;
pub mod error;
pub mod message_pusher;
pub mod notification;
pub mod rate_limit;
pub mod relay;
pub mod repository;
pub mod validator;
pub mod value_object;

pub use command::ClientCommand;
pub use entity::{
    ConnectionHealth, MAX_MEMBERS_PER_ROOM, PING_TIMEOUT_MS, ParticipantView, Room, RoomSnapshot,
    RoomSummary, Session,
};
pub use error::{JoinError, MessagePushError, ValueObjectError};
#[cfg(test)]
pub use message_pusher::MockMessagePusher;
pub use message_pusher::{CloseReason, MessagePusher, Outbound, PusherChannel};
pub use notification::Notification;
pub use rate_limit::{FrameGuard, MAX_FRAME_BYTES, RatePolicy, RateWindow};
pub use relay::{RelayConfig, RelayCredentials};
pub use repository::{Departure, JoinOutcome, JoinRequest, RoomRepository, StateUpdate};
pub use value_object::{ConnectionId, Nickname, Password, RoomId, Timestamp, UserId};

//! Entity 定義
//!
//! - `Session`: ルームに参加している 1 接続の状態
//! - `Room`: パスワード・オーナー・参加者を持つルーム
//! - `RoomSnapshot` / `RoomSummary`: 通知用に読み出した状態のコピー

use std::collections::HashMap;

use super::value_object::{ConnectionId, Nickname, Password, RoomId, Timestamp, UserId};

/// Maximum number of concurrent sessions per room.
pub const MAX_MEMBERS_PER_ROOM: usize = 6;

/// A session is shown as `timeout` when its last ping is older than this.
pub const PING_TIMEOUT_MS: i64 = 15_000;

/// Liveness of a session as seen by the server, derived from its last ping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionHealth {
    Ok,
    Timeout,
    Unknown,
}

impl ConnectionHealth {
    pub fn derive(last_ping_at: Option<Timestamp>, now: Timestamp) -> Self {
        match last_ping_at {
            None => Self::Unknown,
            Some(at) if now.value() - at.value() > PING_TIMEOUT_MS => Self::Timeout,
            Some(_) => Self::Ok,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Timeout => "timeout",
            Self::Unknown => "unknown",
        }
    }
}

/// Membership state of one connection inside a room.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub connection_id: ConnectionId,
    pub user_id: UserId,
    pub nickname: Nickname,
    pub muted: bool,
    pub last_ping_at: Option<Timestamp>,
    pub ping_ms: Option<i64>,
}

impl Session {
    pub fn new(connection_id: ConnectionId, user_id: UserId, nickname: Nickname) -> Self {
        Self {
            connection_id,
            user_id,
            nickname,
            muted: false,
            last_ping_at: None,
            ping_ms: None,
        }
    }

    /// `client_ts` is the client's send time; without it only liveness is updated.
    pub fn record_ping(&mut self, now: Timestamp, client_ts: Option<i64>) {
        self.last_ping_at = Some(now);
        if let Some(rtt) = client_ts.and_then(|ts| now.value().checked_sub(ts)) {
            self.ping_ms = Some(rtt);
        }
    }

    pub fn health(&self, now: Timestamp) -> ConnectionHealth {
        ConnectionHealth::derive(self.last_ping_at, now)
    }
}

/// One participant line of a room snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantView {
    pub connection_id: ConnectionId,
    pub nickname: Nickname,
    pub muted: bool,
    pub ping_ms: Option<i64>,
    pub health: ConnectionHealth,
    pub is_owner: bool,
}

/// Copy of a room's state taken under the registry lock.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomSnapshot {
    pub room_id: RoomId,
    pub count: usize,
    pub participants: Vec<ParticipantView>,
}

/// Lobby line for one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSummary {
    pub room_id: RoomId,
    pub count: usize,
    pub has_password: bool,
}

/// A room and its current members.
///
/// Password and owner are fixed at creation. The registry deletes a room as soon as
/// its last member is removed, so a `Room` value held by the registry is never empty.
#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    password: Password,
    owner_user_id: UserId,
    members: HashMap<ConnectionId, Session>,
    capacity: usize,
}

impl Room {
    pub fn with_capacity(
        id: RoomId,
        password: Password,
        owner_user_id: UserId,
        capacity: usize,
    ) -> Self {
        Self {
            id,
            password,
            owner_user_id,
            members: HashMap::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn has_password(&self) -> bool {
        !self.password.is_empty()
    }

    /// An empty supplied password counts as "none offered" and is not checked.
    /// Only a non-empty password that differs from the stored one is refused.
    pub fn accepts_password(&self, supplied: &Password) -> bool {
        !self.has_password() || supplied.is_empty() || &self.password == supplied
    }

    pub fn is_owner(&self, user_id: &UserId) -> bool {
        &self.owner_user_id == user_id
    }

    /// Whether a join by `user_id` on `connection_id` fits, counting the sessions it
    /// would replace as free.
    pub fn has_room_for(&self, user_id: &UserId, connection_id: &ConnectionId) -> bool {
        let others = self
            .members
            .values()
            .filter(|s| &s.user_id != user_id && &s.connection_id != connection_id)
            .count();
        others < self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.members.contains_key(connection_id)
    }

    pub fn member(&self, connection_id: &ConnectionId) -> Option<&Session> {
        self.members.get(connection_id)
    }

    pub fn member_mut(&mut self, connection_id: &ConnectionId) -> Option<&mut Session> {
        self.members.get_mut(connection_id)
    }

    /// Remove every session of `user_id` other than `keep`, returning the removed ids.
    pub fn evict_user(&mut self, user_id: &UserId, keep: &ConnectionId) -> Vec<ConnectionId> {
        let evicted: Vec<ConnectionId> = self
            .members
            .values()
            .filter(|session| &session.user_id == user_id && &session.connection_id != keep)
            .map(|session| session.connection_id)
            .collect();
        for id in &evicted {
            self.members.remove(id);
        }
        evicted
    }

    pub fn insert(&mut self, session: Session) {
        self.members.insert(session.connection_id, session);
    }

    pub fn remove(&mut self, connection_id: &ConnectionId) -> Option<Session> {
        self.members.remove(connection_id)
    }

    /// Participants ordered by connection id.
    pub fn snapshot(&self, now: Timestamp) -> RoomSnapshot {
        let mut participants: Vec<ParticipantView> = self
            .members
            .values()
            .map(|session| ParticipantView {
                connection_id: session.connection_id,
                nickname: session.nickname.clone(),
                muted: session.muted,
                ping_ms: session.ping_ms,
                health: session.health(now),
                is_owner: self.is_owner(&session.user_id),
            })
            .collect();
        participants.sort_by_key(|p| p.connection_id);

        RoomSnapshot {
            room_id: self.id.clone(),
            count: participants.len(),
            participants,
        }
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            room_id: self.id.clone(),
            count: self.members.len(),
            has_password: self.has_password(),
        }
    }
}

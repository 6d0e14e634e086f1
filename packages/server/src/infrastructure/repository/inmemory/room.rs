//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! 全ルームと全接続を 1 つの `RoomTable` にまとめ、1 つの Mutex で保護する。
//! 各メソッドはロックを 1 回だけ取得し、その間に I/O を行わない。
//!
//! ## 不変条件
//!
//! - `rooms` に含まれるルームは必ず 1 人以上の参加者を持つ
//! - `connections[id] == Some(room)` ⇔ `rooms[room]` の参加者に `id` が含まれる
//! - 1 ルームの参加者数は定員を超えない

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;
use yoriai_shared::time::{Clock, SystemClock};

use crate::domain::{
    ConnectionId, Departure, JoinError, JoinOutcome, JoinRequest, MAX_MEMBERS_PER_ROOM, Room,
    RoomId, RoomRepository, RoomSnapshot, RoomSummary, Session, StateUpdate, Timestamp,
};

#[derive(Debug, Default)]
struct RoomTable {
    rooms: HashMap<RoomId, Room>,
    /// Every open connection and the room it currently belongs to.
    connections: HashMap<ConnectionId, Option<RoomId>>,
    last_connection_id: u64,
}

impl RoomTable {
    fn open_connection(&mut self) -> ConnectionId {
        self.last_connection_id += 1;
        let connection_id = ConnectionId::new(self.last_connection_id);
        self.connections.insert(connection_id, None);
        connection_id
    }

    fn remove_member(&mut self, room_id: &RoomId, connection_id: &ConnectionId) -> Option<Departure> {
        let room = self.rooms.get_mut(room_id)?;
        room.remove(connection_id)?;
        let remaining = room.member_count();
        if room.is_empty() {
            self.rooms.remove(room_id);
        }
        Some(Departure {
            room_id: room_id.clone(),
            remaining,
        })
    }

    fn leave(&mut self, connection_id: &ConnectionId) -> Option<Departure> {
        let room_id = self.connections.get_mut(connection_id)?.take()?;
        self.remove_member(&room_id, connection_id)
    }

    fn join(
        &mut self,
        connection_id: ConnectionId,
        request: JoinRequest,
        capacity: usize,
    ) -> Result<JoinOutcome, JoinError> {
        let current_room = self
            .connections
            .get(&connection_id)
            .ok_or(JoinError::ConnectionClosed)?
            .clone();

        // All checks happen before the first mutation so a refused join changes nothing.
        if let Some(room) = self.rooms.get(&request.room_id) {
            if !room.accepts_password(&request.password) {
                return Err(JoinError::WrongPassword);
            }
            if !room.has_room_for(&request.user_id, &connection_id) {
                return Err(JoinError::RoomFull {
                    capacity: room.capacity(),
                });
            }
        }

        let previous_room = match current_room {
            Some(room_id) if room_id != request.room_id => {
                self.remove_member(&room_id, &connection_id)
            }
            _ => None,
        };

        let room_id = request.room_id.clone();
        let created = !self.rooms.contains_key(&room_id);
        let room = self.rooms.entry(room_id.clone()).or_insert_with(|| {
            Room::with_capacity(
                request.room_id.clone(),
                request.password.clone(),
                request.user_id.clone(),
                capacity,
            )
        });

        let evicted = room.evict_user(&request.user_id, &connection_id);
        room.insert(Session::new(
            connection_id,
            request.user_id,
            request.nickname,
        ));
        let count = room.member_count();

        for id in &evicted {
            if let Some(slot) = self.connections.get_mut(id) {
                *slot = None;
            }
        }
        self.connections.insert(connection_id, Some(room_id.clone()));

        Ok(JoinOutcome {
            room_id,
            connection_id,
            count,
            created,
            evicted,
            previous_room,
        })
    }

    fn member_room(&self, connection_id: &ConnectionId) -> Option<&RoomId> {
        self.connections.get(connection_id)?.as_ref()
    }

    fn member_session(&mut self, connection_id: &ConnectionId) -> Option<(&RoomId, &mut Session)> {
        let room_id = self.connections.get(connection_id)?.as_ref()?;
        let session = self.rooms.get_mut(room_id)?.member_mut(connection_id)?;
        Some((room_id, session))
    }
}

/// インメモリ Room Repository 実装
pub struct InMemoryRoomRepository {
    table: Mutex<RoomTable>,
    clock: Arc<dyn Clock>,
    room_capacity: usize,
}

impl Default for InMemoryRoomRepository {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl InMemoryRoomRepository {
    /// 新しい InMemoryRoomRepository を作成（定員 6 人）
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_capacity(clock, MAX_MEMBERS_PER_ROOM)
    }

    /// 定員を指定して作成
    pub fn with_capacity(clock: Arc<dyn Clock>, room_capacity: usize) -> Self {
        Self {
            table: Mutex::new(RoomTable::default()),
            clock,
            room_capacity,
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn open_connection(&self) -> ConnectionId {
        self.table.lock().await.open_connection()
    }

    async fn close_connection(&self, connection_id: &ConnectionId) -> Option<Departure> {
        let mut table = self.table.lock().await;
        let departure = table.leave(connection_id);
        table.connections.remove(connection_id);
        departure
    }

    async fn create_or_join(
        &self,
        connection_id: ConnectionId,
        request: JoinRequest,
    ) -> Result<JoinOutcome, JoinError> {
        let mut table = self.table.lock().await;
        table.join(connection_id, request, self.room_capacity)
    }

    async fn leave(&self, connection_id: &ConnectionId) -> Option<Departure> {
        self.table.lock().await.leave(connection_id)
    }

    async fn update_state(
        &self,
        connection_id: &ConnectionId,
        update: StateUpdate,
    ) -> Option<RoomId> {
        let mut table = self.table.lock().await;
        let (room_id, session) = table.member_session(connection_id)?;
        if let Some(nickname) = update.nickname {
            session.nickname = nickname;
        }
        if let Some(muted) = update.muted {
            session.muted = muted;
        }
        Some(room_id.clone())
    }

    async fn record_ping(
        &self,
        connection_id: &ConnectionId,
        client_ts: Option<i64>,
    ) -> Option<RoomId> {
        let now = self.now();
        let mut table = self.table.lock().await;
        let (room_id, session) = table.member_session(connection_id)?;
        session.record_ping(now, client_ts);
        Some(room_id.clone())
    }

    async fn room_of(&self, connection_id: &ConnectionId) -> Option<RoomId> {
        self.table.lock().await.member_room(connection_id).cloned()
    }

    async fn signal_route(
        &self,
        from: &ConnectionId,
        room_id: &RoomId,
        target: &ConnectionId,
    ) -> bool {
        let table = self.table.lock().await;
        table.member_room(from) == Some(room_id)
            && table
                .rooms
                .get(room_id)
                .is_some_and(|room| room.contains(target))
    }

    async fn kick_target(
        &self,
        requester: &ConnectionId,
        target: &ConnectionId,
    ) -> Option<RoomId> {
        let table = self.table.lock().await;
        let room_id = table.member_room(requester)?;
        let room = table.rooms.get(room_id)?;
        let requester_session = room.member(requester)?;
        if room.is_owner(&requester_session.user_id) && room.contains(target) {
            Some(room_id.clone())
        } else {
            None
        }
    }

    async fn snapshot(&self, room_id: &RoomId) -> Option<RoomSnapshot> {
        let now = self.now();
        let table = self.table.lock().await;
        table.rooms.get(room_id).map(|room| room.snapshot(now))
    }

    async fn list_rooms(&self) -> Vec<RoomSummary> {
        let table = self.table.lock().await;
        let mut rooms: Vec<RoomSummary> = table.rooms.values().map(Room::summary).collect();
        rooms.sort_by(|a, b| a.room_id.cmp(&b.room_id));
        rooms
    }

    async fn connection_ids(&self) -> Vec<ConnectionId> {
        let table = self.table.lock().await;
        let mut ids: Vec<ConnectionId> = table.connections.keys().copied().collect();
        ids.sort();
        ids
    }
}

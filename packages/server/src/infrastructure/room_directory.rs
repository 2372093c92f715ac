//! Room directory: room key → member connections.
//!
//! ## 不変条件
//!
//! - A room exists only while it has members; the last `leave` removes it.
//! - `memberships` mirrors `rooms` per connection so `leave_all` can remove a
//!   connection without scanning every room.
//!
//! Lock order is always `memberships` shard first, then `rooms` shard.
//! `broadcast` only ever reads `rooms`.

use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};

use dashmap::{DashMap, mapref::entry::Entry};

use crate::domain::{ConnectionId, MessagePushError, MessagePusher, RoomKey};

pub struct RoomDirectory {
    rooms: DashMap<RoomKey, HashSet<ConnectionId>>,
    memberships: DashMap<ConnectionId, HashSet<RoomKey>>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl RoomDirectory {
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            rooms: DashMap::new(),
            memberships: DashMap::new(),
            message_pusher,
        }
    }

    /// Add a connection to a room, creating the room on first join.
    ///
    /// Returns `false` when the connection was already a member.
    pub fn join(&self, room: &RoomKey, connection_id: ConnectionId) -> bool {
        let mut joined = self.memberships.entry(connection_id).or_default();
        let inserted = self
            .rooms
            .entry(room.clone())
            .or_default()
            .insert(connection_id);
        joined.insert(room.clone());
        if inserted {
            tracing::debug!("Connection '{}' joined room '{}'", connection_id, room);
        }
        inserted
    }

    /// Remove a connection from one room. Returns `false` if it was not a member.
    pub fn leave(&self, room: &RoomKey, connection_id: &ConnectionId) -> bool {
        if let Entry::Occupied(mut joined) = self.memberships.entry(*connection_id) {
            joined.get_mut().remove(room);
            if joined.get().is_empty() {
                joined.remove();
            }
        }
        self.remove_member(room, connection_id)
    }

    /// Remove a connection from every room it joined; returns those rooms.
    pub fn leave_all(&self, connection_id: &ConnectionId) -> Vec<RoomKey> {
        let Some((_, joined)) = self.memberships.remove(connection_id) else {
            return Vec::new();
        };
        let rooms: Vec<RoomKey> = joined.into_iter().collect();
        for room in &rooms {
            self.remove_member(room, connection_id);
        }
        tracing::debug!(
            "Connection '{}' left {} room(s)",
            connection_id,
            rooms.len()
        );
        rooms
    }

    fn remove_member(&self, room: &RoomKey, connection_id: &ConnectionId) -> bool {
        match self.rooms.entry(room.clone()) {
            Entry::Occupied(mut members) => {
                let removed = members.get_mut().remove(connection_id);
                if members.get().is_empty() {
                    members.remove();
                    tracing::debug!("Room '{}' is empty and was removed", room);
                }
                removed
            }
            Entry::Vacant(_) => false,
        }
    }

    /// Deliver a frame to the members present at the time of the call.
    ///
    /// An empty or unknown room is a successful no-op. Per-member failures are
    /// logged by the pusher and never fail the broadcast.
    pub async fn broadcast(&self, room: &RoomKey, frame: &str) -> Result<usize, MessagePushError> {
        let targets = self.members(room);
        if targets.is_empty() {
            tracing::debug!("No members in room '{}', nothing to deliver", room);
            return Ok(0);
        }
        let count = targets.len();
        self.message_pusher.broadcast(targets, frame).await?;
        Ok(count)
    }

    pub fn members(&self, room: &RoomKey) -> Vec<ConnectionId> {
        self.rooms
            .get(room)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn rooms_of(&self, connection_id: &ConnectionId) -> Vec<RoomKey> {
        self.memberships
            .get(connection_id)
            .map(|joined| joined.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Room name → member count, sorted by room name
    pub fn snapshot(&self) -> BTreeMap<String, usize> {
        self.rooms
            .iter()
            .map(|entry| (entry.key().to_string(), entry.value().len()))
            .collect()
    }
}

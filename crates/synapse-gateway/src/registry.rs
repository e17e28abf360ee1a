//! Room registry
//!
//! Pure membership bookkeeping: which sessions are currently live in which
//! room. Uses `DashMap` so admissions, removals, and fan-out snapshots on
//! different rooms never serialize against each other.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;

use crate::session::Session;

/// Registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The session is already tracked in a room; it must be removed before
    /// it can be admitted again
    #[error("session {0} is already admitted to a room")]
    AlreadyAdmitted(String),
}

/// Maps room ids to the sessions currently connected to them.
///
/// One registry exists per server process; the lifecycle controller and
/// broadcaster share it by reference. Invariants: a session is in at most
/// one room, and an empty room reads the same as an absent one.
pub struct RoomRegistry {
    /// Room id to member session ids
    rooms: DashMap<String, HashSet<String>>,
    /// Session id to session, for snapshot lookups
    sessions: DashMap<String, Arc<Session>>,
}

impl RoomRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            sessions: DashMap::new(),
        }
    }

    /// Create a new registry wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Add a session to a room's member set.
    ///
    /// Fails if the session id is already tracked anywhere; the session map
    /// entry is claimed first so a racing double-admit cannot slip through.
    pub fn admit(&self, room_id: &str, session: Arc<Session>) -> Result<(), RegistryError> {
        let session_id = session.session_id().to_string();

        match self.sessions.entry(session_id.clone()) {
            Entry::Occupied(_) => {
                return Err(RegistryError::AlreadyAdmitted(session_id));
            }
            Entry::Vacant(entry) => {
                entry.insert(session);
            }
        }

        self.rooms
            .entry(room_id.to_string())
            .or_default()
            .insert(session_id.clone());

        tracing::debug!(room_id, session_id = %session_id, "Session admitted");
        Ok(())
    }

    /// Remove a session from a room's member set.
    ///
    /// A no-op when the session is already gone: lifecycle teardown may race
    /// with broadcaster-initiated eviction, and both call this.
    pub fn remove(&self, room_id: &str, session_id: &str) {
        if self.sessions.remove(session_id).is_none() {
            return;
        }

        if let Some(mut members) = self.rooms.get_mut(room_id) {
            members.remove(session_id);
        }
        // Drop the room entry once its last member leaves
        self.rooms.remove_if(room_id, |_, members| members.is_empty());

        tracing::debug!(room_id, session_id, "Session removed");
    }

    /// Snapshot of the sessions currently in a room.
    ///
    /// Owned copies, safe to iterate while admissions and removals continue
    /// concurrently.
    pub fn members(&self, room_id: &str) -> Vec<Arc<Session>> {
        self.rooms
            .get(room_id)
            .map(|members| {
                members
                    .iter()
                    .filter_map(|sid| self.sessions.get(sid).map(|s| s.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether a session is currently tracked
    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    /// Number of rooms with at least one member
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Total number of live sessions
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RoomRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomRegistry")
            .field("rooms", &self.rooms.len())
            .field("sessions", &self.sessions.len())
            .finish()
    }
}

//! Room fan-out
//!
//! Delivers one event to every live member of a room. Deliveries are
//! independent and bounded: a member that cannot accept the event within
//! the send bound is evicted from the room, and the rest are unaffected.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;

use crate::events::ServerEvent;
use crate::registry::RoomRegistry;
use crate::session::Session;

/// Fans events out to room members through the shared registry.
pub struct Broadcaster {
    registry: Arc<RoomRegistry>,
    send_timeout: Duration,
}

impl Broadcaster {
    /// Create a broadcaster over a registry
    pub fn new(registry: Arc<RoomRegistry>, send_timeout: Duration) -> Self {
        Self {
            registry,
            send_timeout,
        }
    }

    /// Deliver `event` to every member of `room_id` except `exclude`.
    ///
    /// The event is serialized once and the member list is snapshotted once;
    /// per-member sends then run concurrently. A member whose send fails is
    /// removed from the registry and signalled to shut down — its own
    /// teardown announces the departure, so a failure while fanning out a
    /// `user_left` can never re-enter the broadcaster.
    ///
    /// Returns the number of sessions the event was handed to.
    pub async fn broadcast(
        &self,
        room_id: &str,
        event: &ServerEvent,
        exclude: Option<&str>,
    ) -> usize {
        let payload: Arc<str> = match event.to_json() {
            Ok(json) => json.into(),
            Err(e) => {
                tracing::error!(room_id, kind = event.kind(), error = %e, "Failed to serialize event");
                return 0;
            }
        };

        let members = self.registry.members(room_id);

        let sends = members
            .iter()
            .filter(|session| exclude != Some(session.session_id()))
            .map(|session| {
                let payload = payload.clone();
                async move {
                    let result = session.send(payload, self.send_timeout).await;
                    (session, result)
                }
            });

        let mut delivered = 0;
        for (session, result) in join_all(sends).await {
            match result {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(
                        room_id,
                        session_id = %session.session_id(),
                        user_id = %session.user_id(),
                        error = %e,
                        "Delivery failed, evicting session"
                    );
                    self.evict(room_id, session);
                }
            }
        }

        tracing::trace!(
            room_id,
            kind = event.kind(),
            delivered,
            "Event fanned out"
        );

        delivered
    }

    /// Remove a failed session from its room and signal its receive loop.
    ///
    /// No departure event is sent here; the evicted session's lifecycle
    /// teardown does that exactly once.
    fn evict(&self, room_id: &str, session: &Session) {
        self.registry.remove(room_id, session.session_id());
        session.close();
    }
}

impl std::fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("send_timeout", &self.send_timeout)
            .finish_non_exhaustive()
    }
}

//! Live connection session
//!
//! A `Session` binds one open WebSocket to one authenticated identity and
//! one room. It exclusively owns the sending half of the connection through
//! a bounded outbound queue: a single writer task drains the queue onto the
//! socket, so concurrent fan-out and direct replies can never interleave
//! frames on the wire.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, Notify};
use uuid::Uuid;

use synapse_core::UserIdentity;

use crate::close_codes::CloseCode;

/// One entry in a session's outbound queue
#[derive(Debug, Clone)]
pub enum Outbound {
    /// A serialized event; shared so fan-out serializes once per room
    Event(Arc<str>),
    /// Terminate the connection with the given close code
    Close(CloseCode),
}

/// Failure to hand an event to a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The session's queue did not accept the event within the send bound
    #[error("send timed out")]
    Timeout,
    /// The session's writer is gone
    #[error("session closed")]
    Closed,
}

/// A live, admitted connection
pub struct Session {
    session_id: String,
    identity: UserIdentity,
    room_id: String,
    outbound: mpsc::Sender<Outbound>,
    /// Fired by the broadcaster to evict this session; the receive loop
    /// observes it and runs the normal teardown path
    shutdown: Notify,
}

impl Session {
    /// Create a new session around the sending half of a connection
    pub fn new(
        identity: UserIdentity,
        room_id: impl Into<String>,
        outbound: mpsc::Sender<Outbound>,
    ) -> Arc<Self> {
        Arc::new(Self {
            session_id: Uuid::new_v4().to_string(),
            identity,
            room_id: room_id.into(),
            outbound,
            shutdown: Notify::new(),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn identity(&self) -> &UserIdentity {
        &self.identity
    }

    pub fn user_id(&self) -> &str {
        &self.identity.user_id
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Queue a serialized event, bounded by `timeout`.
    ///
    /// A full queue that stays full for the whole window means the client
    /// is not draining its socket; the caller treats that as a failed
    /// delivery and evicts.
    pub async fn send(&self, payload: Arc<str>, timeout: Duration) -> Result<(), DeliveryError> {
        self.outbound
            .send_timeout(Outbound::Event(payload), timeout)
            .await
            .map_err(|e| match e {
                mpsc::error::SendTimeoutError::Timeout(_) => DeliveryError::Timeout,
                mpsc::error::SendTimeoutError::Closed(_) => DeliveryError::Closed,
            })
    }

    /// Ask the writer to send a close frame and shut the socket.
    ///
    /// Best-effort: a stalled queue is already being torn down, so a
    /// rejected close frame is not an error.
    pub fn send_close(&self, code: CloseCode) {
        let _ = self.outbound.try_send(Outbound::Close(code));
    }

    /// Signal this session's receive loop to stop (server-initiated eviction)
    pub fn close(&self) {
        self.shutdown.notify_one();
    }

    /// Resolves when [`Session::close`] has been called
    pub async fn evicted(&self) {
        self.shutdown.notified().await;
    }

    /// Whether the writer side is gone
    pub fn is_closed(&self) -> bool {
        self.outbound.is_closed()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("session_id", &self.session_id)
            .field("user_id", &self.identity.user_id)
            .field("room_id", &self.room_id)
            .finish()
    }
}

//! Gateway error taxonomy
//!
//! Every failure class has a designated recovery path: admission errors
//! close the connection with a distinguishing code, decode and persistence
//! failures are answered locally and keep the connection open, delivery
//! failures evict the failed member only.

use thiserror::Error;

use synapse_core::{AuthError, StoreError};

use crate::close_codes::CloseCode;
use crate::session::DeliveryError;

/// Gateway error type
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Token verification failed during admission
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(#[from] AuthError),

    /// Authenticated user is not a member of the room's team
    #[error("Access denied to room {0}")]
    AccessDenied(String),

    /// No team exists for the requested room
    #[error("Room not found: {0}")]
    RoomNotFound(String),

    /// Inbound frame could not be decoded
    #[error("Failed to decode frame: {0}")]
    Decode(#[from] serde_json::Error),

    /// A send to one session failed or timed out
    #[error("Delivery failed: {0}")]
    Delivery(#[from] DeliveryError),

    /// The document store or identity verifier was unreachable or failed
    #[error("Collaborator unavailable: {0}")]
    Collaborator(#[from] StoreError),
}

impl GatewayError {
    /// The close code used when this error terminates a connection
    #[must_use]
    pub fn close_code(&self) -> CloseCode {
        match self {
            Self::AuthenticationFailed(_) => CloseCode::AuthenticationFailed,
            Self::AccessDenied(_) => CloseCode::AccessDenied,
            Self::RoomNotFound(_) => CloseCode::RoomNotFound,
            Self::Decode(_) | Self::Delivery(_) | Self::Collaborator(_) => CloseCode::Internal,
        }
    }

    /// Whether the receive loop recovers from this error without closing
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::Collaborator(_))
    }
}

/// Gateway result type
pub type GatewayResult<T> = Result<T, GatewayError>;

//! WebSocket close codes
//!
//! Private-range close codes sent when the gateway terminates a connection,
//! so clients can distinguish "re-authenticate" from "retry later".

use serde::{Deserialize, Serialize};

/// Gateway WebSocket close codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum CloseCode {
    /// Unexpected server-side failure
    Internal = 4000,
    /// Token missing, invalid, or expired
    AuthenticationFailed = 4001,
    /// Authenticated user is not a member of the target team
    AccessDenied = 4002,
    /// The target room does not exist
    RoomNotFound = 4003,
    /// No inbound frames within the idle bound
    IdleTimeout = 4004,
}

impl CloseCode {
    /// Create a `CloseCode` from a raw u16 value
    #[must_use]
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            4000 => Some(Self::Internal),
            4001 => Some(Self::AuthenticationFailed),
            4002 => Some(Self::AccessDenied),
            4003 => Some(Self::RoomNotFound),
            4004 => Some(Self::IdleTimeout),
            _ => None,
        }
    }

    /// Get the raw u16 value
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Check if the client may retry with the same credentials
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Internal | Self::IdleTimeout)
    }

    /// Get the description for this close code
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Internal => "Internal error",
            Self::AuthenticationFailed => "Authentication failed",
            Self::AccessDenied => "Access denied",
            Self::RoomNotFound => "Room not found",
            Self::IdleTimeout => "Idle timeout",
        }
    }
}

impl std::fmt::Display for CloseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_u16())
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> Self {
        code.as_u16()
    }
}

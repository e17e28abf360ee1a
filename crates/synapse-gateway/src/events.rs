//! Event codec
//!
//! The wire taxonomy for one connection: two client-originated frame kinds
//! and six server-originated event kinds, all JSON objects tagged by `type`.
//! Unknown discriminators are a decode failure, never a crash.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use synapse_core::{Message, UserIdentity};

/// Frames a client may send.
///
/// Everything else on the wire is server-originated; an inbound frame with
/// any other tag fails to decode and is answered with a local `error` event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    ChatMessage {
        content: String,
        #[serde(default)]
        reply_to: Option<String>,
    },
    Typing {
        #[serde(default)]
        is_typing: bool,
    },
}

impl ClientFrame {
    /// Decode one inbound text frame
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Events the server sends.
///
/// Every event carries its `type` tag and a server-side `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    ChatMessage {
        message: Message,
        timestamp: DateTime<Utc>,
    },
    Typing {
        user: UserIdentity,
        is_typing: bool,
        timestamp: DateTime<Utc>,
    },
    UserJoined {
        user: UserIdentity,
        timestamp: DateTime<Utc>,
    },
    UserLeft {
        user: UserIdentity,
        timestamp: DateTime<Utc>,
    },
    RecentMessages {
        messages: Vec<Message>,
        timestamp: DateTime<Utc>,
    },
    Error {
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

impl ServerEvent {
    #[must_use]
    pub fn chat_message(message: Message) -> Self {
        Self::ChatMessage {
            message,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn typing(user: UserIdentity, is_typing: bool) -> Self {
        Self::Typing {
            user,
            is_typing,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn user_joined(user: UserIdentity) -> Self {
        Self::UserJoined {
            user,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn user_left(user: UserIdentity) -> Self {
        Self::UserLeft {
            user,
            timestamp: Utc::now(),
        }
    }

    /// Replay window for a newly admitted session, oldest message first
    #[must_use]
    pub fn recent_messages(messages: Vec<Message>) -> Self {
        Self::RecentMessages {
            messages,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn error(reason: impl Into<String>) -> Self {
        Self::Error {
            reason: reason.into(),
            timestamp: Utc::now(),
        }
    }

    /// The wire tag, for logging
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ChatMessage { .. } => "chat_message",
            Self::Typing { .. } => "typing",
            Self::UserJoined { .. } => "user_joined",
            Self::UserLeft { .. } => "user_left",
            Self::RecentMessages { .. } => "recent_messages",
            Self::Error { .. } => "error",
        }
    }

    /// Serialize to the wire representation
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

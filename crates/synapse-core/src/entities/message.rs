//! Message entity - represents a persisted chat message

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::UserIdentity;

/// Delivery status of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Sent,
    Delivered,
    Read,
}

/// Message entity
///
/// Owned by the `messages` collection of the document store. The messaging
/// core creates messages with status `Sent` and never mutates them; edits
/// and reactions belong to the CRUD layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: String,
    pub team_id: String,
    pub sender_id: String,
    pub sender_email: String,
    pub sender_name: String,
    pub content: String,
    pub message_type: String,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reactions: Option<HashMap<String, Vec<String>>>,
}

impl Message {
    /// Create a new text message from an authenticated sender.
    ///
    /// Assigns a fresh message id and a server-side timestamp; sender fields
    /// come from the verified identity, never from the client payload.
    pub fn new_text(
        team_id: impl Into<String>,
        sender: &UserIdentity,
        content: impl Into<String>,
        reply_to: Option<String>,
    ) -> Self {
        Self {
            message_id: Uuid::new_v4().to_string(),
            team_id: team_id.into(),
            sender_id: sender.user_id.clone(),
            sender_email: sender.email.clone(),
            sender_name: sender.display_name().to_string(),
            content: content.into(),
            message_type: "text".to_string(),
            status: MessageStatus::Sent,
            created_at: Utc::now(),
            reply_to,
            reactions: None,
        }
    }

    /// Check if message content is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Check if message is a reply
    #[inline]
    pub fn is_reply(&self) -> bool {
        self.reply_to.is_some()
    }
}

//! Team entity - the membership authority for a chat room

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One member of a team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Team entity
///
/// Owned by the `teams` collection of the document store; read here only to
/// authorize room admission. Room ids and team ids are the same namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub team_id: String,
    pub name: String,
    pub admin_id: String,
    #[serde(default)]
    pub members: Vec<TeamMember>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message_at: Option<DateTime<Utc>>,
}

impl Team {
    /// Check whether a user may join this team's room.
    ///
    /// The admin is always a member even if absent from the member list.
    pub fn is_member(&self, user_id: &str) -> bool {
        self.admin_id == user_id || self.members.iter().any(|m| m.user_id == user_id)
    }
}

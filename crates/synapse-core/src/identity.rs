//! Authenticated user identity

use serde::{Deserialize, Serialize};

/// The identity bound to a connection after token verification.
///
/// Produced by an [`crate::IdentityVerifier`]; never constructed from
/// client-supplied payload fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub user_id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl UserIdentity {
    /// Create a new identity
    pub fn new(
        user_id: impl Into<String>,
        email: impl Into<String>,
        name: Option<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            name,
        }
    }

    /// Human-readable name for presence events.
    ///
    /// Falls back to the local part of the email when no display name was
    /// provided by the identity verifier.
    pub fn display_name(&self) -> &str {
        match &self.name {
            Some(name) if !name.is_empty() => name,
            _ => self.email.split('@').next().unwrap_or(&self.email),
        }
    }
}

//! Domain errors - error types for the collaborator ports

use thiserror::Error;

/// Errors surfaced by a [`crate::DocumentStore`] implementation
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached
    #[error("Document store unavailable: {0}")]
    Unavailable(String),

    /// The store rejected or failed the operation
    #[error("Document store operation failed: {0}")]
    Backend(String),

    /// A stored document could not be read back into its expected shape
    #[error("Corrupt document in collection '{collection}': {reason}")]
    Corrupt { collection: String, reason: String },
}

impl StoreError {
    /// Create a corrupt-document error
    pub fn corrupt(collection: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Corrupt {
            collection: collection.into(),
            reason: reason.to_string(),
        }
    }
}

/// Errors surfaced by an [`crate::IdentityVerifier`] implementation
#[derive(Debug, Error)]
pub enum AuthError {
    /// The token failed verification (bad signature, malformed, wrong claims)
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// The token was valid once but has expired
    #[error("Token expired")]
    Expired,

    /// The verifier itself could not be reached or failed internally
    #[error("Identity verifier unavailable: {0}")]
    Verifier(String),
}

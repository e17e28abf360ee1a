//! Collaborator ports - interfaces to the external document store and
//! identity verifier
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation. Both collaborators are potentially blocking
//! and potentially failing; callers must never invoke them while holding
//! room state locks.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{AuthError, StoreError};
use crate::identity::UserIdentity;

/// Result type for document store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Narrow interface to the external document store.
///
/// Documents are schemaless JSON values addressed by `(collection, id)`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document; `None` if absent
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>>;

    /// Create a document under the given id
    async fn create(&self, collection: &str, id: &str, doc: Value) -> StoreResult<()>;

    /// Shallow-merge `patch` into an existing document
    async fn update(&self, collection: &str, id: &str, patch: Value) -> StoreResult<()>;

    /// Fetch the `limit` newest documents where `doc[field] == equals`,
    /// returned in ascending `created_at` order (oldest first).
    async fn query_recent(
        &self,
        collection: &str,
        field: &str,
        equals: &str,
        limit: i64,
    ) -> StoreResult<Vec<Value>>;
}

/// Narrow interface to the external identity verifier.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Resolve an opaque bearer token into a verified identity
    async fn verify(&self, token: &str) -> Result<UserIdentity, AuthError>;
}

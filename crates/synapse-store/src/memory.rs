//! In-memory document store
//!
//! Backs tests and local development. Mirrors the persistent store's
//! semantics: upsert on create, merge on update, recency queries ordered by
//! creation time.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;

use synapse_core::{DocumentStore, StoreError, StoreResult};

struct StoredDoc {
    value: Value,
    created_at: DateTime<Utc>,
    // Tiebreaker for documents created within the same timestamp tick
    seq: u64,
}

/// Process-local [`DocumentStore`]
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, HashMap<String, StoredDoc>>>,
    seq: AtomicU64,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently in a collection
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map_or(0, HashMap::len)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        Ok(self
            .collections
            .read()
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|doc| doc.value.clone()))
    }

    async fn create(&self, collection: &str, id: &str, doc: Value) -> StoreResult<()> {
        let stored = StoredDoc {
            value: doc,
            created_at: Utc::now(),
            seq: self.seq.fetch_add(1, Ordering::Relaxed),
        };

        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), stored);

        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> StoreResult<()> {
        let mut collections = self.collections.write();
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| {
                StoreError::Backend(format!("no document '{id}' in collection '{collection}'"))
            })?;

        match (&mut doc.value, patch) {
            (Value::Object(target), Value::Object(fields)) => {
                for (key, value) in fields {
                    target.insert(key, value);
                }
                Ok(())
            }
            _ => Err(StoreError::Backend(
                "update requires object documents".to_string(),
            )),
        }
    }

    async fn query_recent(
        &self,
        collection: &str,
        field: &str,
        equals: &str,
        limit: i64,
    ) -> StoreResult<Vec<Value>> {
        let collections = self.collections.read();
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matching: Vec<&StoredDoc> = docs
            .values()
            .filter(|doc| doc.value.get(field).and_then(Value::as_str) == Some(equals))
            .collect();

        // Newest first to apply the limit, then ascending for the caller
        matching.sort_by(|a, b| (b.created_at, b.seq).cmp(&(a.created_at, a.seq)));
        matching.truncate(usize::try_from(limit).unwrap_or(0));
        matching.reverse();

        Ok(matching.into_iter().map(|doc| doc.value.clone()).collect())
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("collections", &self.collections.read().len())
            .finish()
    }
}

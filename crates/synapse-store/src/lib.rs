//! # synapse-store
//!
//! `DocumentStore` implementations for the Synapse messaging service.
//!
//! The store holds schemaless JSON documents addressed by
//! `(collection, id)`. Two backends are provided:
//!
//! - [`PgDocumentStore`]: one JSONB table in PostgreSQL, used in production
//! - [`MemoryStore`]: process-local maps, used by tests and local development

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::{create_pool, PgDocumentStore, PoolConfig};

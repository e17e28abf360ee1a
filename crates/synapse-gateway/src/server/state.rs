//! Gateway state
//!
//! Shared dependencies for the gateway server.

use std::sync::Arc;

use synapse_common::ChatConfig;
use synapse_core::{DocumentStore, IdentityVerifier};

use crate::broadcast::Broadcaster;
use crate::registry::RoomRegistry;

/// Gateway application state
///
/// One registry and one broadcaster per server process; every connection's
/// task shares them by reference.
#[derive(Clone)]
pub struct GatewayState {
    store: Arc<dyn DocumentStore>,
    verifier: Arc<dyn IdentityVerifier>,
    registry: Arc<RoomRegistry>,
    broadcaster: Arc<Broadcaster>,
    chat: ChatConfig,
}

impl GatewayState {
    /// Wire up the state from its collaborators and tuning knobs
    pub fn new(
        store: Arc<dyn DocumentStore>,
        verifier: Arc<dyn IdentityVerifier>,
        chat: ChatConfig,
    ) -> Self {
        let registry = RoomRegistry::new_shared();
        let broadcaster = Arc::new(Broadcaster::new(registry.clone(), chat.send_timeout()));

        Self {
            store,
            verifier,
            registry,
            broadcaster,
            chat,
        }
    }

    /// Get the document store
    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    /// Get the identity verifier
    pub fn verifier(&self) -> &dyn IdentityVerifier {
        self.verifier.as_ref()
    }

    /// Get the room registry
    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Get the broadcaster
    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    /// Get the chat tuning configuration
    pub fn chat_config(&self) -> &ChatConfig {
        &self.chat
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("registry", &self.registry)
            .field("chat", &self.chat)
            .finish_non_exhaustive()
    }
}

//! Public key caching.
//!
//! Looking up a recipient's key through the gateway costs a request, so
//! the client consults a [`PublicKeyStore`] first and saves what the
//! gateway returns.

use std::collections::HashMap;
use std::sync::RwLock;

use threema_gateway_types::{GatewayError, Identity, PublicKey, Result};

/// Storage for recipient public keys.
pub trait PublicKeyStore: Send + Sync {
    /// Returns the cached key for `identity`, if any.
    fn fetch(&self, identity: &Identity) -> Result<Option<PublicKey>>;

    /// Stores `key` for `identity`, replacing an older entry.
    fn save(&self, identity: &Identity, key: PublicKey) -> Result<()>;
}

/// A store that never remembers anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoKeyStore;

impl PublicKeyStore for NoKeyStore {
    fn fetch(&self, _identity: &Identity) -> Result<Option<PublicKey>> {
        Ok(None)
    }

    fn save(&self, _identity: &Identity, _key: PublicKey) -> Result<()> {
        Ok(())
    }
}

/// Thread-safe in-memory store.
///
/// Concurrent misses for the same identity may both reach the gateway;
/// the later save wins with an identical key.
#[derive(Debug, Default)]
pub struct InMemoryKeyStore {
    keys: RwLock<HashMap<Identity, PublicKey>>,
}

impl InMemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached keys.
    pub fn len(&self) -> Result<usize> {
        let keys = self.keys.read().map_err(|e| GatewayError::KeyStoreError {
            reason: format!("key store lock poisoned: {e}"),
        })?;
        Ok(keys.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.len().map(|n| n == 0)
    }
}

impl PublicKeyStore for InMemoryKeyStore {
    fn fetch(&self, identity: &Identity) -> Result<Option<PublicKey>> {
        let keys = self.keys.read().map_err(|e| GatewayError::KeyStoreError {
            reason: format!("key store lock poisoned: {e}"),
        })?;
        Ok(keys.get(identity).copied())
    }

    fn save(&self, identity: &Identity, key: PublicKey) -> Result<()> {
        let mut keys = self.keys.write().map_err(|e| GatewayError::KeyStoreError {
            reason: format!("key store lock poisoned: {e}"),
        })?;
        keys.insert(identity.clone(), key);
        Ok(())
    }
}

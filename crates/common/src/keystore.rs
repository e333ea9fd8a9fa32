use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::crypto::{KeyPair, SigningSecret, VerKey};

/// Key lookup capability handed to `unpack`
///
/// Given a base58 verkey taken straight off the wire, return the matching
///  signing secret if this party holds it. The verkey is attacker
///  controlled: implementations must not have side effects, and must be
///  safe to call repeatedly and concurrently.
#[async_trait]
pub trait KeyStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn find_key(&self, verkey: &str) -> Result<Option<SigningSecret>, Self::Error>;
}

/// In-memory key store keyed by base58 verkey
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyStore {
    inner: Arc<RwLock<HashMap<String, SigningSecret>>>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryKeyStoreError {
    #[error("memory key store error: {0}")]
    Internal(String),
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a keypair, returning its verkey
    pub fn insert(&self, keypair: &KeyPair) -> Result<VerKey, MemoryKeyStoreError> {
        self.insert_secret(keypair.secret.clone())
    }

    pub fn insert_secret(&self, secret: SigningSecret) -> Result<VerKey, MemoryKeyStoreError> {
        let verkey = secret.public();
        let mut inner = self.inner.write().map_err(|e| {
            MemoryKeyStoreError::Internal(format!("failed to acquire write lock: {}", e))
        })?;
        inner.insert(verkey.to_base58(), secret);
        Ok(verkey)
    }

    pub fn remove(&self, verkey: &VerKey) -> Result<bool, MemoryKeyStoreError> {
        let mut inner = self.inner.write().map_err(|e| {
            MemoryKeyStoreError::Internal(format!("failed to acquire write lock: {}", e))
        })?;
        Ok(inner.remove(&verkey.to_base58()).is_some())
    }

    pub fn len(&self) -> Result<usize, MemoryKeyStoreError> {
        let inner = self.inner.read().map_err(|e| {
            MemoryKeyStoreError::Internal(format!("failed to acquire read lock: {}", e))
        })?;
        Ok(inner.len())
    }

    pub fn is_empty(&self) -> Result<bool, MemoryKeyStoreError> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl KeyStore for MemoryKeyStore {
    type Error = MemoryKeyStoreError;

    async fn find_key(&self, verkey: &str) -> Result<Option<SigningSecret>, Self::Error> {
        let inner = self.inner.read().map_err(|e| {
            MemoryKeyStoreError::Internal(format!("failed to acquire read lock: {}", e))
        })?;
        Ok(inner.get(verkey).cloned())
    }
}

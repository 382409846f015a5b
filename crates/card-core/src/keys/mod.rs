//! Encryption key lifecycle: lazy creation, persistence, and lookup.
//!
//! # Lifecycle
//!
//! 1. The first encryption or decryption reads the descriptor stored under
//!    the configured id from the injected [`KeyStore`].
//! 2. If nothing is stored, a fresh 256-bit key is generated and offered to
//!    the store with [`KeyStore::create`]. If another manager or process
//!    created the entry first, the stored key is read back and used instead.
//! 3. The loaded key is cached for the lifetime of the manager; later calls
//!    hand out short-lived clones.
//!
//! # Security invariants
//!
//! - Steps 1–2 run at most once at a time per manager, and the store's
//!   create-if-absent decides between managers, so every caller of one
//!   storage scope ends up with the same key.
//! - Key material never leaves this crate; callers see only
//!   [`KeyManager::key_id`].
//! - A descriptor that exists but cannot be parsed is an error. It is never
//!   replaced with a new key, which would orphan every existing ciphertext.
//! - Key bytes are never logged; only [`EncryptionKey::fingerprint`] is.

pub mod material;
pub mod store;

pub use material::{EncryptionKey, Jwk, KEY_LEN};
pub use store::{FileKeyStore, KeyStore, MemoryKeyStore, StoreError};

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Store id used when the caller does not choose one.
pub const DEFAULT_STORAGE_ID: &str = "card_encryption_key";

/// Errors produced by the key layer. Both variants mean the key is unavailable.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The key store could not be read or written.
    #[error("key store failure: {0}")]
    Store(#[from] StoreError),

    /// A descriptor is stored but cannot be turned back into a key.
    #[error("stored key descriptor is corrupted: {0}")]
    Corrupted(String),
}

/// Owns the single encryption key of one storage scope.
///
/// Cheap to clone; clones share the cached key and the initialisation guard.
#[derive(Clone)]
pub struct KeyManager {
    store: Arc<dyn KeyStore>,
    storage_id: Arc<str>,
    key: Arc<OnceCell<EncryptionKey>>,
}

impl KeyManager {
    /// Create a manager that keeps its key under [`DEFAULT_STORAGE_ID`].
    pub fn new(store: Arc<dyn KeyStore>) -> Self {
        Self::with_storage_id(store, DEFAULT_STORAGE_ID)
    }

    /// Create a manager that keeps its key under `storage_id`.
    pub fn with_storage_id(store: Arc<dyn KeyStore>, storage_id: impl Into<String>) -> Self {
        Self {
            store,
            storage_id: Arc::from(storage_id.into()),
            key: Arc::new(OnceCell::new()),
        }
    }

    /// Id of the store entry this manager reads and writes.
    pub fn storage_id(&self) -> &str {
        &self.storage_id
    }

    /// Returns `true` once the key has been loaded or created in this process.
    pub fn is_ready(&self) -> bool {
        self.key.initialized()
    }

    /// Fingerprint of the loaded key, or `None` before first use.
    pub fn key_id(&self) -> Option<String> {
        self.key.get().map(EncryptionKey::fingerprint)
    }

    /// Return the key for this storage scope, loading or creating it on first use.
    ///
    /// The returned clone is short-lived; callers should use and drop it promptly.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Store`] if the store cannot be read or the new key
    /// cannot be persisted, and [`KeyError::Corrupted`] if the stored
    /// descriptor is unreadable. A failed attempt is not cached.
    pub(crate) async fn get_or_create_key(&self) -> Result<EncryptionKey, KeyError> {
        let key = self
            .key
            .get_or_try_init(|| self.load_or_generate())
            .await?;
        Ok(key.clone())
    }

    async fn load_or_generate(&self) -> Result<EncryptionKey, KeyError> {
        if let Some(bytes) = self.store.get(&self.storage_id).await? {
            return self.load(&bytes);
        }

        let key = EncryptionKey::generate();
        let descriptor = serde_json::to_vec(&key.to_jwk())
            .map_err(|e| KeyError::Corrupted(e.to_string()))?;
        if self.store.create(&self.storage_id, &descriptor).await? {
            info!(storage_id = %self.storage_id, key_id = %key.fingerprint(), "generated new encryption key");
            return Ok(key);
        }

        // Another writer created the entry between our read and our create.
        debug!(storage_id = %self.storage_id, "key created concurrently, loading stored key");
        match self.store.get(&self.storage_id).await? {
            Some(bytes) => self.load(&bytes),
            None => Err(KeyError::Store(StoreError::Unavailable(
                "key descriptor vanished after concurrent creation".into(),
            ))),
        }
    }

    fn load(&self, bytes: &[u8]) -> Result<EncryptionKey, KeyError> {
        let key = decode_descriptor(bytes).map_err(|reason| {
            warn!(storage_id = %self.storage_id, %reason, "stored key descriptor rejected");
            KeyError::Corrupted(reason)
        })?;
        debug!(storage_id = %self.storage_id, key_id = %key.fingerprint(), "loaded encryption key");
        Ok(key)
    }
}

impl std::fmt::Debug for KeyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyManager")
            .field("storage_id", &self.storage_id)
            .field("ready", &self.is_ready())
            .finish()
    }
}

fn decode_descriptor(bytes: &[u8]) -> Result<EncryptionKey, String> {
    let jwk: Jwk = serde_json::from_slice(bytes).map_err(|e| format!("invalid JWK JSON: {e}"))?;
    EncryptionKey::from_jwk(&jwk)
}

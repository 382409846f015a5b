//! [`KeyStore`]: the persistent key-value store the key descriptor lives in.
//!
//! The core reads with `get` and creates the descriptor with `create`, which
//! must be atomic: when several writers race on one id, exactly one of them
//! wins and the others see the winner's value. `set` overwrites and is only
//! used by tooling and tests. Two implementations ship with the crate; other
//! backends implement the trait themselves.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors produced by a [`KeyStore`] backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing storage could not be read or written.
    #[error("key store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The entry id is not usable with this backend.
    #[error("invalid key store id: {0:?}")]
    InvalidId(String),

    /// The backend is temporarily unreachable.
    #[error("key store unavailable: {0}")]
    Unavailable(String),
}

/// Persistent key-value storage for the serialised key descriptor.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Read the value stored under `id`, or `None` if nothing has been stored.
    async fn get(&self, id: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Store (or replace) the value under `id`.
    async fn set(&self, id: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Store `value` under `id` only if nothing is stored there yet.
    ///
    /// Returns `true` if this call created the entry and `false` if an entry
    /// already existed, in which case it is left untouched.
    async fn create(&self, id: &str, value: &[u8]) -> Result<bool, StoreError>;
}

/// In-process [`KeyStore`] backed by a `HashMap`.
///
/// Clones share the same map, so a clone handed to a second `KeyManager`
/// behaves like a second handle on the same storage scope.
#[derive(Clone, Debug, Default)]
pub struct MemoryKeyStore {
    inner: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryKeyStore {
    /// Create a new, empty [`MemoryKeyStore`].
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyStore for MemoryKeyStore {
    async fn get(&self, id: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.inner.read().await.get(id).cloned())
    }

    async fn set(&self, id: &str, value: &[u8]) -> Result<(), StoreError> {
        self.inner.write().await.insert(id.to_owned(), value.to_vec());
        Ok(())
    }

    async fn create(&self, id: &str, value: &[u8]) -> Result<bool, StoreError> {
        match self.inner.write().await.entry(id.to_owned()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(value.to_vec());
                Ok(true)
            }
        }
    }
}

/// [`KeyStore`] that keeps one file per id inside a directory.
///
/// Writes land in a uniquely named sibling temporary file first and are then
/// moved into place, so a reader never observes a half-written descriptor.
/// [`KeyStore::create`] links the temporary file without clobbering, so it is
/// atomic across processes sharing the directory.
#[derive(Clone, Debug)]
pub struct FileKeyStore {
    root: PathBuf,
}

impl FileKeyStore {
    /// Create a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory this store writes into.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, id: &str) -> Result<PathBuf, StoreError> {
        if !is_valid_id(id) {
            return Err(StoreError::InvalidId(id.to_owned()));
        }
        Ok(self.root.join(id))
    }

    /// Write `value` to a fresh temporary file inside the store directory.
    ///
    /// The file name is random and hidden, so it never collides with another
    /// writer or with a valid id. It is removed on drop unless persisted.
    async fn write_temp(&self, value: &[u8]) -> Result<NamedTempFile, StoreError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let root = self.root.clone();
        let value = value.to_vec();
        run_blocking(move || {
            let mut tmp = tempfile::Builder::new()
                .prefix(".tmp-")
                .tempfile_in(&root)?;
            tmp.write_all(&value)?;
            tmp.as_file().sync_all()?;
            Ok(tmp)
        })
        .await
    }
}

#[async_trait]
impl KeyStore for FileKeyStore {
    async fn get(&self, id: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.entry_path(id)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, id: &str, value: &[u8]) -> Result<(), StoreError> {
        let path = self.entry_path(id)?;
        let tmp = self.write_temp(value).await?;
        run_blocking(move || tmp.persist(&path).map(drop).map_err(|e| e.error)).await
    }

    async fn create(&self, id: &str, value: &[u8]) -> Result<bool, StoreError> {
        let path = self.entry_path(id)?;
        let tmp = self.write_temp(value).await?;
        run_blocking(move || match tmp.persist_noclobber(&path) {
            Ok(_) => Ok(true),
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.error),
        })
        .await
    }
}

/// Run blocking filesystem work off the async executor.
async fn run_blocking<T, F>(f: F) -> Result<T, StoreError>
where
    F: FnOnce() -> std::io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::Unavailable(format!("blocking file task failed: {e}")))?
        .map_err(StoreError::from)
}

/// Ids map directly to file names, so only a conservative character set is
/// accepted and hidden names (used for temporaries) are refused.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('.')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

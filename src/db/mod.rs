//! Persistence module
//!
//! JSON documents behind a small key/value [`Store`] trait with:
//! - Atomic per-key reads, writes and deletes
//! - A file-backed implementation for production and an in-memory one for tests
//! - Repository functions that own the record layout (users, playlists, connections)
//! - An in-process index lock so read-modify-write cycles on index records never lose updates

pub mod file_store;
#[cfg(test)]
pub mod memory_store;
pub mod repository;

pub use file_store::FileStore;
#[cfg(test)]
pub use memory_store::MemoryStore;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::Config;

/// Index of registered users
pub const USERS_KEY: &str = "users";
/// Index of playlist metadata records
pub const PLAYLISTS_KEY: &str = "playlists";
/// Index of generated XStream connections
pub const CONNECTIONS_KEY: &str = "xstream_connections";

/// Key holding the channel list of one playlist
pub fn playlist_content_key(playlist_id: &str) -> String {
    format!("{}/{}", PLAYLISTS_KEY, playlist_id)
}

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid store key: {0}")]
    InvalidKey(String),
    #[error("I/O error on {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt record {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode record {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Raw key/value storage. Every call is atomic for its key.
#[async_trait]
pub trait Store: Send + Sync {
    /// Read the bytes stored under `key`, `None` when absent
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replace the bytes stored under `key`
    async fn write(&self, key: &str, data: &[u8]) -> Result<(), StoreError>;

    /// Delete `key`, returning whether it existed
    async fn remove(&self, key: &str) -> Result<bool, StoreError>;

    /// Check that the backing storage is reachable
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Keys are slash-separated segments of `[A-Za-z0-9_-]`
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && key.split('/').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        });

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

/// Typed access to the store shared by all handlers
#[derive(Clone)]
pub struct Db {
    store: Arc<dyn Store>,
    index_lock: Arc<Mutex<()>>,
}

impl Db {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            index_lock: Arc::new(Mutex::new(())),
        }
    }

    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Read and decode a JSON document
    pub async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.store.read(key).await? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|source| StoreError::Corrupt {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    /// Encode and write a JSON document
    pub async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.store.write(key, &bytes).await
    }

    pub async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        self.store.remove(key).await
    }

    /// Read an index record; a missing record is an empty list
    pub async fn read_list<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, StoreError> {
        Ok(self.read_json(key).await?.unwrap_or_default())
    }

    /// Read-modify-write an index record exactly once.
    ///
    /// The closure returns `None` to leave the record untouched; otherwise the
    /// modified list is written back and the closure's value is returned.
    pub async fn update_list<T, R, F>(&self, key: &str, f: F) -> Result<Option<R>, StoreError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut Vec<T>) -> Option<R>,
    {
        let _guard = self.index_lock.lock().await;

        let mut list: Vec<T> = self.read_list(key).await?;
        match f(&mut list) {
            Some(result) => {
                self.write_json(key, &list).await?;
                Ok(Some(result))
            }
            None => Ok(None),
        }
    }

    /// Health check for the store
    pub async fn health_check(&self) -> bool {
        match self.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Store health check failed: {}", e);
                false
            }
        }
    }
}

/// Open the file-backed store configured for this process
pub async fn open(config: &Config) -> Result<Db, StoreError> {
    let store = FileStore::open(&config.data_dir).await?;
    tracing::info!("File store opened at {}", config.data_dir);
    Ok(Db::new(Arc::new(store)))
}

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{validate_key, Store, StoreError};

/// Store kept entirely in memory
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        validate_key(key)?;
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn write(&self, key: &str, data: &[u8]) -> Result<(), StoreError> {
        validate_key(key)?;
        self.records
            .write()
            .await
            .insert(key.to_string(), data.to_vec());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        validate_key(key)?;
        Ok(self.records.write().await.remove(key).is_some())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

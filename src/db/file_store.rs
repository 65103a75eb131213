//! File-backed store: one pretty-printed JSON file per key under the data directory

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use super::{validate_key, Store, StoreError};

/// Store that maps key `a/b` to `<root>/a/b.json`
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) the data directory
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await.map_err(|source| StoreError::Io {
            key: root.display().to_string(),
            source,
        })?;

        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.root.join(format!("{}.json", key)))
    }
}

fn io_error(key: &str, source: std::io::Error) -> StoreError {
    StoreError::Io {
        key: key.to_string(),
        source,
    }
}

#[async_trait]
impl Store for FileStore {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(key, e)),
        }
    }

    async fn write(&self, key: &str, data: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| io_error(key, e))?;
        }

        let tmp_path = path.with_extension(format!("json.{}.tmp", uuid::Uuid::new_v4().simple()));

        let result: std::io::Result<()> = async {
            let mut file = File::create(&tmp_path).await?;
            file.write_all(data).await?;
            file.sync_all().await?;
            drop(file);

            // Atomic replace to avoid readers seeing partial writes
            fs::rename(&tmp_path, &path).await
        }
        .await;

        if let Err(e) = result {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(io_error(key, e));
        }

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(key, e)),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let metadata = fs::metadata(&self.root)
            .await
            .map_err(|e| io_error(&self.root.display().to_string(), e))?;

        if metadata.is_dir() {
            Ok(())
        } else {
            Err(io_error(
                &self.root.display().to_string(),
                std::io::Error::new(ErrorKind::Other, "data path is not a directory"),
            ))
        }
    }
}

//! Playlist repository
//!
//! Metadata lives in the `playlists` index; each playlist's channels live in
//! their own `playlists/<id>` record.

use crate::db::{playlist_content_key, Db, StoreError, PLAYLISTS_KEY};
use crate::models::{Channel, PlaylistMeta};

/// All playlists owned by a user, in import order
pub async fn list_for_owner(db: &Db, owner_id: &str) -> Result<Vec<PlaylistMeta>, StoreError> {
    let playlists: Vec<PlaylistMeta> = db.read_list(PLAYLISTS_KEY).await?;
    Ok(playlists
        .into_iter()
        .filter(|p| p.owner_id == owner_id)
        .collect())
}

pub async fn find_by_id(db: &Db, id: &str) -> Result<Option<PlaylistMeta>, StoreError> {
    let playlists: Vec<PlaylistMeta> = db.read_list(PLAYLISTS_KEY).await?;
    Ok(playlists.into_iter().find(|p| p.id == id))
}

/// Channels of a playlist, `None` when the content record is missing
pub async fn get_channels(db: &Db, id: &str) -> Result<Option<Vec<Channel>>, StoreError> {
    db.read_json(&playlist_content_key(id)).await
}

/// Persist a new playlist: content first, then the index entry.
///
/// If the index update fails the content record is deleted again, so a
/// playlist is either fully stored or not at all.
pub async fn save_new(db: &Db, meta: PlaylistMeta, channels: &[Channel]) -> Result<PlaylistMeta, StoreError> {
    let content_key = playlist_content_key(&meta.id);
    db.write_json(&content_key, channels).await?;

    let indexed = meta.clone();
    let result = db
        .update_list(PLAYLISTS_KEY, move |playlists: &mut Vec<PlaylistMeta>| {
            playlists.push(indexed);
            Some(())
        })
        .await;

    if let Err(e) = result {
        tracing::error!("Failed to index playlist {}: {}", meta.id, e);
        if let Err(cleanup) = db.remove(&content_key).await {
            tracing::error!("Failed to remove orphaned content {}: {}", content_key, cleanup);
        }
        return Err(e);
    }

    Ok(meta)
}

/// Delete a playlist's content and index entry. Returns whether it existed.
pub async fn delete(db: &Db, id: &str) -> Result<bool, StoreError> {
    db.remove(&playlist_content_key(id)).await?;

    let removed = db
        .update_list(PLAYLISTS_KEY, |playlists: &mut Vec<PlaylistMeta>| {
            let position = playlists.iter().position(|p| p.id == id)?;
            Some(playlists.remove(position))
        })
        .await?;

    Ok(removed.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, Store};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Arc;

    fn meta(id: &str, owner: &str) -> PlaylistMeta {
        PlaylistMeta {
            id: id.to_string(),
            name: format!("Playlist {}", id),
            source_url: "http://example.com/list.m3u".to_string(),
            channel_count: 2,
            imported_at: Utc::now(),
            owner_id: owner.to_string(),
        }
    }

    fn channels() -> Vec<Channel> {
        vec![
            Channel {
                title: "News".to_string(),
                logo_url: String::new(),
                group: "Info".to_string(),
                stream_url: "http://a/news.m3u8".to_string(),
                user_agent: String::new(),
            },
            Channel {
                title: "Sports".to_string(),
                logo_url: "http://a/sports.png".to_string(),
                group: "Info".to_string(),
                stream_url: "http://a/sports.m3u8".to_string(),
                user_agent: "Kodi/20".to_string(),
            },
        ]
    }

    /// Store whose writes to one key always fail
    struct FailingIndexStore {
        inner: MemoryStore,
        failing_key: &'static str,
    }

    #[async_trait]
    impl Store for FailingIndexStore {
        async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
            self.inner.read(key).await
        }

        async fn write(&self, key: &str, data: &[u8]) -> Result<(), StoreError> {
            if key == self.failing_key {
                return Err(StoreError::Io {
                    key: key.to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
                });
            }
            self.inner.write(key, data).await
        }

        async fn remove(&self, key: &str) -> Result<bool, StoreError> {
            self.inner.remove(key).await
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_save_then_read_back_identical_channels() {
        let db = Db::in_memory();
        let channels = channels();

        save_new(&db, meta("p1", "u1"), &channels).await.unwrap();

        let stored = get_channels(&db, "p1").await.unwrap().unwrap();
        assert_eq!(stored, channels);
        assert_eq!(find_by_id(&db, "p1").await.unwrap().unwrap().owner_id, "u1");
    }

    #[tokio::test]
    async fn test_list_for_owner_keeps_import_order() {
        let db = Db::in_memory();

        save_new(&db, meta("p1", "u1"), &channels()).await.unwrap();
        save_new(&db, meta("p2", "u2"), &channels()).await.unwrap();
        save_new(&db, meta("p3", "u1"), &channels()).await.unwrap();

        let ids: Vec<String> = list_for_owner(&db, "u1")
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["p1", "p3"]);
    }

    #[tokio::test]
    async fn test_failed_index_write_removes_content() {
        let store = Arc::new(FailingIndexStore {
            inner: MemoryStore::new(),
            failing_key: PLAYLISTS_KEY,
        });
        let db = Db::new(store.clone());

        let result = save_new(&db, meta("p1", "u1"), &channels()).await;
        assert!(result.is_err());

        assert!(store.read("playlists/p1").await.unwrap().is_none());
        assert!(get_channels(&db, "p1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let db = Db::in_memory();
        save_new(&db, meta("p1", "u1"), &channels()).await.unwrap();

        assert!(delete(&db, "p1").await.unwrap());
        assert!(find_by_id(&db, "p1").await.unwrap().is_none());
        assert!(get_channels(&db, "p1").await.unwrap().is_none());
        assert!(!delete(&db, "p1").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_content_is_none() {
        let db = Db::in_memory();
        assert!(get_channels(&db, "nope").await.unwrap().is_none());
    }
}

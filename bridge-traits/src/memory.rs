//! In-Memory Reference Implementations
//!
//! Backing implementations of the bridge capabilities that hold everything
//! in process memory. Tests across the workspace run against these; they are
//! also the reference answer to "what are implementations allowed to do" for
//! edge cases such as deleting an absent key.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{BridgeError, Result};
use crate::media::{MediaFileStore, StoredFile};
use crate::source::TrackSource;
use crate::storage::KeyValueStore;

/// In-memory [`KeyValueStore`] over a `BTreeMap`.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<BTreeMap<String, Bytes>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, for test assertions.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Bytes) -> Result<()> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .entries
            .lock()
            .await
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

/// In-memory [`MediaFileStore`] with uuid handles and synthetic paths.
#[derive(Default)]
pub struct MemoryMediaStore {
    files: Mutex<HashMap<String, Bytes>>,
}

impl MemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored files, for test assertions.
    pub async fn file_count(&self) -> usize {
        self.files.lock().await.len()
    }

    fn path_for(handle: &str) -> PathBuf {
        PathBuf::from("/memory/media").join(handle)
    }
}

#[async_trait]
impl MediaFileStore for MemoryMediaStore {
    async fn store(&self, _name: &str, data: Bytes) -> Result<StoredFile> {
        let handle = Uuid::new_v4().to_string();
        let size_bytes = data.len() as u64;
        self.files.lock().await.insert(handle.clone(), data);

        Ok(StoredFile {
            path: Self::path_for(&handle),
            handle,
            size_bytes,
        })
    }

    async fn read_info(&self, handle: &str) -> Result<StoredFile> {
        let files = self.files.lock().await;
        let data = files
            .get(handle)
            .ok_or_else(|| BridgeError::NotFound(format!("no media file {handle}")))?;

        Ok(StoredFile {
            handle: handle.to_string(),
            path: Self::path_for(handle),
            size_bytes: data.len() as u64,
        })
    }

    async fn delete(&self, handle: &str) -> Result<()> {
        self.files
            .lock()
            .await
            .remove(handle)
            .map(|_| ())
            .ok_or_else(|| BridgeError::NotFound(format!("no media file {handle}")))
    }
}

/// [`TrackSource`] returning the same payload for every track.
pub struct StaticTrackSource {
    payload: Bytes,
}

impl StaticTrackSource {
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

#[async_trait]
impl TrackSource for StaticTrackSource {
    async fn fetch_audio(&self, _external_id: &str) -> Result<Bytes> {
        Ok(self.payload.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn kv_store_round_trip() {
        let store = MemoryKeyValueStore::new();

        store
            .put("songs/x1", Bytes::from_static(b"payload"))
            .await
            .unwrap();
        assert_eq!(
            store.get("songs/x1").await.unwrap(),
            Some(Bytes::from_static(b"payload"))
        );

        store.delete("songs/x1").await.unwrap();
        assert_eq!(store.get("songs/x1").await.unwrap(), None);

        // deleting again is fine
        store.delete("songs/x1").await.unwrap();
    }

    #[tokio::test]
    async fn kv_store_prefix_listing() {
        let store = MemoryKeyValueStore::new();
        store.put("songs/a", Bytes::new()).await.unwrap();
        store.put("songs/b", Bytes::new()).await.unwrap();
        store.put("playlists/a", Bytes::new()).await.unwrap();

        let keys = store.keys("songs/").await.unwrap();
        assert_eq!(keys, vec!["songs/a".to_string(), "songs/b".to_string()]);
    }

    #[tokio::test]
    async fn media_store_delete_reports_not_found() {
        let store = MemoryMediaStore::new();
        let stored = store.store("track", Bytes::from_static(b"xx")).await.unwrap();
        assert_eq!(stored.size_bytes, 2);
        assert!(store.exists(&stored.handle).await.unwrap());

        store.delete(&stored.handle).await.unwrap();
        let err = store.delete(&stored.handle).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(!store.exists(&stored.handle).await.unwrap());
    }
}

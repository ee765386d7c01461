//! File-backed key-value store.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::storage::KeyValueStore;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

/// One file per key under a root directory.
///
/// Keys are percent-escaped into file names, so collection-scoped keys like
/// `"songs/x1"` stay flat on disk. Values are written to a sibling temp
/// file and renamed into place, so a crash mid-write never leaves a torn
/// value behind.
pub struct FileKeyValueStore {
    root: PathBuf,
}

impl FileKeyValueStore {
    /// Create a store rooted at `root`. The directory is created lazily on
    /// the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create a store under the platform data directory.
    pub fn in_default_location(app_name: &str) -> Self {
        let root = dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(app_name)
            .join("documents");
        Self::new(root)
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    fn file_for(&self, key: &str) -> PathBuf {
        self.root.join(escape_key(key))
    }

    fn map_io_error(e: std::io::Error) -> BridgeError {
        BridgeError::Io(e)
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        match fs::read(self.file_for(key)).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::map_io_error(e)),
        }
    }

    async fn put(&self, key: &str, value: Bytes) -> Result<()> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(Self::map_io_error)?;

        let path = self.file_for(key);
        let tmp = self.root.join(format!("{}.tmp", escape_key(key)));
        fs::write(&tmp, value.as_ref())
            .await
            .map_err(Self::map_io_error)?;
        fs::rename(&tmp, &path).await.map_err(Self::map_io_error)?;

        debug!(key = key, size = value.len(), "Stored value");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.file_for(key)).await {
            Ok(()) => {
                debug!(key = key, "Deleted value");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::map_io_error(e)),
        }
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Self::map_io_error(e)),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(Self::map_io_error)? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".tmp") {
                continue;
            }
            let key = unescape_key(&name);
            if key.starts_with(prefix) {
                keys.push(key);
            }
        }

        keys.sort();
        Ok(keys)
    }
}

/// Escape a key into a safe flat file name.
fn escape_key(key: &str) -> String {
    let mut escaped = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            // '.' is escaped too, so no stored file can end in ".tmp".
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' => escaped.push(byte as char),
            other => escaped.push_str(&format!("%{other:02X}")),
        }
    }
    escaped
}

fn unescape_key(name: &str) -> String {
    let mut bytes = Vec::with_capacity(name.len());
    let mut chars = name.bytes();
    while let Some(byte) = chars.next() {
        if byte == b'%' {
            let hi = chars.next();
            let lo = chars.next();
            if let (Some(hi), Some(lo)) = (hi, lo) {
                let hex = [hi, lo];
                if let Ok(value) =
                    u8::from_str_radix(std::str::from_utf8(&hex).unwrap_or("00"), 16)
                {
                    bytes.push(value);
                    continue;
                }
            }
            bytes.push(byte);
        } else {
            bytes.push(byte);
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_escaping_round_trips() {
        for key in ["songs/x1", "playlists/π-mix", "a b%c", "plain"] {
            assert_eq!(unescape_key(&escape_key(key)), key);
        }
    }

    #[tokio::test]
    async fn round_trip_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::new(dir.path());

        store
            .put("songs/x1", Bytes::from_static(b"{\"id\":\"x1\"}"))
            .await
            .unwrap();
        assert_eq!(
            store.get("songs/x1").await.unwrap(),
            Some(Bytes::from_static(b"{\"id\":\"x1\"}"))
        );

        store.delete("songs/x1").await.unwrap();
        assert_eq!(store.get("songs/x1").await.unwrap(), None);

        // Absent keys delete cleanly.
        store.delete("songs/x1").await.unwrap();
    }

    #[tokio::test]
    async fn keys_filters_by_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::new(dir.path());

        store.put("songs/a", Bytes::new()).await.unwrap();
        store.put("songs/b", Bytes::new()).await.unwrap();
        store.put("playlists/p", Bytes::new()).await.unwrap();

        let keys = store.keys("songs/").await.unwrap();
        assert_eq!(keys, vec!["songs/a".to_string(), "songs/b".to_string()]);
    }

    #[tokio::test]
    async fn missing_root_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::new(dir.path().join("never-created"));

        assert!(store.keys("").await.unwrap().is_empty());
        assert_eq!(store.get("any").await.unwrap(), None);
    }
}

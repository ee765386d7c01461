//! Filesystem media store.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::media::{MediaFileStore, StoredFile};
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

/// Downloaded audio files under a media directory.
///
/// Handles are uuids minted at store time; the display name passed to
/// [`store`](MediaFileStore::store) is ignored for the on-disk name so that
/// arbitrary track titles can never escape the directory.
pub struct FsMediaStore {
    root: PathBuf,
}

impl FsMediaStore {
    /// Create a store rooted at `root`. The directory is created lazily on
    /// the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create a store under the platform audio directory, falling back to
    /// the data directory.
    pub fn in_default_location(app_name: &str) -> Self {
        let root = dirs::audio_dir()
            .or_else(dirs::data_dir)
            .unwrap_or_else(std::env::temp_dir)
            .join(app_name);
        Self::new(root)
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    fn path_for(&self, handle: &str) -> PathBuf {
        self.root.join(handle)
    }

    fn map_io_error(handle: &str, e: std::io::Error) -> BridgeError {
        match e.kind() {
            ErrorKind::NotFound => BridgeError::NotFound(format!("no media file {handle}")),
            ErrorKind::PermissionDenied => {
                BridgeError::PermissionDenied(format!("media file {handle}: {e}"))
            }
            _ => BridgeError::Io(e),
        }
    }
}

#[async_trait]
impl MediaFileStore for FsMediaStore {
    async fn store(&self, name: &str, data: Bytes) -> Result<StoredFile> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| Self::map_io_error("<root>", e))?;

        let handle = Uuid::new_v4().to_string();
        let path = self.path_for(&handle);
        let size_bytes = data.len() as u64;

        fs::write(&path, data.as_ref())
            .await
            .map_err(|e| Self::map_io_error(&handle, e))?;

        debug!(name = name, handle = %handle, size = size_bytes, "Stored media file");
        Ok(StoredFile {
            handle,
            path,
            size_bytes,
        })
    }

    async fn read_info(&self, handle: &str) -> Result<StoredFile> {
        let path = self.path_for(handle);
        let metadata = fs::metadata(&path)
            .await
            .map_err(|e| Self::map_io_error(handle, e))?;

        Ok(StoredFile {
            handle: handle.to_string(),
            path,
            size_bytes: metadata.len(),
        })
    }

    async fn delete(&self, handle: &str) -> Result<()> {
        fs::remove_file(self.path_for(handle))
            .await
            .map_err(|e| Self::map_io_error(handle, e))?;

        debug!(handle = handle, "Deleted media file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_read_delete_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsMediaStore::new(dir.path());

        let stored = store
            .store("My Track", Bytes::from_static(b"audio-bytes"))
            .await
            .unwrap();
        assert_eq!(stored.size_bytes, 11);
        assert!(stored.path.exists());

        let info = store.read_info(&stored.handle).await.unwrap();
        assert_eq!(info.size_bytes, 11);
        assert_eq!(info.path, stored.path);
        assert!(store.exists(&stored.handle).await.unwrap());

        store.delete(&stored.handle).await.unwrap();
        assert!(!store.exists(&stored.handle).await.unwrap());
    }

    #[tokio::test]
    async fn missing_handles_report_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsMediaStore::new(dir.path());

        let err = store.read_info("ghost").await.unwrap_err();
        assert!(err.is_not_found());

        let err = store.delete("ghost").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn titles_do_not_influence_on_disk_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsMediaStore::new(dir.path());

        let stored = store
            .store("../../escape attempt", Bytes::from_static(b"x"))
            .await
            .unwrap();
        assert!(stored.path.starts_with(dir.path()));
    }
}

//! Media File Storage Abstraction
//!
//! Downloaded audio bytes live outside the document store, in whatever the
//! host considers its media library. The core only ever sees opaque handles
//! plus the metadata needed for display and playback resolution.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;

use crate::error::Result;

/// Metadata for a file held by a [`MediaFileStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Opaque handle identifying the file within the store.
    pub handle: String,
    /// Resolved local path, suitable for handing to a playback engine.
    pub path: PathBuf,
    /// File size in bytes.
    pub size_bytes: u64,
}

/// File storage for downloaded audio.
///
/// The lifecycle manager writes a file exactly once per download and deletes
/// it at most once per teardown; `delete` must report
/// [`BridgeError::NotFound`](crate::error::BridgeError::NotFound) for an
/// unknown handle so that callers can treat "already gone" as success.
///
/// `store` may fail with `PermissionDenied` when the host refuses media
/// library access; that error is surfaced to the user verbatim.
#[async_trait]
pub trait MediaFileStore: Send + Sync {
    /// Persist `data` and return the handle plus resolved metadata.
    ///
    /// `name` is a display hint (typically the track title); stores are free
    /// to ignore it when generating the backing file name.
    async fn store(&self, name: &str, data: Bytes) -> Result<StoredFile>;

    /// Look up metadata for a previously stored file.
    ///
    /// Fails with `NotFound` when the backing file no longer exists.
    async fn read_info(&self, handle: &str) -> Result<StoredFile>;

    /// Delete a stored file. Fails with `NotFound` when the handle is
    /// unknown or the file is already gone.
    async fn delete(&self, handle: &str) -> Result<()>;

    /// Check whether the backing file for `handle` still exists.
    async fn exists(&self, handle: &str) -> Result<bool> {
        match self.read_info(handle).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

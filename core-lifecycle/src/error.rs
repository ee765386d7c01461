use bridge_traits::BridgeError;
use core_catalog::CatalogError;
use core_docstore::DocStoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Download already in progress for track {0}")]
    AlreadyDownloading(String),

    #[error("Removal already in progress for song {0}")]
    RemovalInProgress(String),

    #[error("Track {0} is already downloaded")]
    AlreadyDownloaded(String),

    #[error("Download cancelled for track {0}")]
    Cancelled(String),

    #[error("Invalid track descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("No playable resource for song {0}")]
    MissingResource(String),

    #[error("Song {0} has no stored file reference; re-download required")]
    InsufficientData(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Storage I/O error: {0}")]
    StorageIo(BridgeError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

impl From<DocStoreError> for LifecycleError {
    fn from(e: DocStoreError) -> Self {
        LifecycleError::Catalog(CatalogError::Store(e))
    }
}

impl LifecycleError {
    /// Map a bridge failure, keeping permission denials distinct.
    pub(crate) fn from_bridge(e: BridgeError) -> Self {
        match e {
            BridgeError::PermissionDenied(message) => LifecycleError::PermissionDenied(message),
            other => LifecycleError::StorageIo(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, LifecycleError>;

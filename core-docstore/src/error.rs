use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocStoreError {
    #[error("Collection '{0}' used before its load step completed")]
    NotInitialized(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Document with key '{key}' already exists in collection '{collection}'")]
    DuplicateKey { collection: String, key: String },

    #[error("Storage error: {0}")]
    Storage(#[from] BridgeError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Migration of document '{key}' to version {version} failed: {message}")]
    Migration {
        key: String,
        version: u32,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, DocStoreError>;

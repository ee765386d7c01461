use core_docstore::DocStoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Store error: {0}")]
    Store(#[from] DocStoreError),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },

    #[error("Song {song_id} is already a member of playlist {playlist_id}")]
    AlreadyMember {
        song_id: String,
        playlist_id: String,
    },

    #[error("Reorder of playlist {playlist_id} is not a permutation of its current members")]
    OrderMismatch { playlist_id: String },
}

pub type Result<T> = std::result::Result<T, CatalogError>;

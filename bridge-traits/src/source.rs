//! Remote Track Source Abstraction
//!
//! The remote catalog/search collaborator is out of scope for this library;
//! it hands over [`RemoteTrack`] descriptors and a way to fetch the audio
//! bytes for one of them. Nothing here validates descriptor contents beyond
//! required-field presence - the provider is trusted to be internally
//! consistent.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Thumbnail variant offered by the remote catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// Track descriptor as supplied by the remote catalog collaborator.
///
/// Display labels (`duration_label`, `view_count_label`, `published_label`)
/// are pre-rendered by the provider and stored as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTrack {
    /// Stable external identifier; dedup key for the song catalog.
    pub id: String,
    pub title: String,
    pub channel: String,
    pub description: String,
    pub duration_seconds: u32,
    pub duration_label: String,
    pub view_count_label: String,
    pub published_label: String,
    pub thumbnails: Vec<Thumbnail>,
}

impl RemoteTrack {
    /// Check required-field presence.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("Remote track id cannot be empty".to_string());
        }

        if self.title.trim().is_empty() {
            return Err("Remote track title cannot be empty".to_string());
        }

        Ok(())
    }

    /// Best thumbnail to use as a cover, if the provider supplied any.
    pub fn cover_url(&self) -> Option<&str> {
        self.thumbnails.first().map(|t| t.url.as_str())
    }
}

/// Opaque provider of track audio.
#[async_trait]
pub trait TrackSource: Send + Sync {
    /// Fetch the complete audio payload for the track with the given
    /// external id.
    ///
    /// There is no streaming variant: downloads are buffered whole before
    /// being handed to the media store, which keeps the
    /// write-file-then-write-document ordering trivial.
    async fn fetch_audio(&self, external_id: &str) -> Result<Bytes>;
}

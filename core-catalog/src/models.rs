//! Stored document types for the song and playlist collections.
//!
//! Every document carries a `schema_version` driving the startup migration
//! pass; see [`crate::migrations`] for the upgrade steps.

use bridge_traits::{RemoteTrack, StoredFile};
use chrono::Utc;
use core_docstore::Document;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current schema version of [`Song`] documents.
pub const SONG_SCHEMA_VERSION: u32 = 3;
/// Current schema version of [`Playlist`] documents.
pub const PLAYLIST_SCHEMA_VERSION: u32 = 2;
/// Current schema version of [`Membership`] documents.
pub const MEMBERSHIP_SCHEMA_VERSION: u32 = 1;

/// Fallback colours used for covers without artwork.
const COVER_PALETTE: &[&str] = &[
    "#e57373", "#64b5f6", "#81c784", "#ffb74d", "#ba68c8", "#4db6ac", "#f06292", "#a1887f",
];

/// Deterministic fallback colour for a seed string.
pub fn cover_colour(seed: &str) -> String {
    let sum: usize = seed.bytes().map(usize::from).sum();
    COVER_PALETTE[sum % COVER_PALETTE.len()].to_string()
}

// =============================================================================
// Song
// =============================================================================

/// Backing-file metadata of a downloaded song.
///
/// `local_id` and `path` absent means the file has been deleted while the
/// document survived (a tombstoned resource).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongFile {
    /// Unix timestamp of the download.
    pub download_date: i64,
    /// Handle in the media file store.
    #[serde(default)]
    pub local_id: Option<String>,
    /// Resolved path, kept for display; playback resolution re-reads it.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub size_bytes: Option<u64>,
}

/// Cover art metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cover {
    /// Colour shown when no artwork is available.
    pub color_fallback: String,
    /// Display name rendered on the fallback cover.
    pub name: String,
    #[serde(default)]
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongFlags {
    pub has_cover: bool,
    pub is_downloaded: bool,
    pub is_favourite: bool,
}

/// Denormalized mirror of one join row, cached on the song document.
///
/// A read cache only - the membership collection is the source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipRef {
    pub playlist_id: String,
    pub order: u32,
    pub is_favourite: bool,
}

/// A downloaded song and its display metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    /// External identifier from the remote catalog; dedup key.
    pub id: String,
    pub title: String,
    pub channel_name: String,
    pub description: String,
    pub duration_label: String,
    pub view_count_label: String,
    pub published_label: String,
    pub file: SongFile,
    pub cover: Cover,
    pub flags: SongFlags,
    #[serde(default)]
    pub playlist_memberships: Vec<MembershipRef>,
    #[serde(default)]
    pub play_count: u64,
    pub schema_version: u32,
}

impl Document for Song {
    const KEY_FIELD: &'static str = "id";
    const SCHEMA_VERSION: u32 = SONG_SCHEMA_VERSION;
}

impl Song {
    /// Build a song document from a remote descriptor and its stored file.
    pub fn from_remote(track: &RemoteTrack, stored: &StoredFile) -> Self {
        let uri = track.cover_url().map(str::to_string);

        Self {
            id: track.id.clone(),
            title: track.title.clone(),
            channel_name: track.channel.clone(),
            description: track.description.clone(),
            duration_label: track.duration_label.clone(),
            view_count_label: track.view_count_label.clone(),
            published_label: track.published_label.clone(),
            file: SongFile {
                download_date: Utc::now().timestamp(),
                local_id: Some(stored.handle.clone()),
                path: Some(stored.path.to_string_lossy().into_owned()),
                size_bytes: Some(stored.size_bytes),
            },
            cover: Cover {
                color_fallback: cover_colour(&track.id),
                name: track.title.clone(),
                uri: uri.clone(),
            },
            flags: SongFlags {
                has_cover: uri.is_some(),
                is_downloaded: true,
                is_favourite: false,
            },
            playlist_memberships: Vec::new(),
            play_count: 0,
            schema_version: SONG_SCHEMA_VERSION,
        }
    }

    /// Validate song data.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("Song id cannot be empty".to_string());
        }

        if self.title.trim().is_empty() {
            return Err("Song title cannot be empty".to_string());
        }

        if self.flags.is_downloaded && self.file.local_id.is_none() {
            return Err("Downloaded song must reference a local file".to_string());
        }

        Ok(())
    }

    /// Whether the backing file is gone while the document survived.
    pub fn is_tombstoned(&self) -> bool {
        self.file.local_id.is_none()
    }
}

// =============================================================================
// Playlist
// =============================================================================

/// A user-defined playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub cover: Cover,
    /// Cached number of join rows; derived state. Trust it only right after
    /// a playlist catalog mutation.
    #[serde(default)]
    pub songs_count: u64,
    pub schema_version: u32,
}

impl Document for Playlist {
    const KEY_FIELD: &'static str = "id";
    const SCHEMA_VERSION: u32 = PLAYLIST_SCHEMA_VERSION;
}

impl Playlist {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: Uuid::new_v4().to_string(),
            cover: Cover {
                color_fallback: cover_colour(&name),
                name: name.clone(),
                uri: None,
            },
            name,
            songs_count: 0,
            schema_version: PLAYLIST_SCHEMA_VERSION,
        }
    }

    /// Validate playlist data.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Playlist name cannot be empty".to_string());
        }

        Ok(())
    }
}

// =============================================================================
// Membership join row
// =============================================================================

/// One song↔playlist link with its display order.
///
/// Unique on `(song_id, playlist_id)`; within one playlist the `order`
/// values form the dense sequence `0..n-1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub id: String,
    pub song_id: String,
    pub playlist_id: String,
    pub order: u32,
    #[serde(default)]
    pub is_favourite: bool,
    pub schema_version: u32,
}

impl Document for Membership {
    const KEY_FIELD: &'static str = "id";
    const SCHEMA_VERSION: u32 = MEMBERSHIP_SCHEMA_VERSION;
}

impl Membership {
    pub fn new(song_id: impl Into<String>, playlist_id: impl Into<String>, order: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            song_id: song_id.into(),
            playlist_id: playlist_id.into(),
            order,
            is_favourite: false,
            schema_version: MEMBERSHIP_SCHEMA_VERSION,
        }
    }

    /// The cached mirror of this row, as stored on the song document.
    pub fn as_ref_entry(&self) -> MembershipRef {
        MembershipRef {
            playlist_id: self.playlist_id.clone(),
            order: self.order,
            is_favourite: self.is_favourite,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn descriptor() -> RemoteTrack {
        RemoteTrack {
            id: "x1".to_string(),
            title: "Test Track".to_string(),
            channel: "Test Channel".to_string(),
            description: String::new(),
            duration_seconds: 240,
            duration_label: "4:00".to_string(),
            view_count_label: "1M views".to_string(),
            published_label: "1 year ago".to_string(),
            thumbnails: vec![],
        }
    }

    fn stored_file() -> StoredFile {
        StoredFile {
            handle: "h1".to_string(),
            path: PathBuf::from("/media/h1"),
            size_bytes: 1024,
        }
    }

    #[test]
    fn song_from_remote_is_downloaded() {
        let song = Song::from_remote(&descriptor(), &stored_file());

        assert!(song.flags.is_downloaded);
        assert!(!song.flags.has_cover);
        assert_eq!(song.file.local_id.as_deref(), Some("h1"));
        assert_eq!(song.file.size_bytes, Some(1024));
        assert_eq!(song.schema_version, SONG_SCHEMA_VERSION);
        assert!(song.validate().is_ok());
        assert!(!song.is_tombstoned());
    }

    #[test]
    fn downloaded_song_without_file_fails_validation() {
        let mut song = Song::from_remote(&descriptor(), &stored_file());
        song.file.local_id = None;

        assert!(song.validate().is_err());
        assert!(song.is_tombstoned());
    }

    #[test]
    fn playlist_new_derives_cover() {
        let playlist = Playlist::new("Workout");

        assert_eq!(playlist.cover.name, "Workout");
        assert_eq!(playlist.cover.color_fallback, cover_colour("Workout"));
        assert_eq!(playlist.songs_count, 0);
        assert!(playlist.validate().is_ok());
    }

    #[test]
    fn empty_playlist_name_fails_validation() {
        let mut playlist = Playlist::new("x");
        playlist.name = "  ".to_string();

        assert!(playlist.validate().is_err());
    }

    #[test]
    fn cover_colour_is_deterministic() {
        assert_eq!(cover_colour("abc"), cover_colour("abc"));
    }
}

//! Song catalog: the collection of downloaded-song documents.

use bridge_traits::{RemoteTrack, StoredFile};
use core_docstore::{Collection, DocStoreError, Patch, Query, RemoveOptions, UpdateOptions};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::error::{CatalogError, Result};
use crate::models::{MembershipRef, Song, SongFlags};

/// Filter and ordering for song listings.
///
/// The sort options mirror the song-list sort menu of the host UI.
#[derive(Debug, Clone, Default)]
pub struct SongFilter {
    pub favourites_only: bool,
    pub downloaded_only: bool,
    /// Case-insensitive substring match on the title.
    pub title_contains: Option<String>,
    pub sort: SongSort,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SongSort {
    #[default]
    TitleAscending,
    TitleDescending,
    DownloadDateAscending,
    DownloadDateDescending,
}

/// Catalog of downloaded songs.
///
/// The catalog does not serialize concurrent creates for the same external
/// id; the lifecycle manager owns the at-most-one-concurrent-download
/// guarantee and is the only caller of [`create`](Self::create) and
/// [`remove`](Self::remove).
pub struct SongCatalog {
    songs: Arc<Collection<Song>>,
}

impl SongCatalog {
    pub fn new(songs: Arc<Collection<Song>>) -> Self {
        Self { songs }
    }

    /// Build and insert a song document from a remote descriptor and its
    /// freshly stored file.
    #[instrument(skip(self, descriptor, stored), fields(external_id = %descriptor.id))]
    pub async fn create(&self, descriptor: &RemoteTrack, stored: &StoredFile) -> Result<Song> {
        descriptor
            .validate()
            .map_err(|message| CatalogError::InvalidInput {
                field: "RemoteTrack".to_string(),
                message,
            })?;

        let song = Song::from_remote(descriptor, stored);
        let stored_song = self.songs.insert(&song).await?;

        debug!(song_id = %stored_song.id, "Created song document");
        Ok(stored_song)
    }

    /// Number of catalog entries with this external id; dedup check used
    /// before a download starts.
    pub async fn count_by_external_id(&self, external_id: &str) -> Result<usize> {
        Ok(self
            .songs
            .count(&Query::new().eq("id", external_id))
            .await?)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Song>> {
        Ok(self.songs.find_one(&Query::new().eq("id", id)).await?)
    }

    /// Like [`find_by_id`](Self::find_by_id) but failing when absent.
    pub async fn get(&self, id: &str) -> Result<Song> {
        self.find_by_id(id).await?.ok_or_else(|| CatalogError::NotFound {
            entity_type: "Song".to_string(),
            id: id.to_string(),
        })
    }

    /// Songs for the given ids, in the order of `ids`. Unknown ids are
    /// skipped, not an error - playlists may reference songs mid-teardown.
    pub async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Song>> {
        let mut songs = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(song) = self.find_by_id(id).await? {
                songs.push(song);
            }
        }
        Ok(songs)
    }

    /// All songs matching `filter`, sorted per its sort option.
    pub async fn list(&self, filter: &SongFilter) -> Result<Vec<Song>> {
        let mut query = Query::new();
        if filter.favourites_only {
            query = query.eq("flags.is_favourite", true);
        }
        if filter.downloaded_only {
            query = query.eq("flags.is_downloaded", true);
        }

        let mut songs = self.songs.find(&query).await?;

        if let Some(fragment) = &filter.title_contains {
            let needle = fragment.to_lowercase();
            songs.retain(|song| song.title.to_lowercase().contains(&needle));
        }

        match filter.sort {
            SongSort::TitleAscending => songs.sort_by(|a, b| a.title.cmp(&b.title)),
            SongSort::TitleDescending => songs.sort_by(|a, b| b.title.cmp(&a.title)),
            SongSort::DownloadDateAscending => {
                songs.sort_by_key(|song| song.file.download_date)
            }
            SongSort::DownloadDateDescending => {
                songs.sort_by_key(|song| std::cmp::Reverse(song.file.download_date))
            }
        }

        Ok(songs)
    }

    /// Replace the whole flag set of a song.
    pub async fn update_flags(&self, id: &str, flags: SongFlags) -> Result<Song> {
        let value = serde_json::to_value(flags).map_err(DocStoreError::Serialization)?;
        self.update_one(id, Patch::new().set("flags", value)).await
    }

    pub async fn set_favourite(&self, id: &str, favourite: bool) -> Result<Song> {
        self.update_one(id, Patch::new().set("flags.is_favourite", favourite))
            .await
    }

    /// Report-back call from the playback collaborator.
    pub async fn increment_play_count(&self, id: &str) -> Result<u64> {
        let song = self.update_one(id, Patch::new().inc("play_count", 1)).await?;
        Ok(song.play_count)
    }

    /// Refresh the denormalized membership cache on a song document.
    ///
    /// Called by the playlist catalog after join-row mutations; a missing
    /// song (already torn down) is not an error.
    pub async fn set_playlist_memberships(
        &self,
        id: &str,
        memberships: Vec<MembershipRef>,
    ) -> Result<()> {
        let value = serde_json::to_value(&memberships).map_err(DocStoreError::Serialization)?;
        self.songs
            .update(
                &Query::new().eq("id", id),
                &Patch::new().set("playlist_memberships", value),
                UpdateOptions::default(),
            )
            .await?;
        Ok(())
    }

    /// Remove the song document. Returns whether it existed.
    pub async fn remove(&self, id: &str) -> Result<bool> {
        let removed = self
            .songs
            .remove(&Query::new().eq("id", id), RemoveOptions::default())
            .await?;
        Ok(removed > 0)
    }

    async fn update_one(&self, id: &str, patch: Patch) -> Result<Song> {
        let outcome = self
            .songs
            .update(&Query::new().eq("id", id), &patch, UpdateOptions::default())
            .await?;

        outcome
            .updated_documents
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::NotFound {
                entity_type: "Song".to_string(),
                id: id.to_string(),
            })
    }
}

//! Playlist catalog: playlist documents plus the song↔playlist join
//! collection.
//!
//! The join rows are the source of truth for playlist content. Two pieces
//! of derived state hang off them and are maintained here: the
//! `songs_count` cache on each playlist (recomputed from the live rows by
//! every membership mutation) and the `playlist_memberships` cache on each
//! song document.
//!
//! Membership mutations for one playlist are serialized through a
//! per-playlist async lock so that order compaction never interleaves;
//! unrelated playlists proceed concurrently.

use core_docstore::{Collection, Patch, Query, RemoveOptions, UpdateOptions};
use core_runtime::events::{EventBus, LibraryEvent, PlaylistEvent};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::error::{CatalogError, Result};
use crate::models::{Membership, Playlist};
use crate::songs::SongCatalog;

/// A song as it appears inside one playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistSong {
    pub song: crate::models::Song,
    pub order: u32,
    pub is_favourite: bool,
}

/// Discrepancy between a cached `songs_count` and the live join rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountMismatch {
    pub playlist_id: String,
    pub cached: u64,
    pub actual: u64,
}

/// Catalog of playlists and their membership join rows.
pub struct PlaylistCatalog {
    playlists: Arc<Collection<Playlist>>,
    memberships: Arc<Collection<Membership>>,
    songs: Arc<SongCatalog>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    event_bus: Option<EventBus>,
}

impl PlaylistCatalog {
    pub fn new(
        playlists: Arc<Collection<Playlist>>,
        memberships: Arc<Collection<Membership>>,
        songs: Arc<SongCatalog>,
    ) -> Self {
        Self {
            playlists,
            memberships,
            songs,
            locks: Mutex::new(HashMap::new()),
            event_bus: None,
        }
    }

    /// Set event bus for playlist change events.
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    // =========================================================================
    // Playlist documents
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn create_playlist(&self, name: &str) -> Result<Playlist> {
        let playlist = Playlist::new(name);
        playlist
            .validate()
            .map_err(|message| CatalogError::InvalidInput {
                field: "Playlist".to_string(),
                message,
            })?;

        let stored = self.playlists.insert(&playlist).await?;
        self.emit(PlaylistEvent::Created {
            playlist_id: stored.id.clone(),
        });

        Ok(stored)
    }

    #[instrument(skip(self))]
    pub async fn rename_playlist(&self, id: &str, name: &str) -> Result<Playlist> {
        if name.trim().is_empty() {
            return Err(CatalogError::InvalidInput {
                field: "Playlist".to_string(),
                message: "Playlist name cannot be empty".to_string(),
            });
        }

        let outcome = self
            .playlists
            .update(
                &Query::new().eq("id", id),
                &Patch::new().set("name", name).set("cover.name", name),
                UpdateOptions::default(),
            )
            .await?;

        outcome
            .updated_documents
            .into_iter()
            .next()
            .ok_or_else(|| playlist_not_found(id))
    }

    pub async fn get_playlist(&self, id: &str) -> Result<Playlist> {
        self.playlists
            .find_one(&Query::new().eq("id", id))
            .await?
            .ok_or_else(|| playlist_not_found(id))
    }

    /// All playlists, sorted by name.
    pub async fn list_playlists(&self) -> Result<Vec<Playlist>> {
        let mut playlists = self.playlists.find(&Query::all()).await?;
        playlists.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(playlists)
    }

    /// Delete a playlist and all of its join rows.
    ///
    /// Song documents are not touched; their membership caches may keep a
    /// stale reference to the deleted playlist, which downstream consumers
    /// treat as the eventually-consistent cache it is.
    #[instrument(skip(self))]
    pub async fn delete_playlist(&self, id: &str) -> Result<()> {
        let _guard = self.playlist_lock(id).await;

        self.memberships
            .remove(
                &Query::new().eq("playlist_id", id),
                RemoveOptions { multi: true },
            )
            .await?;

        let removed = self
            .playlists
            .remove(&Query::new().eq("id", id), RemoveOptions::default())
            .await?;
        if removed == 0 {
            return Err(playlist_not_found(id));
        }

        self.emit(PlaylistEvent::Deleted {
            playlist_id: id.to_string(),
        });
        Ok(())
    }

    // =========================================================================
    // Membership join rows
    // =========================================================================

    /// Append a song to the end of a playlist, returning its order.
    #[instrument(skip(self))]
    pub async fn add_membership(&self, song_id: &str, playlist_id: &str) -> Result<u32> {
        let _guard = self.playlist_lock(playlist_id).await;

        // Both endpoints must exist before a row may reference them.
        self.get_playlist(playlist_id).await?;
        self.songs.get(song_id).await?;

        let existing = self
            .memberships
            .find_one(&pair_query(song_id, playlist_id))
            .await?;
        if existing.is_some() {
            return Err(CatalogError::AlreadyMember {
                song_id: song_id.to_string(),
                playlist_id: playlist_id.to_string(),
            });
        }

        let rows = self.playlist_rows(playlist_id).await?;
        let order = rows.iter().map(|r| r.order + 1).max().unwrap_or(0);

        self.memberships
            .insert(&Membership::new(song_id, playlist_id, order))
            .await?;

        self.refresh_songs_count(playlist_id).await?;
        self.refresh_song_cache(song_id).await?;
        self.emit(PlaylistEvent::MembershipsChanged {
            playlist_id: playlist_id.to_string(),
        });

        debug!(song_id, playlist_id, order, "Added membership");
        Ok(order)
    }

    /// Remove a song from a playlist and compact the remaining orders.
    #[instrument(skip(self))]
    pub async fn remove_membership(&self, song_id: &str, playlist_id: &str) -> Result<()> {
        let _guard = self.playlist_lock(playlist_id).await;

        let removed = self
            .memberships
            .remove(&pair_query(song_id, playlist_id), RemoveOptions::default())
            .await?;
        if removed == 0 {
            return Err(CatalogError::NotFound {
                entity_type: "Membership".to_string(),
                id: format!("{song_id}/{playlist_id}"),
            });
        }

        self.compact_orders(playlist_id).await?;
        self.refresh_songs_count(playlist_id).await?;
        self.refresh_song_cache(song_id).await?;
        self.emit(PlaylistEvent::MembershipsChanged {
            playlist_id: playlist_id.to_string(),
        });

        Ok(())
    }

    /// Rewrite the display order of a playlist.
    ///
    /// `new_order` must be an exact permutation of the current member song
    /// ids, otherwise the call fails with
    /// [`CatalogError::OrderMismatch`] and changes nothing.
    #[instrument(skip(self, new_order))]
    pub async fn reorder(&self, playlist_id: &str, new_order: &[String]) -> Result<()> {
        let _guard = self.playlist_lock(playlist_id).await;

        let rows = self.playlist_rows(playlist_id).await?;

        let mut current: Vec<&str> = rows.iter().map(|r| r.song_id.as_str()).collect();
        let mut requested: Vec<&str> = new_order.iter().map(String::as_str).collect();
        current.sort_unstable();
        requested.sort_unstable();
        if current != requested {
            return Err(CatalogError::OrderMismatch {
                playlist_id: playlist_id.to_string(),
            });
        }

        for (index, song_id) in new_order.iter().enumerate() {
            self.memberships
                .update(
                    &pair_query(song_id, playlist_id),
                    &Patch::new().set("order", index as u32),
                    UpdateOptions::default(),
                )
                .await?;
        }

        for song_id in new_order {
            self.refresh_song_cache(song_id).await?;
        }
        self.emit(PlaylistEvent::MembershipsChanged {
            playlist_id: playlist_id.to_string(),
        });

        Ok(())
    }

    /// Set the per-membership favourite flag.
    pub async fn set_membership_favourite(
        &self,
        song_id: &str,
        playlist_id: &str,
        favourite: bool,
    ) -> Result<()> {
        let outcome = self
            .memberships
            .update(
                &pair_query(song_id, playlist_id),
                &Patch::new().set("is_favourite", favourite),
                UpdateOptions::default(),
            )
            .await?;
        if outcome.matched == 0 {
            return Err(CatalogError::NotFound {
                entity_type: "Membership".to_string(),
                id: format!("{song_id}/{playlist_id}"),
            });
        }

        self.refresh_song_cache(song_id).await?;
        Ok(())
    }

    /// Remove every join row referencing a song, compacting each affected
    /// playlist. Returns the affected playlist ids.
    ///
    /// Used during song teardown; counts are adjusted separately through
    /// [`decrease_songs_count`](Self::decrease_songs_count) so that a crash
    /// between the two steps leaves only a clamped count behind.
    #[instrument(skip(self))]
    pub async fn remove_song_memberships(&self, song_id: &str) -> Result<Vec<String>> {
        let rows = self
            .memberships
            .find(&Query::new().eq("song_id", song_id))
            .await?;

        let mut affected = Vec::with_capacity(rows.len());
        for row in rows {
            let _guard = self.playlist_lock(&row.playlist_id).await;
            self.memberships
                .remove(
                    &pair_query(song_id, &row.playlist_id),
                    RemoveOptions::default(),
                )
                .await?;
            self.compact_orders(&row.playlist_id).await?;
            affected.push(row.playlist_id);
        }

        Ok(affected)
    }

    /// Clamped bulk decrement of the cached counts, one per playlist id.
    ///
    /// Never drives a count below zero: the clamp is logged as an
    /// inconsistency instead. Unknown playlist ids (stale cache references)
    /// are logged and skipped.
    #[instrument(skip(self, playlist_ids))]
    pub async fn decrease_songs_count(&self, playlist_ids: &[String]) -> Result<()> {
        for playlist_id in playlist_ids {
            let _guard = self.playlist_lock(playlist_id).await;

            let playlist = match self
                .playlists
                .find_one(&Query::new().eq("id", playlist_id.as_str()))
                .await?
            {
                Some(playlist) => playlist,
                None => {
                    warn!(
                        playlist_id = %playlist_id,
                        "Count decrement for unknown playlist; skipping"
                    );
                    continue;
                }
            };

            if playlist.songs_count == 0 {
                warn!(
                    playlist_id = %playlist_id,
                    "Count decrement would underflow; clamping to 0"
                );
                continue;
            }

            self.playlists
                .update(
                    &Query::new().eq("id", playlist_id.as_str()),
                    &Patch::new().set("songs_count", playlist.songs_count - 1),
                    UpdateOptions::default(),
                )
                .await?;
        }

        Ok(())
    }

    // =========================================================================
    // Queries & derived-state maintenance
    // =========================================================================

    /// Songs of a playlist in display order.
    pub async fn list_playlist_songs(&self, playlist_id: &str) -> Result<Vec<PlaylistSong>> {
        self.get_playlist(playlist_id).await?;
        let rows = self.playlist_rows(playlist_id).await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            // A song missing mid-teardown simply drops out of the listing.
            if let Some(song) = self.songs.find_by_id(&row.song_id).await? {
                entries.push(PlaylistSong {
                    song,
                    order: row.order,
                    is_favourite: row.is_favourite,
                });
            }
        }

        Ok(entries)
    }

    /// Recompute `songs_count` from the live join rows.
    ///
    /// This is the single authoritative path for the cached count; every
    /// membership mutation funnels through it.
    pub async fn refresh_songs_count(&self, playlist_id: &str) -> Result<u64> {
        let actual = self
            .memberships
            .count(&Query::new().eq("playlist_id", playlist_id))
            .await? as u64;

        self.playlists
            .update(
                &Query::new().eq("id", playlist_id),
                &Patch::new().set("songs_count", actual),
                UpdateOptions::default(),
            )
            .await?;

        Ok(actual)
    }

    /// Compare every cached `songs_count` against the live join rows.
    pub async fn verify_counts(&self) -> Result<Vec<CountMismatch>> {
        let playlists = self.playlists.find(&Query::all()).await?;

        let mut mismatches = Vec::new();
        for playlist in playlists {
            let actual = self
                .memberships
                .count(&Query::new().eq("playlist_id", playlist.id.as_str()))
                .await? as u64;
            if actual != playlist.songs_count {
                mismatches.push(CountMismatch {
                    playlist_id: playlist.id,
                    cached: playlist.songs_count,
                    actual,
                });
            }
        }

        Ok(mismatches)
    }

    /// Join rows of one playlist, sorted by order.
    async fn playlist_rows(&self, playlist_id: &str) -> Result<Vec<Membership>> {
        let mut rows = self
            .memberships
            .find(&Query::new().eq("playlist_id", playlist_id))
            .await?;
        rows.sort_by_key(|row| row.order);
        Ok(rows)
    }

    /// Rewrite orders to the dense sequence `0..n-1`, preserving relative
    /// order.
    async fn compact_orders(&self, playlist_id: &str) -> Result<()> {
        let rows = self.playlist_rows(playlist_id).await?;

        for (index, row) in rows.iter().enumerate() {
            let index = index as u32;
            if row.order != index {
                self.memberships
                    .update(
                        &Query::new().eq("id", row.id.as_str()),
                        &Patch::new().set("order", index),
                        UpdateOptions::default(),
                    )
                    .await?;
            }
        }

        Ok(())
    }

    /// Rebuild the membership cache on a song document from the live rows.
    async fn refresh_song_cache(&self, song_id: &str) -> Result<()> {
        let mut rows = self
            .memberships
            .find(&Query::new().eq("song_id", song_id))
            .await?;
        rows.sort_by(|a, b| a.playlist_id.cmp(&b.playlist_id));

        let refs = rows.iter().map(Membership::as_ref_entry).collect();
        self.songs.set_playlist_memberships(song_id, refs).await
    }

    /// Per-playlist mutation guard.
    async fn playlist_lock(&self, playlist_id: &str) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(playlist_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    fn emit(&self, event: PlaylistEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit(LibraryEvent::Playlist(event));
        }
    }
}

fn pair_query(song_id: &str, playlist_id: &str) -> Query {
    Query::new()
        .eq("song_id", song_id)
        .eq("playlist_id", playlist_id)
}

fn playlist_not_found(id: &str) -> CatalogError {
    CatalogError::NotFound {
        entity_type: "Playlist".to_string(),
        id: id.to_string(),
    }
}

//! # Lifecycle Manager
//!
//! Orchestrates "create song resource from remote descriptor" and its
//! inverse teardown, guaranteeing that the multi-step sequences look atomic
//! from the caller's point of view: they either complete or roll back every
//! locally observable effect.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────┐
//! │     LifecycleManager                   │
//! │  - download()                          │
//! │  - remove()                            │
//! │  - resolve_for_playback()              │
//! └────────┬───────────────────────────────┘
//!          │
//!          ├──> SongCatalog      (documents)
//!          ├──> PlaylistCatalog  (join rows, counts)
//!          ├──> MediaFileStore   (audio bytes)
//!          └──> TrackSource      (remote audio)
//! ```
//!
//! Per song id, at most one of `download`/`remove` runs at a time: the
//! in-flight entry in the state arena acts as the mutex, and a second
//! caller fails fast with a state-conflict error instead of queueing.

use bridge_traits::{MediaFileStore, RemoteTrack, TrackSource};
use core_catalog::{PlaylistCatalog, Song, SongCatalog};
use core_runtime::events::{DownloadEvent, EventBus, LibraryEvent, SongEvent};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::{LifecycleError, Result};
use crate::state::ResourceState;

/// Orchestrator for download and teardown of song resources.
pub struct LifecycleManager {
    songs: Arc<SongCatalog>,
    playlists: Arc<PlaylistCatalog>,
    media: Arc<dyn MediaFileStore>,
    source: Arc<dyn TrackSource>,
    /// In-flight operations per external id. `Present`/`NotPresent` are
    /// derived from the catalog and never stored here.
    states: Mutex<HashMap<String, ResourceState>>,
    event_bus: Option<EventBus>,
}

impl LifecycleManager {
    pub fn new(
        songs: Arc<SongCatalog>,
        playlists: Arc<PlaylistCatalog>,
        media: Arc<dyn MediaFileStore>,
        source: Arc<dyn TrackSource>,
    ) -> Self {
        Self {
            songs,
            playlists,
            media,
            source,
            states: Mutex::new(HashMap::new()),
            event_bus: None,
        }
    }

    /// Set event bus for download and removal events.
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Current lifecycle state of a song resource.
    pub async fn state(&self, external_id: &str) -> Result<ResourceState> {
        if let Some(state) = self.states.lock().await.get(external_id) {
            return Ok(*state);
        }

        if self.songs.count_by_external_id(external_id).await? > 0 {
            Ok(ResourceState::Present)
        } else {
            Ok(ResourceState::NotPresent)
        }
    }

    /// Download a track and create its catalog entry.
    ///
    /// Fails fast with [`LifecycleError::AlreadyDownloading`] while a
    /// download for the same external id is in flight, and with
    /// [`LifecycleError::AlreadyDownloaded`] when a catalog entry already
    /// exists. On any failure no song document is created, partially
    /// written bytes are discarded and the resource returns to
    /// `NotPresent`; retrying is a caller decision.
    #[instrument(skip(self, descriptor, cancel), fields(external_id = %descriptor.id))]
    pub async fn download(
        &self,
        descriptor: &RemoteTrack,
        cancel: CancellationToken,
    ) -> Result<Song> {
        descriptor
            .validate()
            .map_err(LifecycleError::InvalidDescriptor)?;
        let external_id = descriptor.id.clone();

        {
            let mut states = self.states.lock().await;
            match states.get(&external_id) {
                Some(ResourceState::Downloading) => {
                    return Err(LifecycleError::AlreadyDownloading(external_id));
                }
                Some(ResourceState::Deleting) => {
                    return Err(LifecycleError::RemovalInProgress(external_id));
                }
                _ => {}
            }

            // Dedup check happens under the arena lock so two concurrent
            // first-time downloads cannot both pass it.
            if self.songs.count_by_external_id(&external_id).await? > 0 {
                return Err(LifecycleError::AlreadyDownloaded(external_id));
            }

            states.insert(external_id.clone(), ResourceState::Downloading);
        }

        self.emit(LibraryEvent::Download(DownloadEvent::Started {
            external_id: external_id.clone(),
        }));

        let result = self.perform_download(descriptor, &cancel).await;
        self.states.lock().await.remove(&external_id);

        match &result {
            Ok(song) => {
                info!(size_bytes = song.file.size_bytes, "Download complete");
                self.emit(LibraryEvent::Download(DownloadEvent::Completed {
                    external_id,
                    size_bytes: song.file.size_bytes.unwrap_or(0),
                }));
            }
            Err(LifecycleError::Cancelled(_)) => {
                debug!("Download cancelled");
                self.emit(LibraryEvent::Download(DownloadEvent::Cancelled {
                    external_id,
                }));
            }
            Err(e) => {
                warn!(error = %e, "Download failed");
                self.emit(LibraryEvent::Download(DownloadEvent::Failed {
                    external_id,
                    reason: e.to_string(),
                }));
            }
        }

        result
    }

    async fn perform_download(
        &self,
        descriptor: &RemoteTrack,
        cancel: &CancellationToken,
    ) -> Result<Song> {
        let external_id = &descriptor.id;

        if cancel.is_cancelled() {
            return Err(LifecycleError::Cancelled(external_id.clone()));
        }

        let audio = self
            .source
            .fetch_audio(external_id)
            .await
            .map_err(LifecycleError::from_bridge)?;

        // Cancelled before anything was written: nothing to clean up.
        if cancel.is_cancelled() {
            return Err(LifecycleError::Cancelled(external_id.clone()));
        }

        let stored = self
            .media
            .store(&descriptor.title, audio)
            .await
            .map_err(LifecycleError::from_bridge)?;

        // Cancelled after the file was written but before the document
        // exists: same cleanup as a failure, the orphan must not survive.
        if cancel.is_cancelled() {
            self.discard_file(&stored.handle).await;
            return Err(LifecycleError::Cancelled(external_id.clone()));
        }

        match self.songs.create(descriptor, &stored).await {
            Ok(song) => Ok(song),
            Err(e) => {
                self.discard_file(&stored.handle).await;
                Err(e.into())
            }
        }
    }

    /// Tear down a song resource: backing file, join rows, cached counts,
    /// then the document itself.
    ///
    /// Idempotent: removing an id that is already `NotPresent` succeeds,
    /// and a re-invocation after a crash mid-teardown finishes the job.
    #[instrument(skip(self))]
    pub async fn remove(&self, song_id: &str) -> Result<()> {
        {
            let mut states = self.states.lock().await;
            match states.get(song_id) {
                Some(ResourceState::Downloading) => {
                    return Err(LifecycleError::AlreadyDownloading(song_id.to_string()));
                }
                Some(ResourceState::Deleting) => {
                    return Err(LifecycleError::RemovalInProgress(song_id.to_string()));
                }
                _ => {}
            }
            states.insert(song_id.to_string(), ResourceState::Deleting);
        }

        let result = self.perform_remove(song_id).await;
        self.states.lock().await.remove(song_id);

        if let Ok(true) = result {
            info!("Song removed");
            self.emit(LibraryEvent::Song(SongEvent::Removed {
                song_id: song_id.to_string(),
            }));
        }

        result.map(|_| ())
    }

    async fn perform_remove(&self, song_id: &str) -> Result<bool> {
        let Some(song) = self.songs.find_by_id(song_id).await? else {
            debug!("Song already absent; nothing to tear down");
            return Ok(false);
        };

        // (1) Backing file first. Deleting tolerates "already gone", so a
        // crash after this step leaves a tombstoned song that a
        // re-invocation can still find and finish off.
        if let Some(handle) = &song.file.local_id {
            match self.media.delete(handle).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {
                    debug!(handle = %handle, "Backing file already gone");
                }
                Err(e) => return Err(LifecycleError::from_bridge(e)),
            }
        }

        // (2) Join rows and cached counts while the song is still findable.
        // The membership cache on the document names every playlist that
        // must be decremented.
        let decrement_targets: Vec<String> = song
            .playlist_memberships
            .iter()
            .map(|m| m.playlist_id.clone())
            .collect();
        self.playlists.remove_song_memberships(song_id).await?;
        self.playlists
            .decrease_songs_count(&decrement_targets)
            .await?;

        // (3) The canonical record goes last.
        self.songs.remove(song_id).await?;
        Ok(true)
    }

    /// Resolve the local path handed to the playback engine.
    ///
    /// Never heals: a tombstoned or missing file surfaces as a typed error
    /// for the UI to turn into a re-download prompt.
    #[instrument(skip(self))]
    pub async fn resolve_for_playback(&self, song_id: &str) -> Result<PathBuf> {
        let song = self
            .songs
            .find_by_id(song_id)
            .await?
            .ok_or_else(|| LifecycleError::MissingResource(song_id.to_string()))?;

        // A record without a file reference predates the current download
        // bookkeeping; only a re-download can fix it.
        let Some(handle) = &song.file.local_id else {
            return Err(LifecycleError::InsufficientData(song_id.to_string()));
        };

        if !song.flags.is_downloaded {
            return Err(LifecycleError::MissingResource(song_id.to_string()));
        }

        match self.media.read_info(handle).await {
            Ok(info) => Ok(info.path),
            Err(e) if e.is_not_found() => {
                Err(LifecycleError::MissingResource(song_id.to_string()))
            }
            Err(e) => Err(LifecycleError::from_bridge(e)),
        }
    }

    /// Report-back from the playback collaborator; bumps the play counter.
    pub async fn report_playback(&self, song_id: &str) -> Result<u64> {
        Ok(self.songs.increment_play_count(song_id).await?)
    }

    /// Delete a partially written or orphaned file, tolerating absence.
    async fn discard_file(&self, handle: &str) {
        match self.media.delete(handle).await {
            Ok(()) => debug!(handle = %handle, "Discarded partial file"),
            Err(e) if e.is_not_found() => {}
            Err(e) => {
                // The orphan stays behind; nothing references it, and the
                // next teardown of the same handle would tolerate it.
                warn!(handle = %handle, error = %e, "Failed to discard partial file");
            }
        }
    }

    fn emit(&self, event: LibraryEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit(event);
        }
    }
}

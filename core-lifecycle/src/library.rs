//! # Library Facade
//!
//! Wires the storage capability, the three document collections with their
//! startup migrations, the catalogs and the lifecycle manager into one
//! value a host application holds on to.
//!
//! ## Usage
//!
//! ```ignore
//! use core_lifecycle::Library;
//! use core_runtime::config::LibraryConfig;
//! use std::sync::Arc;
//!
//! let config = LibraryConfig::builder()
//!     .storage(Arc::new(storage))
//!     .media(Arc::new(media))
//!     .source(Arc::new(source))
//!     .build()?;
//!
//! let library = Library::initialize(config).await?;
//! let songs = library.list_songs(&Default::default()).await?;
//! ```

use core_catalog::migrations::{membership_migrations, playlist_migrations, song_migrations};
use core_catalog::{
    CatalogError, Membership, Playlist, PlaylistCatalog, PlaylistSong, Song, SongCatalog,
    SongFilter,
};
use core_docstore::{Collection, MigrationReport};
use core_runtime::config::LibraryConfig;
use core_runtime::events::{EventBus, LibraryEvent};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, instrument};

use crate::error::Result;
use crate::manager::LifecycleManager;

/// Storage names of the three collections.
pub const SONGS_COLLECTION: &str = "songs";
pub const PLAYLISTS_COLLECTION: &str = "playlists";
pub const MEMBERSHIPS_COLLECTION: &str = "memberships";

/// Per-collection outcome of the startup migration pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct MigrationSummary {
    pub songs: MigrationReport,
    pub playlists: MigrationReport,
    pub memberships: MigrationReport,
}

impl MigrationSummary {
    pub fn is_clean(&self) -> bool {
        self.songs.is_clean() && self.playlists.is_clean() && self.memberships.is_clean()
    }
}

/// The assembled library: catalogs, lifecycle manager and event bus.
pub struct Library {
    songs: Arc<SongCatalog>,
    playlists: Arc<PlaylistCatalog>,
    lifecycle: LifecycleManager,
    event_bus: EventBus,
    migration_summary: MigrationSummary,
}

impl Library {
    /// Open the collections, run migrations and assemble the catalogs.
    ///
    /// This is the load barrier: when `initialize` returns, every
    /// collection is ready and all stored documents are at their current
    /// schema version (failures are per-document and reported in the
    /// [`MigrationSummary`]).
    #[instrument(skip(config))]
    pub async fn initialize(config: LibraryConfig) -> Result<Self> {
        let event_bus = EventBus::new(config.event_capacity);

        let songs_col = Arc::new(Collection::<Song>::new(
            config.storage.clone(),
            SONGS_COLLECTION,
        ));
        let playlists_col = Arc::new(Collection::<Playlist>::new(
            config.storage.clone(),
            PLAYLISTS_COLLECTION,
        ));
        let memberships_col = Arc::new(Collection::<Membership>::new(
            config.storage.clone(),
            MEMBERSHIPS_COLLECTION,
        ));

        let migration_summary = MigrationSummary {
            songs: songs_col
                .load_with(&song_migrations())
                .await
                .map_err(CatalogError::from)?,
            playlists: playlists_col
                .load_with(&playlist_migrations())
                .await
                .map_err(CatalogError::from)?,
            memberships: memberships_col
                .load_with(&membership_migrations())
                .await
                .map_err(CatalogError::from)?,
        };

        info!(
            songs = migration_summary.songs.scanned,
            playlists = migration_summary.playlists.scanned,
            memberships = migration_summary.memberships.scanned,
            clean = migration_summary.is_clean(),
            "Library initialized"
        );

        let songs = Arc::new(SongCatalog::new(songs_col));
        let playlists = Arc::new(
            PlaylistCatalog::new(playlists_col, memberships_col, songs.clone())
                .with_event_bus(event_bus.clone()),
        );
        let lifecycle = LifecycleManager::new(
            songs.clone(),
            playlists.clone(),
            config.media.clone(),
            config.source.clone(),
        )
        .with_event_bus(event_bus.clone());

        Ok(Self {
            songs,
            playlists,
            lifecycle,
            event_bus,
            migration_summary,
        })
    }

    pub fn songs(&self) -> &SongCatalog {
        &self.songs
    }

    pub fn playlists(&self) -> &PlaylistCatalog {
        &self.playlists
    }

    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LibraryEvent> {
        self.event_bus.subscribe()
    }

    pub fn migration_summary(&self) -> MigrationSummary {
        self.migration_summary
    }

    // =========================================================================
    // Query surface
    // =========================================================================

    pub async fn list_songs(&self, filter: &SongFilter) -> Result<Vec<Song>> {
        Ok(self.songs.list(filter).await?)
    }

    pub async fn list_playlists(&self) -> Result<Vec<Playlist>> {
        Ok(self.playlists.list_playlists().await?)
    }

    pub async fn list_playlist_songs(&self, playlist_id: &str) -> Result<Vec<PlaylistSong>> {
        Ok(self.playlists.list_playlist_songs(playlist_id).await?)
    }
}

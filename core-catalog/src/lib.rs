//! # Catalog Core
//!
//! Domain model and catalogs for locally downloaded songs and user-defined
//! playlists, on top of the document store.
//!
//! ## Overview
//!
//! - [`models`] - the stored document types (`Song`, `Playlist`,
//!   `Membership`) with validation and constructors
//! - [`migrations`] - the per-collection schema upgrade steps applied at
//!   startup
//! - [`SongCatalog`](songs::SongCatalog) - downloaded-song documents:
//!   dedup lookups, flag/favourite/play-count mutation
//! - [`PlaylistCatalog`](playlists::PlaylistCatalog) - playlist documents
//!   plus the song↔playlist join collection with dense display ordering and
//!   a denormalized `songs_count`
//!
//! Multi-step resource operations (download, teardown) live one layer up in
//! `core-lifecycle`; the catalogs only guarantee the invariants of their own
//! collections.

pub mod error;
pub mod migrations;
pub mod models;
pub mod playlists;
pub mod songs;

pub use error::{CatalogError, Result};
pub use models::{
    Cover, Membership, MembershipRef, Playlist, Song, SongFile, SongFlags,
    MEMBERSHIP_SCHEMA_VERSION, PLAYLIST_SCHEMA_VERSION, SONG_SCHEMA_VERSION,
};
pub use playlists::{CountMismatch, PlaylistCatalog, PlaylistSong};
pub use songs::{SongCatalog, SongFilter, SongSort};

//! # Resource Lifecycle
//!
//! Orchestration of the multi-step operations that keep the song catalog,
//! the playlist join rows and the backing audio files consistent with each
//! other.
//!
//! ## Overview
//!
//! - [`LifecycleManager`](manager::LifecycleManager) - per-resource state
//!   machine (`NotPresent → Downloading → Present → Deleting → NotPresent`)
//!   guarding download and teardown so that the two never run concurrently
//!   for one song, downloads happen at most once per external id, and
//!   failures roll back to a clean state
//! - [`Library`](library::Library) - facade wiring storage, collections,
//!   startup migrations, catalogs and the manager together; what a host
//!   application holds on to
//!
//! ## Crash model
//!
//! There is no write-ahead log. Teardown deletes the backing file first,
//! then join rows and counts, then the song document; every step is
//! individually idempotent, so re-invoking `remove` after a crash at any
//! point converges to the same end state. The download path never writes
//! the song document before the file is safely stored, and a crash in
//! between is repaired by the tombstone migration at next startup.

pub mod error;
pub mod library;
pub mod manager;
pub mod state;

pub use error::{LifecycleError, Result};
pub use library::{Library, MigrationSummary};
pub use manager::LifecycleManager;
pub use state::ResourceState;

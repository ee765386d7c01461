//! # Host Bridge Traits
//!
//! Capability traits that must be implemented by each host environment.
//!
//! ## Overview
//!
//! This crate defines the contract between the catalog core and the
//! environment it runs in. Each trait represents a capability the core
//! requires but does not implement itself:
//!
//! - [`KeyValueStore`](storage::KeyValueStore) - Byte-level persistence the
//!   document store sits on
//! - [`MediaFileStore`](media::MediaFileStore) - Storage for downloaded
//!   audio files, addressed by opaque handles
//! - [`TrackSource`](source::TrackSource) - Opaque remote provider of track
//!   audio; descriptors come from the external search collaborator
//!
//! Native implementations live in `bridge-native`; in-memory reference
//! implementations for tests live in [`memory`].
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type.
//! Implementations should convert environment-specific errors to
//! `BridgeError` and preserve the distinction between "not found" and
//! "operation failed" - callers rely on it for idempotent deletes.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds to support concurrent
//! usage across async tasks.

pub mod error;
pub mod media;
pub mod memory;
pub mod source;
pub mod storage;

pub use error::BridgeError;

// Re-export commonly used types
pub use media::{MediaFileStore, StoredFile};
pub use source::{RemoteTrack, Thumbnail, TrackSource};
pub use storage::KeyValueStore;

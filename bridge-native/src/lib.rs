//! # Native Bridge Implementations
//!
//! Tokio-based implementations of the bridge capabilities for desktop and
//! server hosts:
//!
//! - [`FileKeyValueStore`](kv::FileKeyValueStore) - one file per key under
//!   a root directory
//! - [`FsMediaStore`](media::FsMediaStore) - downloaded audio files under a
//!   media directory, addressed by uuid handles
//!
//! The remote [`TrackSource`](bridge_traits::source::TrackSource) stays with
//! the host application - it knows its own catalog provider.

pub mod kv;
pub mod media;

pub use kv::FileKeyValueStore;
pub use media::FsMediaStore;

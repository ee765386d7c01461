//! # Library Configuration
//!
//! Builder-pattern configuration holding the injected capability bridges
//! and runtime tunables. `build()` enforces fail-fast validation: all
//! required capabilities must be provided before the library initializes.
//!
//! ## Required capabilities
//!
//! - `KeyValueStore` - document persistence
//! - `MediaFileStore` - downloaded audio storage
//! - `TrackSource` - audio provider for downloads
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::LibraryConfig;
//! use std::sync::Arc;
//!
//! let config = LibraryConfig::builder()
//!     .storage(Arc::new(MyKeyValueStore::new()))
//!     .media(Arc::new(MyMediaStore::new()))
//!     .source(Arc::new(MyTrackSource::new()))
//!     .build()
//!     .expect("Failed to build config");
//! ```

use bridge_traits::{KeyValueStore, MediaFileStore, TrackSource};
use std::sync::Arc;

use crate::error::{Error, Result};

/// Default buffer capacity of the event bus.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Everything the library needs to initialize.
///
/// Use [`LibraryConfig::builder`] to construct instances.
#[derive(Clone)]
pub struct LibraryConfig {
    /// Byte-level persistence the document collections sit on.
    pub storage: Arc<dyn KeyValueStore>,

    /// Storage for downloaded audio files.
    pub media: Arc<dyn MediaFileStore>,

    /// Remote audio provider.
    pub source: Arc<dyn TrackSource>,

    /// Buffer capacity of the event bus.
    pub event_capacity: usize,
}

impl std::fmt::Debug for LibraryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryConfig")
            .field("storage", &"KeyValueStore { ... }")
            .field("media", &"MediaFileStore { ... }")
            .field("source", &"TrackSource { ... }")
            .field("event_capacity", &self.event_capacity)
            .finish()
    }
}

impl LibraryConfig {
    pub fn builder() -> LibraryConfigBuilder {
        LibraryConfigBuilder::default()
    }
}

/// Builder for [`LibraryConfig`].
#[derive(Default)]
pub struct LibraryConfigBuilder {
    storage: Option<Arc<dyn KeyValueStore>>,
    media: Option<Arc<dyn MediaFileStore>>,
    source: Option<Arc<dyn TrackSource>>,
    event_capacity: Option<usize>,
}

impl LibraryConfigBuilder {
    pub fn storage(mut self, storage: Arc<dyn KeyValueStore>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn media(mut self, media: Arc<dyn MediaFileStore>) -> Self {
        self.media = Some(media);
        self
    }

    pub fn source(mut self, source: Arc<dyn TrackSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = Some(capacity);
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<LibraryConfig> {
        let storage = self.storage.ok_or_else(|| Error::CapabilityMissing {
            capability: "KeyValueStore".to_string(),
            message: "No storage backend provided. \
                      Native hosts: inject bridge_native::FileKeyValueStore. \
                      Tests: inject bridge_traits::memory::MemoryKeyValueStore."
                .to_string(),
        })?;

        let media = self.media.ok_or_else(|| Error::CapabilityMissing {
            capability: "MediaFileStore".to_string(),
            message: "No media file store provided. \
                      Native hosts: inject bridge_native::FsMediaStore."
                .to_string(),
        })?;

        let source = self.source.ok_or_else(|| Error::CapabilityMissing {
            capability: "TrackSource".to_string(),
            message: "No track source provided. \
                      Inject the host's remote catalog adapter."
                .to_string(),
        })?;

        let event_capacity = self.event_capacity.unwrap_or(DEFAULT_EVENT_CAPACITY);
        if event_capacity == 0 {
            return Err(Error::InvalidConfig(
                "event_capacity must be at least 1".to_string(),
            ));
        }

        Ok(LibraryConfig {
            storage,
            media,
            source,
            event_capacity,
        })
    }
}

//! # Event Bus System
//!
//! Decoupled communication from the core to host UIs through typed events
//! over `tokio::sync::broadcast`. The lifecycle manager and catalogs emit;
//! any number of subscribers listen independently. Emission never blocks
//! and never fails the emitting operation - an event with no listeners is
//! simply dropped.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{DownloadEvent, EventBus, LibraryEvent};
//!
//! let bus = EventBus::new(64);
//! let mut rx = bus.subscribe();
//!
//! bus.emit(LibraryEvent::Download(DownloadEvent::Started {
//!     external_id: "x1".to_string(),
//! }));
//! ```

use tokio::sync::broadcast;
use tracing::trace;

/// Events produced while managing downloaded tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadEvent {
    Started { external_id: String },
    Completed { external_id: String, size_bytes: u64 },
    Failed { external_id: String, reason: String },
    Cancelled { external_id: String },
}

/// Events produced by song catalog mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SongEvent {
    Removed { song_id: String },
}

/// Events produced by playlist catalog mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistEvent {
    Created { playlist_id: String },
    Deleted { playlist_id: String },
    /// Membership rows for this playlist changed (add/remove/reorder).
    MembershipsChanged { playlist_id: String },
}

/// Top-level event type broadcast by the library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryEvent {
    Download(DownloadEvent),
    Song(SongEvent),
    Playlist(PlaylistEvent),
}

/// Central broadcast channel for [`LibraryEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<LibraryEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Broadcast an event, returning the number of subscribers reached.
    pub fn emit(&self, event: LibraryEvent) -> usize {
        trace!(?event, "Emitting library event");
        // SendError only means nobody is listening right now.
        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<LibraryEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_EVENT_CAPACITY)
    }
}

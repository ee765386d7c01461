//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the library:
//! - Logging and tracing setup
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the other core crates depend
//! on: logging conventions, the capability-holding configuration builder,
//! and the broadcast event channel consumed by host UIs.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{LibraryConfig, LibraryConfigBuilder};
pub use error::{Error, Result};
pub use events::{DownloadEvent, EventBus, LibraryEvent, PlaylistEvent, SongEvent};
pub use logging::{init_logging, LogFormat, LoggingConfig};

//! End-to-end library demonstration over the in-memory bridges.
//!
//! Run with:
//! ```bash
//! cargo run --example library_demo
//! ```

use anyhow::Result;
use bridge_traits::memory::{MemoryKeyValueStore, MemoryMediaStore, StaticTrackSource};
use bridge_traits::RemoteTrack;
use core_lifecycle::Library;
use core_runtime::config::LibraryConfig;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

fn demo_track(id: &str, title: &str) -> RemoteTrack {
    RemoteTrack {
        id: id.to_string(),
        title: title.to_string(),
        channel: "Demo Channel".to_string(),
        description: "A demo track".to_string(),
        duration_seconds: 215,
        duration_label: "3:35".to_string(),
        view_count_label: "2.4M views".to_string(),
        published_label: "2 years ago".to_string(),
        thumbnails: vec![],
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(LoggingConfig::default().with_format(LogFormat::Compact))?;

    let config = LibraryConfig::builder()
        .storage(Arc::new(MemoryKeyValueStore::new()))
        .media(Arc::new(MemoryMediaStore::new()))
        .source(Arc::new(StaticTrackSource::new(&b"demo-audio-bytes"[..])))
        .build()?;
    let library = Library::initialize(config).await?;

    // Download two tracks.
    for (id, title) in [("t1", "First Song"), ("t2", "Second Song")] {
        let song = library
            .lifecycle()
            .download(&demo_track(id, title), CancellationToken::new())
            .await?;
        info!(id = %song.id, title = %song.title, "Downloaded");
    }

    // Put them into a playlist and reorder it.
    let playlist = library.playlists().create_playlist("Demo Mix").await?;
    library.playlists().add_membership("t1", &playlist.id).await?;
    library.playlists().add_membership("t2", &playlist.id).await?;
    library
        .playlists()
        .reorder(&playlist.id, &["t2".to_string(), "t1".to_string()])
        .await?;

    for entry in library.list_playlist_songs(&playlist.id).await? {
        info!(order = entry.order, title = %entry.song.title, "Playlist entry");
    }

    // Resolve one for playback and report it played.
    let path = library.lifecycle().resolve_for_playback("t2").await?;
    info!(path = %path.display(), "Resolved for playback");
    library.lifecycle().report_playback("t2").await?;

    // Tear one down again.
    library.lifecycle().remove("t1").await?;
    info!(
        remaining = library.list_songs(&Default::default()).await?.len(),
        songs_count = library.list_playlists().await?[0].songs_count,
        "After removal"
    );

    Ok(())
}

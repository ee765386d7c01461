//! Shared fixtures for catalog tests.
#![allow(dead_code)]

use bridge_traits::memory::MemoryKeyValueStore;
use bridge_traits::{RemoteTrack, StoredFile};
use core_catalog::{Membership, Playlist, PlaylistCatalog, Song, SongCatalog};
use core_docstore::Collection;
use std::path::PathBuf;
use std::sync::Arc;

pub struct Fixture {
    pub songs: Arc<SongCatalog>,
    pub playlists: Arc<PlaylistCatalog>,
    pub songs_col: Arc<Collection<Song>>,
    pub playlists_col: Arc<Collection<Playlist>>,
    pub memberships_col: Arc<Collection<Membership>>,
}

pub async fn fixture() -> Fixture {
    let storage = Arc::new(MemoryKeyValueStore::new());

    let songs_col = Arc::new(Collection::<Song>::new(storage.clone(), "songs"));
    let playlists_col = Arc::new(Collection::<Playlist>::new(storage.clone(), "playlists"));
    let memberships_col = Arc::new(Collection::<Membership>::new(storage.clone(), "memberships"));
    songs_col.load().await.unwrap();
    playlists_col.load().await.unwrap();
    memberships_col.load().await.unwrap();

    let songs = Arc::new(SongCatalog::new(songs_col.clone()));
    let playlists = Arc::new(PlaylistCatalog::new(
        playlists_col.clone(),
        memberships_col.clone(),
        songs.clone(),
    ));

    Fixture {
        songs,
        playlists,
        songs_col,
        playlists_col,
        memberships_col,
    }
}

pub fn descriptor(id: &str, title: &str) -> RemoteTrack {
    RemoteTrack {
        id: id.to_string(),
        title: title.to_string(),
        channel: "Channel".to_string(),
        description: "A test track".to_string(),
        duration_seconds: 180,
        duration_label: "3:00".to_string(),
        view_count_label: "1K views".to_string(),
        published_label: "2 weeks ago".to_string(),
        thumbnails: vec![],
    }
}

pub fn stored_file(handle: &str) -> StoredFile {
    StoredFile {
        handle: handle.to_string(),
        path: PathBuf::from("/media").join(handle),
        size_bytes: 2048,
    }
}

impl Fixture {
    pub async fn add_song(&self, id: &str, title: &str) -> Song {
        self.songs
            .create(&descriptor(id, title), &stored_file(&format!("file-{id}")))
            .await
            .unwrap()
    }

    /// Assert the invariants of one playlist: cached count equals the
    /// live join rows and orders are exactly 0..n-1.
    pub async fn assert_playlist_consistent(&self, playlist_id: &str) {
        use core_docstore::Query;

        let playlist = self.playlists.get_playlist(playlist_id).await.unwrap();
        let mut rows = self
            .memberships_col
            .find(&Query::new().eq("playlist_id", playlist_id))
            .await
            .unwrap();
        rows.sort_by_key(|row| row.order);

        assert_eq!(
            playlist.songs_count,
            rows.len() as u64,
            "cached songs_count diverged from live join rows"
        );
        for (index, row) in rows.iter().enumerate() {
            assert_eq!(row.order, index as u32, "orders must be dense from 0");
        }
    }
}

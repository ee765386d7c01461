//! Song catalog behavior: creation, dedup lookups, flag and counter
//! mutation, filtered listings.

mod common;

use common::{descriptor, fixture, stored_file};
use core_catalog::{CatalogError, SongFilter, SongSort};
use core_docstore::DocStoreError;

#[tokio::test]
async fn create_builds_a_downloaded_song() {
    let fx = fixture().await;

    let song = fx
        .songs
        .create(&descriptor("x1", "Test Track"), &stored_file("h1"))
        .await
        .unwrap();

    assert_eq!(song.id, "x1");
    assert!(song.flags.is_downloaded);
    assert_eq!(song.file.local_id.as_deref(), Some("h1"));
    assert_eq!(song.file.size_bytes, Some(2048));
    assert_eq!(song.play_count, 0);
}

#[tokio::test]
async fn count_by_external_id_backs_dedup() {
    let fx = fixture().await;

    assert_eq!(fx.songs.count_by_external_id("x1").await.unwrap(), 0);
    fx.add_song("x1", "Track").await;
    assert_eq!(fx.songs.count_by_external_id("x1").await.unwrap(), 1);
}

#[tokio::test]
async fn second_create_for_the_same_id_fails() {
    let fx = fixture().await;
    fx.add_song("x1", "Track").await;

    let err = fx
        .songs
        .create(&descriptor("x1", "Track"), &stored_file("h2"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CatalogError::Store(DocStoreError::DuplicateKey { .. })
    ));
}

#[tokio::test]
async fn invalid_descriptor_is_rejected() {
    let fx = fixture().await;

    let err = fx
        .songs
        .create(&descriptor("", "No id"), &stored_file("h1"))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::InvalidInput { .. }));
}

#[tokio::test]
async fn favourite_and_play_count_mutations() {
    let fx = fixture().await;
    fx.add_song("x1", "Track").await;

    let song = fx.songs.set_favourite("x1", true).await.unwrap();
    assert!(song.flags.is_favourite);

    assert_eq!(fx.songs.increment_play_count("x1").await.unwrap(), 1);
    assert_eq!(fx.songs.increment_play_count("x1").await.unwrap(), 2);

    let song = fx.songs.get("x1").await.unwrap();
    assert_eq!(song.play_count, 2);
    assert!(song.flags.is_favourite);
}

#[tokio::test]
async fn mutating_a_missing_song_is_not_found() {
    let fx = fixture().await;

    let err = fx.songs.set_favourite("ghost", true).await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { .. }));

    let err = fx.songs.increment_play_count("ghost").await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { .. }));
}

#[tokio::test]
async fn find_by_ids_preserves_order_and_skips_unknown() {
    let fx = fixture().await;
    fx.add_song("a", "A").await;
    fx.add_song("b", "B").await;

    let songs = fx
        .songs
        .find_by_ids(&["b".to_string(), "ghost".to_string(), "a".to_string()])
        .await
        .unwrap();
    let ids: Vec<&str> = songs.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a"]);
}

#[tokio::test]
async fn list_filters_favourites_and_titles() {
    let fx = fixture().await;
    fx.add_song("a", "Morning Run").await;
    fx.add_song("b", "Evening Chill").await;
    fx.add_song("c", "Morning Coffee").await;
    fx.songs.set_favourite("b", true).await.unwrap();

    let favourites = fx
        .songs
        .list(&SongFilter {
            favourites_only: true,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(favourites.len(), 1);
    assert_eq!(favourites[0].id, "b");

    let mornings = fx
        .songs
        .list(&SongFilter {
            title_contains: Some("morning".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(mornings.len(), 2);
}

#[tokio::test]
async fn list_sorts_by_title_both_directions() {
    let fx = fixture().await;
    fx.add_song("a", "Charlie").await;
    fx.add_song("b", "Alpha").await;
    fx.add_song("c", "Bravo").await;

    let ascending = fx
        .songs
        .list(&SongFilter {
            sort: SongSort::TitleAscending,
            ..Default::default()
        })
        .await
        .unwrap();
    let titles: Vec<&str> = ascending.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Alpha", "Bravo", "Charlie"]);

    let descending = fx
        .songs
        .list(&SongFilter {
            sort: SongSort::TitleDescending,
            ..Default::default()
        })
        .await
        .unwrap();
    let titles: Vec<&str> = descending.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Charlie", "Bravo", "Alpha"]);
}

#[tokio::test]
async fn remove_reports_whether_the_song_existed() {
    let fx = fixture().await;
    fx.add_song("x1", "Track").await;

    assert!(fx.songs.remove("x1").await.unwrap());
    assert!(!fx.songs.remove("x1").await.unwrap());
    assert!(fx.songs.find_by_id("x1").await.unwrap().is_none());
}

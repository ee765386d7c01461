//! Contract tests for the document collection over the in-memory backend.

use bridge_traits::memory::MemoryKeyValueStore;
use core_docstore::{
    Collection, DocStoreError, Document, Patch, Query, RemoveOptions, UpdateOptions,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Note {
    id: String,
    title: String,
    pinned: bool,
    schema_version: u32,
}

impl Document for Note {
    const KEY_FIELD: &'static str = "id";
    const SCHEMA_VERSION: u32 = 1;
}

fn note(id: &str, title: &str) -> Note {
    Note {
        id: id.to_string(),
        title: title.to_string(),
        pinned: false,
        schema_version: Note::SCHEMA_VERSION,
    }
}

async fn loaded_collection() -> (Arc<MemoryKeyValueStore>, Collection<Note>) {
    let storage = Arc::new(MemoryKeyValueStore::new());
    let collection = Collection::new(storage.clone(), "notes");
    collection.load().await.unwrap();
    (storage, collection)
}

#[tokio::test]
async fn operations_fail_before_load() {
    let storage = Arc::new(MemoryKeyValueStore::new());
    let collection: Collection<Note> = Collection::new(storage, "notes");

    let err = collection.count(&Query::all()).await.unwrap_err();
    assert!(matches!(err, DocStoreError::NotInitialized(name) if name == "notes"));

    let err = collection.insert(&note("a", "A")).await.unwrap_err();
    assert!(matches!(err, DocStoreError::NotInitialized(_)));
}

#[tokio::test]
async fn insert_then_find_one_round_trips() {
    let (_storage, collection) = loaded_collection().await;

    let stored = collection.insert(&note("a", "First")).await.unwrap();
    assert_eq!(stored, note("a", "First"));

    let found = collection
        .find_one(&Query::new().eq("id", "a"))
        .await
        .unwrap()
        .expect("inserted note should be findable");
    assert_eq!(found, note("a", "First"));
}

#[tokio::test]
async fn store_assigns_timestamps_outside_the_model() {
    let (_storage, collection) = loaded_collection().await;
    collection.insert(&note("a", "First")).await.unwrap();

    let raw = collection.raw("a").await.unwrap().unwrap();
    assert!(raw.get("created_at").and_then(|v| v.as_i64()).is_some());
    assert!(raw.get("updated_at").and_then(|v| v.as_i64()).is_some());
}

#[tokio::test]
async fn insert_rejects_missing_key_field() {
    let (_storage, collection) = loaded_collection().await;

    let err = collection.insert(&note("", "Empty id")).await.unwrap_err();
    assert!(matches!(err, DocStoreError::Validation(_)));
}

#[tokio::test]
async fn insert_rejects_duplicate_key() {
    let (_storage, collection) = loaded_collection().await;
    collection.insert(&note("a", "First")).await.unwrap();

    let err = collection.insert(&note("a", "Again")).await.unwrap_err();
    assert!(matches!(
        err,
        DocStoreError::DuplicateKey { collection, key } if collection == "notes" && key == "a"
    ));
}

#[tokio::test]
async fn count_and_find_filter_by_fields() {
    let (_storage, collection) = loaded_collection().await;
    collection.insert(&note("a", "One")).await.unwrap();
    collection.insert(&note("b", "Two")).await.unwrap();
    collection
        .insert(&Note {
            pinned: true,
            ..note("c", "Three")
        })
        .await
        .unwrap();

    assert_eq!(collection.count(&Query::all()).await.unwrap(), 3);
    assert_eq!(
        collection.count(&Query::new().eq("pinned", true)).await.unwrap(),
        1
    );

    let unpinned = collection.find(&Query::new().eq("pinned", false)).await.unwrap();
    assert_eq!(unpinned.len(), 2);
}

#[tokio::test]
async fn update_single_and_multi() {
    let (_storage, collection) = loaded_collection().await;
    collection.insert(&note("a", "One")).await.unwrap();
    collection.insert(&note("b", "Two")).await.unwrap();

    let outcome = collection
        .update(
            &Query::new().eq("id", "a"),
            &Patch::new().set("title", "Renamed"),
            UpdateOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(outcome.matched, 1);
    assert_eq!(outcome.updated_documents[0].title, "Renamed");

    let outcome = collection
        .update(
            &Query::all(),
            &Patch::new().set("pinned", true),
            UpdateOptions {
                multi: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(outcome.matched, 2);
    assert_eq!(
        collection.count(&Query::new().eq("pinned", true)).await.unwrap(),
        2
    );
}

#[tokio::test]
async fn update_without_match_is_a_no_op() {
    let (_storage, collection) = loaded_collection().await;

    let outcome = collection
        .update(
            &Query::new().eq("id", "ghost"),
            &Patch::new().set("title", "x"),
            UpdateOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(outcome.matched, 0);
    assert!(outcome.updated_documents.is_empty());
    assert!(!outcome.upserted);
}

#[tokio::test]
async fn upsert_synthesizes_from_query_and_patch() {
    let (_storage, collection) = loaded_collection().await;

    let outcome = collection
        .update(
            &Query::new().eq("id", "a"),
            &Patch::new()
                .set("title", "Upserted")
                .set("pinned", false)
                .set("schema_version", Note::SCHEMA_VERSION),
            UpdateOptions {
                upsert: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(outcome.upserted);
    assert_eq!(outcome.updated_documents[0].id, "a");
    assert_eq!(collection.count(&Query::all()).await.unwrap(), 1);
}

#[tokio::test]
async fn patch_may_not_touch_the_key_field() {
    let (_storage, collection) = loaded_collection().await;
    collection.insert(&note("a", "One")).await.unwrap();

    let err = collection
        .update(
            &Query::new().eq("id", "a"),
            &Patch::new().set("id", "b"),
            UpdateOptions::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DocStoreError::Validation(_)));
}

#[tokio::test]
async fn remove_single_and_multi() {
    let (_storage, collection) = loaded_collection().await;
    collection.insert(&note("a", "One")).await.unwrap();
    collection.insert(&note("b", "Two")).await.unwrap();
    collection.insert(&note("c", "Three")).await.unwrap();

    let removed = collection
        .remove(&Query::new().eq("id", "b"), RemoveOptions::default())
        .await
        .unwrap();
    assert_eq!(removed, 1);

    let removed = collection
        .remove(&Query::all(), RemoveOptions { multi: true })
        .await
        .unwrap();
    assert_eq!(removed, 2);
    assert_eq!(collection.count(&Query::all()).await.unwrap(), 0);
}

#[tokio::test]
async fn documents_survive_a_reload() {
    let (storage, collection) = loaded_collection().await;
    collection.insert(&note("a", "Persisted")).await.unwrap();
    drop(collection);

    let reopened: Collection<Note> = Collection::new(storage, "notes");
    reopened.load().await.unwrap();

    let found = reopened
        .find_one(&Query::new().eq("id", "a"))
        .await
        .unwrap();
    assert_eq!(found, Some(note("a", "Persisted")));
}

#[tokio::test]
async fn collections_are_key_scoped() {
    let storage = Arc::new(MemoryKeyValueStore::new());
    let notes: Collection<Note> = Collection::new(storage.clone(), "notes");
    let archive: Collection<Note> = Collection::new(storage.clone(), "archive");
    notes.load().await.unwrap();
    archive.load().await.unwrap();

    notes.insert(&note("a", "In notes")).await.unwrap();

    assert_eq!(archive.count(&Query::all()).await.unwrap(), 0);
    assert_eq!(notes.count(&Query::all()).await.unwrap(), 1);
}

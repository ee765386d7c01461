//! Schema upgrade steps for the three collections.
//!
//! Applied once per collection during the startup load step. Steps operate
//! on the raw JSON because documents at old versions may not deserialize
//! into the current model types.

use core_docstore::MigrationSet;
use serde_json::{json, Value};

use crate::models::{
    cover_colour, MEMBERSHIP_SCHEMA_VERSION, PLAYLIST_SCHEMA_VERSION, SONG_SCHEMA_VERSION,
};

/// Upgrade steps for the songs collection.
pub fn song_migrations() -> MigrationSet {
    MigrationSet::new(SONG_SCHEMA_VERSION)
        .step(1, song_v1_flags_subdocument)
        .step(2, song_v2_play_count)
        .step(3, song_v3_tombstone_repair)
}

/// Upgrade steps for the playlists collection.
pub fn playlist_migrations() -> MigrationSet {
    MigrationSet::new(PLAYLIST_SCHEMA_VERSION)
        .step(1, playlist_v1_cover)
        .step(2, playlist_v2_clamp_count)
}

/// Upgrade steps for the memberships collection.
pub fn membership_migrations() -> MigrationSet {
    MigrationSet::new(MEMBERSHIP_SCHEMA_VERSION).step(1, membership_v1_favourite_flag)
}

/// v1: early records kept `is_favourite` as a flat field and had no flags
/// sub-document at all. Fold everything into `flags`.
fn song_v1_flags_subdocument(mut doc: Value) -> Result<Value, String> {
    let object = doc.as_object_mut().ok_or("song document is not an object")?;

    if !object.contains_key("flags") {
        let legacy_favourite = object
            .remove("is_favourite")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let has_cover = object
            .get("cover")
            .and_then(|c| c.get("uri"))
            .map(|uri| !uri.is_null())
            .unwrap_or(false);
        let is_downloaded = object
            .get("file")
            .and_then(|f| f.get("local_id"))
            .map(|id| !id.is_null())
            .unwrap_or(false);

        object.insert(
            "flags".to_string(),
            json!({
                "has_cover": has_cover,
                "is_downloaded": is_downloaded,
                "is_favourite": legacy_favourite,
            }),
        );
    }

    Ok(doc)
}

/// v2: playback reporting added a per-song play counter.
fn song_v2_play_count(mut doc: Value) -> Result<Value, String> {
    let object = doc.as_object_mut().ok_or("song document is not an object")?;
    object.entry("play_count").or_insert(json!(0));
    Ok(doc)
}

/// v3: repair the downloaded flag on tombstoned records.
///
/// A crash between file deletion and flag update (or a legacy record that
/// never stored a file id) leaves `is_downloaded` asserting a file that does
/// not exist. Resolution for such records is a user-visible re-download, so
/// the flag must not keep promising playable audio.
fn song_v3_tombstone_repair(mut doc: Value) -> Result<Value, String> {
    let object = doc.as_object_mut().ok_or("song document is not an object")?;

    let file_missing = object
        .get("file")
        .and_then(|f| f.get("local_id"))
        .map(|id| id.is_null())
        .unwrap_or(true);

    if file_missing {
        if let Some(flags) = object.get_mut("flags").and_then(Value::as_object_mut) {
            flags.insert("is_downloaded".to_string(), json!(false));
        }
    }

    Ok(doc)
}

/// v1: playlists gained cover metadata.
fn playlist_v1_cover(mut doc: Value) -> Result<Value, String> {
    let object = doc
        .as_object_mut()
        .ok_or("playlist document is not an object")?;

    if !object.contains_key("cover") {
        let name = object
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        object.insert(
            "cover".to_string(),
            json!({
                "color_fallback": cover_colour(&name),
                "name": name,
                "uri": null,
            }),
        );
    }

    Ok(doc)
}

/// v2: a sign bug could drive the cached count negative; clamp it.
fn playlist_v2_clamp_count(mut doc: Value) -> Result<Value, String> {
    let object = doc
        .as_object_mut()
        .ok_or("playlist document is not an object")?;

    let count = object
        .get("songs_count")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    object.insert("songs_count".to_string(), json!(count.max(0)));

    Ok(doc)
}

/// v1: join rows gained a per-membership favourite flag.
fn membership_v1_favourite_flag(mut doc: Value) -> Result<Value, String> {
    let object = doc
        .as_object_mut()
        .ok_or("membership document is not an object")?;
    object.entry("is_favourite").or_insert(json!(false));
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v1_folds_legacy_favourite_into_flags() {
        let legacy = json!({"id": "x1", "is_favourite": true,
                            "file": {"local_id": "h1"}, "cover": {"uri": null}});
        let upgraded = song_v1_flags_subdocument(legacy).unwrap();

        assert_eq!(upgraded["flags"]["is_favourite"], json!(true));
        assert_eq!(upgraded["flags"]["is_downloaded"], json!(true));
        assert_eq!(upgraded["flags"]["has_cover"], json!(false));
        assert!(upgraded.get("is_favourite").is_none());
    }

    #[test]
    fn v3_clears_downloaded_flag_on_tombstones() {
        let tombstone = json!({"id": "x1", "file": {"local_id": null},
                               "flags": {"is_downloaded": true}});
        let upgraded = song_v3_tombstone_repair(tombstone).unwrap();
        assert_eq!(upgraded["flags"]["is_downloaded"], json!(false));

        let healthy = json!({"id": "x2", "file": {"local_id": "h2"},
                             "flags": {"is_downloaded": true}});
        let untouched = song_v3_tombstone_repair(healthy).unwrap();
        assert_eq!(untouched["flags"]["is_downloaded"], json!(true));
    }

    #[test]
    fn playlist_v2_clamps_negative_counts() {
        let broken = json!({"id": "p1", "name": "Mix", "songs_count": -2});
        let upgraded = playlist_v2_clamp_count(broken).unwrap();
        assert_eq!(upgraded["songs_count"], json!(0));
    }
}

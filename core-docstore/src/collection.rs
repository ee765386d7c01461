//! Typed document collections over a key-value storage capability.

use bytes::Bytes;
use chrono::Utc;
use futures::future::try_join_all;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use bridge_traits::storage::KeyValueStore;

use crate::error::{DocStoreError, Result};
use crate::migration::{MigrationReport, MigrationSet};
use crate::query::{Patch, Query, RemoveOptions, UpdateOptions, UpdateOutcome};

/// Name of the per-document version field driving migrations.
pub const SCHEMA_VERSION_FIELD: &str = "schema_version";

/// Fields stamped by the store itself, invisible to the typed model.
const CREATED_AT_FIELD: &str = "created_at";
const UPDATED_AT_FIELD: &str = "updated_at";

/// A type stored in a [`Collection`].
///
/// `KEY_FIELD` names the field that uniquely identifies a document within
/// its collection; `insert` rejects documents where it is missing or empty.
pub trait Document:
    Serialize + DeserializeOwned + Clone + Send + Sync + 'static
{
    const KEY_FIELD: &'static str;
    /// Schema version stamped on newly created documents of this type.
    const SCHEMA_VERSION: u32;
}

/// A named collection of documents over a [`KeyValueStore`].
///
/// Documents are held in memory once loaded; every mutation is persisted to
/// the backend before it becomes visible. All operations fail with
/// [`DocStoreError::NotInitialized`] until [`load`](Self::load) or
/// [`load_with`](Self::load_with) has completed.
pub struct Collection<T: Document> {
    name: String,
    storage: Arc<dyn KeyValueStore>,
    state: RwLock<Option<BTreeMap<String, Value>>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Document> Collection<T> {
    /// Create an unloaded collection. Await [`load`](Self::load) before use.
    pub fn new(storage: Arc<dyn KeyValueStore>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            storage,
            state: RwLock::new(None),
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn is_loaded(&self) -> bool {
        self.state.read().await.is_some()
    }

    /// Load all stored documents. Operations are rejected until this
    /// completes.
    pub async fn load(&self) -> Result<()> {
        let docs = self.read_all_from_storage().await?;
        debug!(collection = %self.name, documents = docs.len(), "Loaded collection");
        *self.state.write().await = Some(docs);
        Ok(())
    }

    /// Load all stored documents and bring stale ones up to the current
    /// schema version before the collection is considered ready.
    pub async fn load_with(&self, migrations: &MigrationSet) -> Result<MigrationReport> {
        let mut docs = self.read_all_from_storage().await?;
        let mut report = MigrationReport {
            scanned: docs.len(),
            ..Default::default()
        };

        for (key, doc) in docs.iter_mut() {
            let version = doc
                .get(SCHEMA_VERSION_FIELD)
                .and_then(Value::as_u64)
                .unwrap_or(0) as u32;

            if version >= migrations.current_version() {
                continue;
            }

            match self.migrate_document(migrations, key, doc.clone(), version).await {
                Ok(migrated) => {
                    *doc = migrated;
                    report.migrated += 1;
                }
                Err(MigrateFailure {
                    reached,
                    to_version,
                    message,
                    partial,
                }) => {
                    warn!(
                        collection = %self.name,
                        key = %key,
                        reached_version = reached,
                        failed_step = to_version,
                        %message,
                        "Migration step failed; document left at last persisted version"
                    );
                    if let Some(partial) = partial {
                        *doc = partial;
                    }
                    report.failed += 1;
                }
            }
        }

        info!(
            collection = %self.name,
            scanned = report.scanned,
            migrated = report.migrated,
            failed = report.failed,
            "Collection ready"
        );
        *self.state.write().await = Some(docs);
        Ok(report)
    }

    /// Number of documents matching `query`.
    pub async fn count(&self, query: &Query) -> Result<usize> {
        let guard = self.state.read().await;
        let docs = self.require_loaded(&guard)?;

        Ok(docs.values().filter(|doc| query.matches(doc)).count())
    }

    /// All documents matching `query`, in no particular order.
    pub async fn find(&self, query: &Query) -> Result<Vec<T>> {
        let guard = self.state.read().await;
        let docs = self.require_loaded(&guard)?;

        docs.values()
            .filter(|doc| query.matches(doc))
            .map(|doc| Ok(serde_json::from_value((*doc).clone())?))
            .collect()
    }

    /// First document matching `query`, if any.
    pub async fn find_one(&self, query: &Query) -> Result<Option<T>> {
        let guard = self.state.read().await;
        let docs = self.require_loaded(&guard)?;

        match docs.values().find(|doc| query.matches(doc)) {
            Some(doc) => Ok(Some(serde_json::from_value(doc.clone())?)),
            None => Ok(None),
        }
    }

    /// Insert `document`, returning the stored copy.
    ///
    /// Fails with [`DocStoreError::Validation`] when the key field is
    /// missing or empty and with [`DocStoreError::DuplicateKey`] when a
    /// document with the same key already exists.
    pub async fn insert(&self, document: &T) -> Result<T> {
        let mut value = serde_json::to_value(document)?;
        let key = self.document_key(&value)?;

        let mut guard = self.state.write().await;
        let docs = self.require_loaded_mut(&mut guard)?;

        if docs.contains_key(&key) {
            return Err(DocStoreError::DuplicateKey {
                collection: self.name.clone(),
                key,
            });
        }

        let now = Value::from(Utc::now().timestamp());
        if let Some(object) = value.as_object_mut() {
            object.insert(CREATED_AT_FIELD.to_string(), now.clone());
            object.insert(UPDATED_AT_FIELD.to_string(), now);
        }

        self.persist(&key, &value).await?;
        let stored = serde_json::from_value(value.clone())?;
        docs.insert(key, value);

        Ok(stored)
    }

    /// Apply `patch` to the documents matching `query`.
    ///
    /// With `multi` every match is updated, otherwise only the first. With
    /// `upsert` and no match, a document is synthesized from the query's
    /// equality clauses plus the patch and inserted.
    pub async fn update(
        &self,
        query: &Query,
        patch: &Patch,
        options: UpdateOptions,
    ) -> Result<UpdateOutcome<T>> {
        if patch.touches(T::KEY_FIELD) {
            return Err(DocStoreError::Validation(format!(
                "patch must not modify key field '{}'",
                T::KEY_FIELD
            )));
        }

        let mut guard = self.state.write().await;
        let docs = self.require_loaded_mut(&mut guard)?;

        let matched_keys: Vec<String> = {
            let mut keys = docs
                .iter()
                .filter(|(_, doc)| query.matches(doc))
                .map(|(key, _)| key.clone());

            if options.multi {
                keys.collect()
            } else {
                keys.next().into_iter().collect()
            }
        };

        if matched_keys.is_empty() {
            if !options.upsert {
                return Ok(UpdateOutcome {
                    matched: 0,
                    updated_documents: Vec::new(),
                    upserted: false,
                });
            }

            // Upsert: base document from the query's equality clauses.
            let mut value = Value::Object(Default::default());
            let seed = Patch::new();
            let seed = query
                .eq_clauses()
                .fold(seed, |p, (path, v)| p.set(path, v.clone()));
            seed.apply(&mut value);
            patch.apply(&mut value);

            let key = self.document_key(&value)?;
            if docs.contains_key(&key) {
                return Err(DocStoreError::DuplicateKey {
                    collection: self.name.clone(),
                    key,
                });
            }

            let now = Value::from(Utc::now().timestamp());
            if let Some(object) = value.as_object_mut() {
                object.insert(CREATED_AT_FIELD.to_string(), now.clone());
                object.insert(UPDATED_AT_FIELD.to_string(), now);
            }

            self.persist(&key, &value).await?;
            let stored: T = serde_json::from_value(value.clone())?;
            docs.insert(key, value);

            return Ok(UpdateOutcome {
                matched: 0,
                updated_documents: vec![stored],
                upserted: true,
            });
        }

        let mut updated_documents = Vec::with_capacity(matched_keys.len());
        for key in &matched_keys {
            let mut value = docs
                .get(key)
                .expect("matched key present under write lock")
                .clone();
            patch.apply(&mut value);
            if let Some(object) = value.as_object_mut() {
                object.insert(
                    UPDATED_AT_FIELD.to_string(),
                    Value::from(Utc::now().timestamp()),
                );
            }

            self.persist(key, &value).await?;
            updated_documents.push(serde_json::from_value(value.clone())?);
            docs.insert(key.clone(), value);
        }

        Ok(UpdateOutcome {
            matched: matched_keys.len(),
            updated_documents,
            upserted: false,
        })
    }

    /// Remove the documents matching `query`, returning how many went away.
    pub async fn remove(&self, query: &Query, options: RemoveOptions) -> Result<usize> {
        let mut guard = self.state.write().await;
        let docs = self.require_loaded_mut(&mut guard)?;

        let matched_keys: Vec<String> = {
            let mut keys = docs
                .iter()
                .filter(|(_, doc)| query.matches(doc))
                .map(|(key, _)| key.clone());

            if options.multi {
                keys.collect()
            } else {
                keys.next().into_iter().collect()
            }
        };

        for key in &matched_keys {
            self.storage.delete(&self.storage_key(key)).await?;
            docs.remove(key);
        }

        Ok(matched_keys.len())
    }

    /// Raw JSON of the document stored under `key`, bypassing the typed
    /// model. Intended for consistency-check tooling and tests.
    pub async fn raw(&self, key: &str) -> Result<Option<Value>> {
        let guard = self.state.read().await;
        let docs = self.require_loaded(&guard)?;

        Ok(docs.get(key).cloned())
    }

    fn require_loaded<'a>(
        &self,
        guard: &'a tokio::sync::RwLockReadGuard<'_, Option<BTreeMap<String, Value>>>,
    ) -> Result<&'a BTreeMap<String, Value>> {
        guard
            .as_ref()
            .ok_or_else(|| DocStoreError::NotInitialized(self.name.clone()))
    }

    fn require_loaded_mut<'a>(
        &self,
        guard: &'a mut tokio::sync::RwLockWriteGuard<'_, Option<BTreeMap<String, Value>>>,
    ) -> Result<&'a mut BTreeMap<String, Value>> {
        guard
            .as_mut()
            .ok_or_else(|| DocStoreError::NotInitialized(self.name.clone()))
    }

    fn document_key(&self, value: &Value) -> Result<String> {
        match value.get(T::KEY_FIELD).and_then(Value::as_str) {
            Some(key) if !key.trim().is_empty() => Ok(key.to_string()),
            _ => Err(DocStoreError::Validation(format!(
                "document in '{}' is missing required key field '{}'",
                self.name,
                T::KEY_FIELD
            ))),
        }
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}/{}", self.name, key)
    }

    async fn persist(&self, key: &str, value: &Value) -> Result<()> {
        let blob = serde_json::to_vec(value)?;
        self.storage
            .put(&self.storage_key(key), Bytes::from(blob))
            .await?;
        Ok(())
    }

    async fn read_all_from_storage(&self) -> Result<BTreeMap<String, Value>> {
        let prefix = format!("{}/", self.name);
        let keys = self.storage.keys(&prefix).await?;

        let reads = keys.iter().map(|key| self.storage.get(key));
        let blobs = try_join_all(reads).await?;

        let mut docs = BTreeMap::new();
        for (storage_key, blob) in keys.iter().zip(blobs) {
            let Some(blob) = blob else {
                // Key listed but deleted concurrently; nothing to load.
                continue;
            };
            let value: Value = serde_json::from_slice(&blob)?;
            let key = storage_key
                .strip_prefix(&prefix)
                .unwrap_or(storage_key)
                .to_string();
            docs.insert(key, value);
        }

        Ok(docs)
    }

    /// Apply the remaining migration steps to one document, persisting each
    /// step before moving on.
    async fn migrate_document(
        &self,
        migrations: &MigrationSet,
        key: &str,
        mut current: Value,
        from_version: u32,
    ) -> std::result::Result<Value, MigrateFailure> {
        let mut reached = from_version;
        let mut persisted: Option<Value> = None;

        for step in migrations.steps_from(from_version) {
            let next = match (step.apply)(current.clone()) {
                Ok(mut next) => {
                    match next.as_object_mut() {
                        Some(object) => {
                            object.insert(
                                SCHEMA_VERSION_FIELD.to_string(),
                                Value::from(step.to_version),
                            );
                        }
                        None => {
                            return Err(MigrateFailure {
                                reached,
                                to_version: step.to_version,
                                message: "step produced a non-object document".to_string(),
                                partial: persisted,
                            });
                        }
                    }
                    next
                }
                Err(message) => {
                    return Err(MigrateFailure {
                        reached,
                        to_version: step.to_version,
                        message,
                        partial: persisted,
                    });
                }
            };

            // Persist before committing in memory: a crash here leaves the
            // document at a well-defined version either way.
            if let Err(e) = self.persist(key, &next).await {
                return Err(MigrateFailure {
                    reached,
                    to_version: step.to_version,
                    message: e.to_string(),
                    partial: persisted,
                });
            }

            reached = step.to_version;
            persisted = Some(next.clone());
            current = next;
        }

        if reached < migrations.current_version() {
            return Err(MigrateFailure {
                reached,
                to_version: migrations.current_version(),
                message: "no migration steps reach the current version".to_string(),
                partial: persisted,
            });
        }

        Ok(current)
    }
}

struct MigrateFailure {
    reached: u32,
    to_version: u32,
    message: String,
    /// Last successfully persisted state, if any step got through.
    partial: Option<Value>,
}

//! # Document Store
//!
//! A small embedded document store: named collections of JSON documents over
//! a pluggable byte-level [`KeyValueStore`](bridge_traits::storage::KeyValueStore)
//! capability, with query-by-field semantics and per-collection schema
//! migration.
//!
//! ## Overview
//!
//! - [`Collection<T>`](collection::Collection) - async count/find/insert/
//!   update/remove over typed documents, serialized as JSON blobs under
//!   collection-scoped keys
//! - [`Query`](query::Query) / [`Patch`](query::Patch) - structural
//!   field matching and field-level updates on dotted paths; no general
//!   query language
//! - [`MigrationSet`](migration::MigrationSet) - ordered per-version upgrade
//!   steps applied during the collection load step, before the collection is
//!   considered ready
//!
//! ## Load barrier
//!
//! A collection is constructed unloaded and every operation fails with
//! [`DocStoreError::NotInitialized`](error::DocStoreError::NotInitialized)
//! until [`load`](collection::Collection::load) (or
//! [`load_with`](collection::Collection::load_with)) has completed. Callers
//! are expected to await initialization once at startup and share the loaded
//! collection.

pub mod collection;
pub mod error;
pub mod migration;
pub mod query;

pub use collection::{Collection, Document, SCHEMA_VERSION_FIELD};
pub use error::{DocStoreError, Result};
pub use migration::{MigrationReport, MigrationSet, MigrationStep};
pub use query::{Patch, Query, RemoveOptions, UpdateOptions, UpdateOutcome};

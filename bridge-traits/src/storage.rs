//! Key-Value Storage Abstraction
//!
//! Provides the byte-level persistence capability the document store is
//! built on. The contract is deliberately small: whole values under string
//! keys, no partial reads, no transactions. Collections serialize complete
//! documents as byte blobs under collection-scoped keys
//! (`"{collection}/{document key}"`).
//!
//! # Example
//!
//! ```ignore
//! use bridge_traits::storage::KeyValueStore;
//! use bytes::Bytes;
//!
//! async fn save(store: &dyn KeyValueStore) -> bridge_traits::error::Result<()> {
//!     store.put("songs/x1", Bytes::from_static(b"{\"id\":\"x1\"}")).await?;
//!     let blob = store.get("songs/x1").await?;
//!     assert!(blob.is_some());
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Byte-level key-value persistence.
///
/// Backends: a file-per-key directory store on native targets
/// (`bridge-native`), an in-memory map for tests ([`crate::memory`]).
/// Implementations must tolerate concurrent calls; per-key atomicity is
/// enough, callers never rely on cross-key ordering.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, or `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Write `value` under `key`, replacing any previous value.
    async fn put(&self, key: &str, value: Bytes) -> Result<()>;

    /// Remove the value under `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// List all keys starting with `prefix`, in unspecified order.
    ///
    /// Used by collections to enumerate their documents during the load
    /// step.
    async fn keys(&self, prefix: &str) -> Result<Vec<String>>;
}

//! Abstract storage traits for the browser-owned stores.
//!
//! The persistent store, the session store and the cache buckets all belong to
//! the browser. These traits let the clearing logic run against:
//! - In-memory backends for tests and native hosts
//! - `web-sys` backends inside a real page

use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The store is not reachable (disabled, blocked by privacy settings, no window).
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// The store rejected a write because it is full.
    #[error("Storage quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Backend error.
    #[error("Storage backend error: {0}")]
    BackendError(String),
}

/// A browser key-value store (`localStorage` or `sessionStorage`).
///
/// Removing an absent key is not an error.
pub trait KeyValueStore {
    /// Read the value stored under `key`.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove the entry stored under `key`.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Remove every entry.
    fn clear(&self) -> Result<(), StorageError>;

    /// Number of stored entries.
    fn len(&self) -> Result<usize, StorageError>;

    /// Returns true if the store holds no entries.
    fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}

/// Named cache buckets (the `CacheStorage` API).
///
/// The browser API is promise-based; implementations block the calling thread,
/// so they are only ever driven from a detached sweep, never from the click path.
pub trait CacheBuckets: Send + Sync {
    /// List bucket names.
    fn keys(&self) -> Result<Vec<String>, StorageError>;

    /// Delete a bucket. Returns `false` if no bucket had that name.
    fn delete(&self, name: &str) -> Result<bool, StorageError>;
}

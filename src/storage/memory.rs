//! In-memory storage backend.
//!
//! Thread-safe implementations of the storage traits, intended for native
//! hosts, tests, and as a reference for browser-backed implementations.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use crate::storage::traits::{CacheBuckets, KeyValueStore, StorageError};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

/// In-memory key-value store with `Storage` semantics.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl InMemoryKeyValueStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `entries`.
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect::<BTreeMap<_, _>>();
        Self {
            entries: RwLock::new(map),
        }
    }

    /// Snapshot of the stored keys, sorted.
    pub fn keys(&self) -> Result<Vec<String>, StorageError> {
        let guard = self.entries.read().map_err(|_| lock_err("kv.read"))?;
        Ok(guard.keys().cloned().collect())
    }

    /// Returns true if `key` is present.
    pub fn contains_key(&self, key: &str) -> Result<bool, StorageError> {
        let guard = self.entries.read().map_err(|_| lock_err("kv.read"))?;
        Ok(guard.contains_key(key))
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self.entries.read().map_err(|_| lock_err("kv.read"))?;
        Ok(guard.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self.entries.write().map_err(|_| lock_err("kv.write"))?;
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self.entries.write().map_err(|_| lock_err("kv.write"))?;
        guard.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut guard = self.entries.write().map_err(|_| lock_err("kv.write"))?;
        guard.clear();
        Ok(())
    }

    fn len(&self) -> Result<usize, StorageError> {
        let guard = self.entries.read().map_err(|_| lock_err("kv.read"))?;
        Ok(guard.len())
    }
}

/// In-memory named cache buckets with `CacheStorage` semantics.
#[derive(Debug, Default)]
pub struct InMemoryCacheBuckets {
    names: RwLock<BTreeSet<String>>,
}

impl InMemoryCacheBuckets {
    /// Create an empty set of buckets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create buckets with the given names.
    pub fn with_buckets<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            names: RwLock::new(names.into_iter().map(Into::into).collect()),
        }
    }

    /// Open (create if missing) the bucket called `name`.
    pub fn open(&self, name: &str) -> Result<(), StorageError> {
        let mut guard = self.names.write().map_err(|_| lock_err("buckets.write"))?;
        guard.insert(name.to_string());
        Ok(())
    }

    /// Returns true if a bucket called `name` exists.
    pub fn has(&self, name: &str) -> Result<bool, StorageError> {
        let guard = self.names.read().map_err(|_| lock_err("buckets.read"))?;
        Ok(guard.contains(name))
    }
}

impl CacheBuckets for InMemoryCacheBuckets {
    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let guard = self.names.read().map_err(|_| lock_err("buckets.read"))?;
        Ok(guard.iter().cloned().collect())
    }

    fn delete(&self, name: &str) -> Result<bool, StorageError> {
        let mut guard = self.names.write().map_err(|_| lock_err("buckets.write"))?;
        Ok(guard.remove(name))
    }
}

/// Convenience bundle of the three in-memory stores a page owns.
#[derive(Debug, Default)]
pub struct InMemoryStores {
    /// Persistent (`localStorage`) store.
    pub persistent: InMemoryKeyValueStore,
    /// Session-scoped (`sessionStorage`) store.
    pub session: InMemoryKeyValueStore,
    /// Named cache buckets.
    pub caches: InMemoryCacheBuckets,
}

impl InMemoryStores {
    /// Create a new bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_set_get_remove_and_clear() {
        let store = InMemoryKeyValueStore::new();
        assert!(store.is_empty().unwrap());

        store.set_item("a", "1").unwrap();
        store.set_item("b", "2").unwrap();
        assert_eq!(store.get_item("a").unwrap().as_deref(), Some("1"));
        assert_eq!(store.len().unwrap(), 2);

        // Overwrite keeps a single entry.
        store.set_item("a", "3").unwrap();
        assert_eq!(store.get_item("a").unwrap().as_deref(), Some("3"));
        assert_eq!(store.len().unwrap(), 2);

        store.remove_item("a").unwrap();
        assert!(store.get_item("a").unwrap().is_none());

        // Removing an absent key is not an error.
        store.remove_item("a").unwrap();
        store.remove_item("never-set").unwrap();

        store.clear().unwrap();
        assert!(store.is_empty().unwrap());
        store.clear().unwrap();
    }

    #[test]
    fn kv_with_entries_sorts_keys() {
        let store = InMemoryKeyValueStore::with_entries([("z", "1"), ("a", "2")]);
        assert_eq!(store.keys().unwrap(), vec!["a".to_string(), "z".to_string()]);
        assert!(store.contains_key("z").unwrap());
        assert!(!store.contains_key("m").unwrap());
    }

    #[test]
    fn buckets_open_list_delete() {
        let caches = InMemoryCacheBuckets::with_buckets(["youtuboxd-v1"]);
        caches.open("other-app").unwrap();
        caches.open("other-app").unwrap();

        assert_eq!(
            caches.keys().unwrap(),
            vec!["other-app".to_string(), "youtuboxd-v1".to_string()]
        );

        assert!(caches.delete("youtuboxd-v1").unwrap());
        assert!(!caches.delete("youtuboxd-v1").unwrap());
        assert!(!caches.has("youtuboxd-v1").unwrap());
        assert!(caches.has("other-app").unwrap());
    }
}

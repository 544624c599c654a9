//! Storage seams for the browser-owned stores.
//!
//! The traits describe the persistent store, the session store and the cache
//! buckets. `memory` provides thread-safe in-memory implementations.

pub mod memory;
mod traits;

pub use memory::{InMemoryCacheBuckets, InMemoryKeyValueStore, InMemoryStores};
pub use traits::{CacheBuckets, KeyValueStore, StorageError};

//! Detached cache-bucket sweeping.
//!
//! Deleting cache buckets is asynchronous in the browser and must never delay
//! the logout navigation. A `CacheSweeper` accepts a sweep request and returns
//! immediately; the deletion runs on its own task and reports on its own
//! channel. Whether the runtime has cache buckets at all is captured by
//! `CacheCapability`.

/// Sweep identifiers and reports.
pub mod report;
/// Report channel handle.
pub mod stream;
/// Threaded sweeper.
pub mod worker;

use std::sync::Arc;

use crate::config::SweepConfig;
use crate::error::AuthResult;
use crate::storage::CacheBuckets;

pub use report::{BucketFailure, SweepId, SweepReport};
pub use stream::SweepStream;
pub use worker::SweepWorker;

/// Starts bucket sweeps without waiting for them.
pub trait CacheSweeper {
    /// Schedule deletion of every bucket whose name contains `marker`.
    ///
    /// Must not wait for any deletion to finish. An error means the sweep was
    /// not scheduled.
    fn dispatch(&self, marker: &str) -> AuthResult<SweepId>;
}

/// Whether the runtime exposes named cache buckets.
#[derive(Default)]
pub enum CacheCapability {
    /// Buckets exist; sweeps go through this sweeper.
    Available(Box<dyn CacheSweeper>),
    /// No cache-bucket API; the sweep step is skipped.
    #[default]
    Absent,
}

impl CacheCapability {
    /// Wrap a sweeper.
    pub fn available(sweeper: impl CacheSweeper + 'static) -> Self {
        Self::Available(Box::new(sweeper))
    }

    /// Spawn a threaded sweeper over `buckets`, returning the capability and its report stream.
    pub fn threaded(cfg: SweepConfig, buckets: Arc<dyn CacheBuckets>) -> AuthResult<(Self, SweepStream)> {
        let worker = SweepWorker::spawn(cfg, buckets)?;
        let reports = worker.reports();
        Ok((Self::available(worker), reports))
    }

    /// Returns true if a sweeper is present.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

impl std::fmt::Debug for CacheCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available(_) => f.write_str("CacheCapability::Available"),
            Self::Absent => f.write_str("CacheCapability::Absent"),
        }
    }
}

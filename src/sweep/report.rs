//! Sweep identifiers and outcome reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::owns_bucket;

/// Unique identifier for one dispatched bucket sweep.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SweepId(Uuid);

impl SweepId {
    /// Create a new random sweep id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for SweepId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SweepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A bucket that matched the marker but could not be deleted.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketFailure {
    pub bucket: String,
    pub message: String,
}

/// Outcome of one detached sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Sweep this report belongs to.
    pub id: SweepId,
    /// Substring that selected the deleted buckets.
    pub marker: String,
    /// Buckets that were deleted.
    pub deleted: Vec<String>,
    /// Matching buckets that could not be deleted.
    pub failures: Vec<BucketFailure>,
    /// Set when the bucket names could not be listed at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enumeration_error: Option<String>,
    /// When the sweep finished.
    pub finished_at: DateTime<Utc>,
}

impl SweepReport {
    /// An empty report for a sweep that is starting now.
    #[must_use]
    pub fn begin(id: SweepId, marker: &str) -> Self {
        Self {
            id,
            marker: marker.to_string(),
            deleted: Vec::new(),
            failures: Vec::new(),
            enumeration_error: None,
            finished_at: Utc::now(),
        }
    }

    /// Bucket names, out of `names`, that this sweep must delete.
    pub fn targets(&self, names: impl IntoIterator<Item = String>) -> Vec<String> {
        names.into_iter().filter(|n| owns_bucket(&self.marker, n)).collect()
    }

    /// Record the outcome of deleting `bucket`.
    ///
    /// `Ok(false)` means the bucket was already gone, which is not a failure.
    pub fn record_delete(&mut self, bucket: String, outcome: Result<bool, String>) {
        match outcome {
            Ok(true) => self.deleted.push(bucket),
            Ok(false) => {}
            Err(message) => self.failures.push(BucketFailure { bucket, message }),
        }
    }

    /// Close the report after the bucket names could not be listed.
    #[must_use]
    pub fn enumeration_failed(mut self, message: String) -> Self {
        self.enumeration_error = Some(message);
        self.finish()
    }

    /// Stamp the completion time.
    #[must_use]
    pub fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }

    /// Returns true if every matching bucket was deleted.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.enumeration_error.is_none()
    }
}

//! Threaded cache sweep worker.
//!
//! Dispatch enqueues a sweep request on a bounded channel and returns at once.
//! A dedicated thread lists the buckets, deletes the matching ones and
//! publishes a `SweepReport`. Nothing on the dispatching side ever waits for
//! deletion to finish.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::{debug, warn};

use crate::config::SweepConfig;
use crate::error::{AuthError, AuthResult};
use crate::storage::CacheBuckets;

use super::report::{SweepId, SweepReport};
use super::stream::SweepStream;
use super::CacheSweeper;

#[derive(Debug)]
struct SweepJob {
    id: SweepId,
    marker: String,
}

/// Cache sweeper backed by a dedicated worker thread.
pub struct SweepWorker {
    cfg: SweepConfig,
    job_tx: Option<Sender<SweepJob>>,
    report_rx: Receiver<SweepReport>,
    dropped_reports: Arc<AtomicU64>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for SweepWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SweepWorker")
            .field("cfg", &self.cfg)
            .field("dropped_reports", &self.dropped_reports())
            .finish_non_exhaustive()
    }
}

impl SweepWorker {
    /// Spawn a worker that sweeps `buckets`.
    pub fn spawn(cfg: SweepConfig, buckets: Arc<dyn CacheBuckets>) -> AuthResult<Self> {
        let queue_capacity = cfg.queue_capacity.max(1);
        let report_capacity = cfg.report_capacity.max(1);

        let (job_tx, job_rx) = bounded::<SweepJob>(queue_capacity);
        let (report_tx, report_rx) = bounded::<SweepReport>(report_capacity);

        let dropped_reports = Arc::new(AtomicU64::new(0));
        let thread_dropped = Arc::clone(&dropped_reports);

        let join = thread::Builder::new()
            .name("youtuboxd-cache-sweep".to_string())
            .spawn(move || worker_loop(buckets.as_ref(), &job_rx, &report_tx, &thread_dropped))
            .map_err(|e| AuthError::WorkerSpawn {
                name: "cache sweep".to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            cfg,
            job_tx: Some(job_tx),
            report_rx,
            dropped_reports,
            join: Mutex::new(Some(join)),
        })
    }

    /// Spawn a worker with the default queue sizes.
    pub fn with_defaults(buckets: Arc<dyn CacheBuckets>) -> AuthResult<Self> {
        Self::spawn(SweepConfig::default(), buckets)
    }

    /// Handle on the report channel. Take it before handing the worker off.
    #[must_use]
    pub fn reports(&self) -> SweepStream {
        SweepStream::new(self.report_rx.clone())
    }

    /// Reports discarded because nobody drained the report channel.
    #[must_use]
    pub fn dropped_reports(&self) -> u64 {
        self.dropped_reports.load(Ordering::Relaxed)
    }

    /// Close the queue and wait for queued sweeps to finish.
    pub fn shutdown(mut self) {
        self.job_tx = None;
        let handle = self.join.lock().ok().and_then(|mut guard| guard.take());
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("cache sweep worker panicked");
            }
        }
    }
}

impl CacheSweeper for SweepWorker {
    fn dispatch(&self, marker: &str) -> AuthResult<SweepId> {
        let Some(tx) = self.job_tx.as_ref() else {
            return Err(AuthError::Disconnected {
                path: "sweep_queue".to_string(),
            });
        };

        let id = SweepId::new();
        let job = SweepJob {
            id,
            marker: marker.to_string(),
        };

        match tx.try_send(job) {
            Ok(()) => Ok(id),
            Err(TrySendError::Full(_)) => Err(AuthError::SweepQueueFull {
                capacity: self.cfg.queue_capacity.max(1),
            }),
            Err(TrySendError::Disconnected(_)) => Err(AuthError::Disconnected {
                path: "sweep_queue".to_string(),
            }),
        }
    }
}

impl Drop for SweepWorker {
    fn drop(&mut self) {
        // Closing the queue lets the worker drain and exit. Do not join: a bucket
        // backend that never returns must not hang the host.
        self.job_tx = None;
        if let Ok(mut guard) = self.join.lock() {
            drop(guard.take());
        }
    }
}

fn worker_loop(
    buckets: &dyn CacheBuckets,
    job_rx: &Receiver<SweepJob>,
    report_tx: &Sender<SweepReport>,
    dropped_reports: &AtomicU64,
) {
    while let Ok(SweepJob { id, marker }) = job_rx.recv() {
        let report = sweep_once(buckets, id, &marker);

        match report_tx.try_send(report) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                dropped_reports.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

/// Delete every bucket owned under `marker`.
///
/// Each deletion is independent: one failing bucket does not stop the rest.
pub(crate) fn sweep_once(buckets: &dyn CacheBuckets, id: SweepId, marker: &str) -> SweepReport {
    let mut report = SweepReport::begin(id, marker);

    let names = match buckets.keys() {
        Ok(names) => names,
        Err(err) => {
            warn!(sweep_id = %id, error = %err, "failed to list cache buckets");
            return report.enumeration_failed(err.to_string());
        }
    };

    for name in report.targets(names) {
        let outcome = buckets.delete(&name).map_err(|err| {
            warn!(sweep_id = %id, bucket = %name, error = %err, "failed to delete cache bucket");
            err.to_string()
        });
        if matches!(outcome, Ok(true)) {
            debug!(sweep_id = %id, bucket = %name, "deleted cache bucket");
        }
        report.record_delete(name, outcome);
    }

    report.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use crate::storage::{InMemoryCacheBuckets, StorageError};

    struct BrokenBuckets;

    impl CacheBuckets for BrokenBuckets {
        fn keys(&self) -> Result<Vec<String>, StorageError> {
            Err(StorageError::Unavailable("caches".to_string()))
        }

        fn delete(&self, _name: &str) -> Result<bool, StorageError> {
            Err(StorageError::Unavailable("caches".to_string()))
        }
    }

    struct StubbornBuckets {
        inner: InMemoryCacheBuckets,
        stubborn: &'static str,
    }

    impl CacheBuckets for StubbornBuckets {
        fn keys(&self) -> Result<Vec<String>, StorageError> {
            self.inner.keys()
        }

        fn delete(&self, name: &str) -> Result<bool, StorageError> {
            if name == self.stubborn {
                return Err(StorageError::BackendError("bucket in use".to_string()));
            }
            self.inner.delete(name)
        }
    }

    #[test]
    fn sweep_once_deletes_only_matching_buckets() {
        let buckets = InMemoryCacheBuckets::with_buckets(["youtuboxd-v1", "other-app", "youtuboxd-static"]);
        let report = sweep_once(&buckets, SweepId::new(), "youtuboxd");

        assert!(report.is_clean());
        assert_eq!(report.deleted, vec!["youtuboxd-static".to_string(), "youtuboxd-v1".to_string()]);
        assert_eq!(buckets.keys().unwrap(), vec!["other-app".to_string()]);
    }

    #[test]
    fn sweep_once_continues_past_failed_bucket() {
        let buckets = StubbornBuckets {
            inner: InMemoryCacheBuckets::with_buckets(["youtuboxd-a", "youtuboxd-b", "youtuboxd-c"]),
            stubborn: "youtuboxd-b",
        };
        let report = sweep_once(&buckets, SweepId::new(), "youtuboxd");

        assert!(!report.is_clean());
        assert_eq!(report.deleted, vec!["youtuboxd-a".to_string(), "youtuboxd-c".to_string()]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].bucket, "youtuboxd-b");
    }

    #[test]
    fn sweep_once_records_enumeration_failure() {
        let report = sweep_once(&BrokenBuckets, SweepId::new(), "youtuboxd");
        assert!(report.deleted.is_empty());
        assert!(report.enumeration_error.as_deref().unwrap().contains("caches"));
    }

    #[test]
    fn worker_publishes_report_for_dispatched_sweep() {
        let buckets = Arc::new(InMemoryCacheBuckets::with_buckets(["youtuboxd-v1", "other-app"]));
        let worker = SweepWorker::with_defaults(buckets.clone()).unwrap();
        let reports = worker.reports();

        let id = worker.dispatch("youtuboxd").unwrap();
        let report = reports.recv_timeout(Duration::from_secs(5)).unwrap();

        assert_eq!(report.id, id);
        assert_eq!(report.marker, "youtuboxd");
        assert_eq!(report.deleted, vec!["youtuboxd-v1".to_string()]);
        assert!(!buckets.has("youtuboxd-v1").unwrap());
        assert!(buckets.has("other-app").unwrap());
    }

    #[test]
    fn undrained_reports_are_counted_as_dropped() {
        let buckets = Arc::new(InMemoryCacheBuckets::new());
        let cfg = SweepConfig {
            queue_capacity: 8,
            report_capacity: 1,
        };
        let worker = SweepWorker::spawn(cfg, buckets).unwrap();
        let reports = worker.reports();

        for _ in 0..3 {
            worker.dispatch("youtuboxd").unwrap();
        }

        // Wait until the worker has processed all three jobs.
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while worker.dropped_reports() < 2 && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }

        assert_eq!(worker.dropped_reports(), 2);
        assert!(reports.try_recv().unwrap().is_some());
        assert!(reports.try_recv().unwrap().is_none());
    }

    #[test]
    fn shutdown_drains_queue_then_disconnects_reports() {
        let buckets = Arc::new(InMemoryCacheBuckets::with_buckets(["youtuboxd-v1"]));
        let worker = SweepWorker::with_defaults(buckets.clone()).unwrap();
        let reports = worker.reports();

        worker.dispatch("youtuboxd").unwrap();
        worker.shutdown();

        assert!(!buckets.has("youtuboxd-v1").unwrap());
        assert!(reports.try_recv().unwrap().is_some());
        assert!(matches!(reports.recv(), Err(AuthError::Disconnected { .. })));
    }
}

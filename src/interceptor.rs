//! Logout interception.
//!
//! `LogoutInterceptor::initialize` runs once after the document has loaded and
//! looks for the logout anchor. Clicking it clears the persistent keys, the
//! session store and (when available) the application's cache buckets, then
//! follows the anchor.
//!
//! Every clearing step is isolated. A failing store is logged and recorded in
//! the `ClearReport`; it never blocks the other steps or the navigation. The
//! cache sweep is only dispatched here, never awaited.

use std::rc::Rc;

use tracing::{info, warn};

use crate::config::LogoutConfig;
use crate::dom::{Anchor, ClickEvent, Document, Navigator};
use crate::error::AuthResult;
use crate::storage::KeyValueStore;
use crate::sweep::{CacheCapability, CacheSweeper, SweepId};

/// What happened to the cache-bucket step of a clear pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepDispatch {
    /// A detached sweep was started.
    Scheduled(SweepId),
    /// The runtime has no cache buckets.
    Skipped,
    /// The sweeper refused the request; see the report's failures.
    Failed,
}

/// The clearing step a failure belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearStep {
    /// Removing one persistent key.
    PersistentKey(String),
    /// Clearing the session store.
    Session,
    /// Dispatching the cache sweep.
    CacheSweep,
}

/// A clearing step that failed.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearFailure {
    pub step: ClearStep,
    pub message: String,
}

/// Outcome of `clear_client_storage`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearReport {
    /// Always true once the pass ran; logout proceeds regardless of failures.
    pub success: bool,
    /// Persistent keys removed (or already absent).
    pub removed_keys: Vec<String>,
    /// Whether the session store was emptied.
    pub session_cleared: bool,
    /// Cache-bucket step outcome.
    pub sweep: SweepDispatch,
    /// Steps that failed, in execution order.
    pub failures: Vec<ClearFailure>,
}

impl ClearReport {
    /// Returns true if no step failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Clears the application's client-side state on logout.
pub struct LogoutInterceptor {
    config: LogoutConfig,
    persistent: Rc<dyn KeyValueStore>,
    session: Rc<dyn KeyValueStore>,
    caches: CacheCapability,
}

impl std::fmt::Debug for LogoutInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogoutInterceptor")
            .field("config", &self.config)
            .field("caches", &self.caches)
            .finish_non_exhaustive()
    }
}

impl LogoutInterceptor {
    /// Build an interceptor over the given stores.
    pub fn new(
        config: LogoutConfig,
        persistent: Rc<dyn KeyValueStore>,
        session: Rc<dyn KeyValueStore>,
        caches: CacheCapability,
    ) -> Self {
        Self {
            config,
            persistent,
            session,
            caches,
        }
    }

    /// Build an interceptor with the YouTuBoxd defaults.
    pub fn with_defaults(
        persistent: Rc<dyn KeyValueStore>,
        session: Rc<dyn KeyValueStore>,
        caches: CacheCapability,
    ) -> Self {
        Self::new(LogoutConfig::default(), persistent, session, caches)
    }

    /// The configuration this interceptor clears with.
    #[must_use]
    pub const fn config(&self) -> &LogoutConfig {
        &self.config
    }

    /// Remove the application's keys, empty the session store and dispatch the
    /// cache sweep.
    ///
    /// Returns synchronously; the sweep may still be running.
    pub fn clear_client_storage(&self) -> ClearReport {
        let mut failures = Vec::new();
        let mut removed_keys = Vec::with_capacity(self.config.persistent_keys.len());

        for key in &self.config.persistent_keys {
            match self.persistent.remove_item(key) {
                Ok(()) => removed_keys.push(key.clone()),
                Err(err) => {
                    warn!(key = %key, error = %err, "failed to remove persistent storage key");
                    failures.push(ClearFailure {
                        step: ClearStep::PersistentKey(key.clone()),
                        message: err.to_string(),
                    });
                }
            }
        }

        let session_cleared = match self.session.clear() {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "failed to clear session storage");
                failures.push(ClearFailure {
                    step: ClearStep::Session,
                    message: err.to_string(),
                });
                false
            }
        };

        let sweep = match &self.caches {
            CacheCapability::Absent => SweepDispatch::Skipped,
            CacheCapability::Available(sweeper) => match sweeper.dispatch(&self.config.bucket_marker) {
                Ok(id) => SweepDispatch::Scheduled(id),
                Err(err) => {
                    warn!(marker = %self.config.bucket_marker, error = %err, "failed to dispatch cache sweep");
                    failures.push(ClearFailure {
                        step: ClearStep::CacheSweep,
                        message: err.to_string(),
                    });
                    SweepDispatch::Failed
                }
            },
        };

        info!(
            removed_keys = removed_keys.len(),
            session_cleared,
            sweep = ?sweep,
            failures = failures.len(),
            "Client storage cleared during logout"
        );

        ClearReport {
            success: true,
            removed_keys,
            session_cleared,
            sweep,
            failures,
        }
    }

    /// Locate the logout anchor in a loaded document.
    ///
    /// Call once per page load. Returns `None` when the page has no logout
    /// anchor; that is not an error.
    pub fn initialize(
        interceptor: &Rc<Self>,
        document: &dyn Document,
        navigator: Rc<dyn Navigator>,
    ) -> Option<LogoutHandler> {
        let anchor = document.find_anchor(&interceptor.config.logout_path)?;
        Some(LogoutHandler {
            interceptor: Rc::clone(interceptor),
            anchor,
            navigator,
        })
    }
}

/// Click handler bound to the logout anchor.
pub struct LogoutHandler {
    interceptor: Rc<LogoutInterceptor>,
    anchor: Anchor,
    navigator: Rc<dyn Navigator>,
}

impl std::fmt::Debug for LogoutHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogoutHandler")
            .field("anchor", &self.anchor)
            .finish_non_exhaustive()
    }
}

impl LogoutHandler {
    /// Where the handler navigates after clearing.
    #[must_use]
    pub fn href(&self) -> &str {
        &self.anchor.href
    }

    /// The anchor this handler is bound to.
    #[must_use]
    pub const fn anchor(&self) -> &Anchor {
        &self.anchor
    }

    /// Handle activation of the logout anchor.
    ///
    /// Suppresses the default navigation, clears client storage, then navigates
    /// to the anchor's href. Storage failures never stop the navigation; only a
    /// navigation failure is returned as an error.
    pub fn on_click(&self, event: &mut ClickEvent) -> AuthResult<ClearReport> {
        event.prevent_default();

        let report = self.interceptor.clear_client_storage();

        self.navigator.navigate(&self.anchor.href).map_err(|err| {
            warn!(href = %self.anchor.href, error = %err, "logout navigation failed");
            err
        })?;

        Ok(report)
    }
}

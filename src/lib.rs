//! # youtuboxd-auth - client-side logout for YouTuBoxd
//!
//! Logging out must not leave the previous user's data in the browser. This
//! crate intercepts the logout link, clears the application's client-side
//! state, then hands off to the server's logout endpoint.
//!
//! ## Core Concepts
//!
//! - **Persistent store**: `localStorage`; only the application's keys are removed
//! - **Session store**: `sessionStorage`; cleared in full
//! - **Cache buckets**: `CacheStorage`; buckets whose name contains the marker
//!   are deleted by a detached sweep that never delays navigation
//! - **LogoutInterceptor**: finds the logout anchor and runs the clear pass on click
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::rc::Rc;
//! use youtuboxd_auth::{CacheCapability, ClickEvent, InMemoryDocument, InMemoryKeyValueStore};
//! use youtuboxd_auth::{LogoutInterceptor, RecordingNavigator};
//!
//! let interceptor = Rc::new(LogoutInterceptor::with_defaults(
//!     Rc::new(InMemoryKeyValueStore::new()),
//!     Rc::new(InMemoryKeyValueStore::new()),
//!     CacheCapability::Absent,
//! ));
//!
//! let page = InMemoryDocument::new("https://youtuboxd.example").with_link("/logout/");
//! let nav = Rc::new(RecordingNavigator::new());
//! if let Some(handler) = LogoutInterceptor::initialize(&interceptor, &page, nav) {
//!     handler.on_click(&mut ClickEvent::new())?;
//! }
//! ```
//!
//! In a browser, enable the `web` feature and call `web::install` (or
//! `installLogoutInterceptor` from JS) after the document has loaded.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod diagnostics;
pub mod dom;
pub mod error;
pub mod interceptor;
pub mod storage;
pub mod sweep;

#[cfg(feature = "web")]
pub mod web;

// Re-export primary types at crate root for convenience
pub use config::{LogoutConfig, SweepConfig};
pub use dom::{Anchor, ClickEvent, Document, InMemoryDocument, Navigator, RecordingNavigator};
pub use error::{AuthError, AuthResult, ConfigError};
pub use interceptor::{ClearFailure, ClearReport, ClearStep, LogoutHandler, LogoutInterceptor, SweepDispatch};
pub use storage::{CacheBuckets, InMemoryCacheBuckets, InMemoryKeyValueStore, InMemoryStores, KeyValueStore, StorageError};
pub use sweep::{CacheCapability, CacheSweeper, SweepId, SweepReport, SweepStream, SweepWorker};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Error types for the logout helper.
//!
//! Errors are strongly typed using thiserror. None of them are fatal to a
//! logout: the interceptor downgrades every failure to a diagnostic and still
//! navigates.

use thiserror::Error;

use crate::storage::StorageError;

/// Configuration errors raised while building or parsing a `LogoutConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Logout path cannot be empty")]
    EmptyLogoutPath,

    #[error("Cache bucket marker cannot be empty")]
    EmptyBucketMarker,

    #[error("Persistent storage key at index {index} is empty")]
    EmptyStorageKey {
        index: usize,
    },

    #[error("Failed to parse config: {message}")]
    Parse {
        message: String,
    },
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            message: err.to_string(),
        }
    }
}

/// Top-level error type for the crate.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cache sweep queue is full (capacity {capacity})")]
    SweepQueueFull {
        capacity: usize,
    },

    #[error("Channel disconnected: {path}")]
    Disconnected {
        path: String,
    },

    #[error("Operation timed out after {duration_ms}ms")]
    Timeout {
        duration_ms: u64,
    },

    #[error("Failed to spawn {name} worker: {message}")]
    WorkerSpawn {
        name: String,
        message: String,
    },

    #[error("DOM error: {message}")]
    Dom {
        message: String,
    },

    #[error("Navigation failed: {message}")]
    Navigation {
        message: String,
    },
}

impl AuthError {
    /// Creates a navigation error.
    #[must_use]
    pub fn navigation(message: impl Into<String>) -> Self {
        Self::Navigation {
            message: message.into(),
        }
    }

    /// Returns true if this is a storage error.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Result type alias for crate operations.
pub type AuthResult<T> = Result<T, AuthError>;

//! Configuration for the logout interceptor and the cache sweep worker.
//!
//! Defaults match the YouTuBoxd deployment. Hosts can override any field with
//! a partial JSON document; missing fields fall back to the defaults.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Href of the logout anchor.
pub const DEFAULT_LOGOUT_PATH: &str = "/logout/";

/// Substring identifying cache buckets owned by the application.
pub const DEFAULT_BUCKET_MARKER: &str = "youtuboxd";

/// Persistent-store keys holding cached user data, the video list and the tag list.
pub const DEFAULT_PERSISTENT_KEYS: [&str; 3] = ["youtuboxd_user_data", "youtuboxd_videos", "youtuboxd_tags"];

/// What to clear on logout and where the logout control points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogoutConfig {
    /// Exact href of the anchor to intercept.
    pub logout_path: String,
    /// Keys removed from the persistent store.
    pub persistent_keys: Vec<String>,
    /// Buckets whose name contains this substring are deleted.
    pub bucket_marker: String,
}

impl Default for LogoutConfig {
    fn default() -> Self {
        Self {
            logout_path: DEFAULT_LOGOUT_PATH.to_string(),
            persistent_keys: DEFAULT_PERSISTENT_KEYS.iter().map(|k| (*k).to_string()).collect(),
            bucket_marker: DEFAULT_BUCKET_MARKER.to_string(),
        }
    }
}

impl LogoutConfig {
    /// Parse a JSON document and validate the result.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject configurations that could never match or would clear nothing meaningful.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.logout_path.trim().is_empty() {
            return Err(ConfigError::EmptyLogoutPath);
        }
        // An empty marker would match every bucket, including other apps' on the same origin.
        if self.bucket_marker.is_empty() {
            return Err(ConfigError::EmptyBucketMarker);
        }
        if let Some(index) = self.persistent_keys.iter().position(|k| k.is_empty()) {
            return Err(ConfigError::EmptyStorageKey { index });
        }
        Ok(())
    }
}

/// Bucket ownership rule shared by every sweeper: case-sensitive substring match.
#[must_use]
pub fn owns_bucket(marker: &str, name: &str) -> bool {
    name.contains(marker)
}

/// Queue sizes for the detached sweep worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Max queued sweep requests before dispatch fails.
    pub queue_capacity: usize,
    /// Max undrained sweep reports before new ones are dropped.
    pub report_capacity: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 16,
            report_capacity: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_targets_youtuboxd() {
        let cfg = LogoutConfig::default();
        assert_eq!(cfg.logout_path, "/logout/");
        assert_eq!(
            cfg.persistent_keys,
            vec!["youtuboxd_user_data", "youtuboxd_videos", "youtuboxd_tags"]
        );
        assert_eq!(cfg.bucket_marker, "youtuboxd");
        cfg.validate().unwrap();
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = LogoutConfig::from_json(r#"{"logout_path": "/accounts/logout/"}"#).unwrap();
        assert_eq!(cfg.logout_path, "/accounts/logout/");
        assert_eq!(cfg.bucket_marker, DEFAULT_BUCKET_MARKER);
        assert_eq!(cfg.persistent_keys.len(), 3);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        assert!(matches!(
            LogoutConfig::from_json(r#"{"logout_path": "  "}"#),
            Err(ConfigError::EmptyLogoutPath)
        ));
        assert!(matches!(
            LogoutConfig::from_json(r#"{"bucket_marker": ""}"#),
            Err(ConfigError::EmptyBucketMarker)
        ));
        assert!(matches!(
            LogoutConfig::from_json(r#"{"persistent_keys": ["a", ""]}"#),
            Err(ConfigError::EmptyStorageKey { index: 1 })
        ));
        assert!(matches!(
            LogoutConfig::from_json("[1, 2]"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn bucket_ownership_is_substring_match() {
        let marker = LogoutConfig::default().bucket_marker;
        assert!(owns_bucket(&marker, "youtuboxd-v1"));
        assert!(owns_bucket(&marker, "static-youtuboxd"));
        assert!(!owns_bucket(&marker, "other-app"));
        assert!(!owns_bucket(&marker, "YouTuBoxd"));
    }

    #[test]
    fn sweep_config_defaults_and_overrides() {
        let cfg: SweepConfig = serde_json::from_str(r#"{"queue_capacity": 2}"#).unwrap();
        assert_eq!(cfg.queue_capacity, 2);
        assert_eq!(cfg.report_capacity, SweepConfig::default().report_capacity);
    }
}

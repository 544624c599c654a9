//! In-memory document and navigator.

use std::sync::Mutex;

use crate::error::{AuthError, AuthResult};

use super::{Anchor, Document, Navigator};

/// A fixed set of anchors resolved against a base origin.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocument {
    origin: String,
    anchors: Vec<Anchor>,
}

impl InMemoryDocument {
    /// Empty document served from `origin` (e.g. `https://youtuboxd.example`).
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into().trim_end_matches('/').to_string(),
            anchors: Vec::new(),
        }
    }

    /// Add an anchor with the given `href` attribute.
    #[must_use]
    pub fn with_link(mut self, href_attr: impl Into<String>) -> Self {
        let href_attr = href_attr.into();
        let href = self.resolve(&href_attr);
        self.anchors.push(Anchor { href_attr, href });
        self
    }

    /// Anchors in document order.
    #[must_use]
    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    fn resolve(&self, href_attr: &str) -> String {
        if href_attr.starts_with('/') {
            format!("{}{href_attr}", self.origin)
        } else {
            href_attr.to_string()
        }
    }
}

impl Document for InMemoryDocument {
    fn find_anchor(&self, href_attr: &str) -> Option<Anchor> {
        self.anchors.iter().find(|a| a.href_attr == href_attr).cloned()
    }
}

/// Navigator that records every location it was asked to visit.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    /// A navigator that has not visited anything yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locations visited so far, oldest first.
    #[must_use]
    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().map(|v| v.clone()).unwrap_or_default()
    }

    /// The most recent location, if any.
    #[must_use]
    pub fn current(&self) -> Option<String> {
        self.visits.lock().ok().and_then(|v| v.last().cloned())
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, href: &str) -> AuthResult<()> {
        let mut visits = self
            .visits
            .lock()
            .map_err(|_| AuthError::navigation("poisoned navigator lock"))?;
        visits.push(href.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_anchor_matches_attribute_exactly() {
        let doc = InMemoryDocument::new("https://youtuboxd.example/")
            .with_link("/")
            .with_link("/logout/")
            .with_link("/logout");

        let anchor = doc.find_anchor("/logout/").unwrap();
        assert_eq!(anchor.href, "https://youtuboxd.example/logout/");

        assert!(doc.find_anchor("/logout/?next=/").is_none());
        assert_eq!(doc.find_anchor("/logout").unwrap().href_attr, "/logout");
    }

    #[test]
    fn absolute_links_are_kept_verbatim() {
        let doc = InMemoryDocument::new("https://youtuboxd.example").with_link("https://accounts.example/logout/");
        assert_eq!(doc.anchors()[0].href, "https://accounts.example/logout/");
    }

    #[test]
    fn recording_navigator_tracks_visits() {
        let nav = RecordingNavigator::new();
        assert!(nav.current().is_none());
        nav.navigate("/a").unwrap();
        nav.navigate("/b").unwrap();
        assert_eq!(nav.visits(), vec!["/a".to_string(), "/b".to_string()]);
        assert_eq!(nav.current().as_deref(), Some("/b"));
    }
}

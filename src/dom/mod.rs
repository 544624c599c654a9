//! Document, click and navigation seams.
//!
//! The interceptor only needs three things from a page: find the anchor with a
//! given href, observe a click on it, and change the location. `memory`
//! provides a static document and a recording navigator for native hosts and
//! tests.

pub mod memory;

use crate::error::AuthResult;

pub use memory::{InMemoryDocument, RecordingNavigator};

/// A hyperlink located in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    /// The `href` attribute as written in the markup.
    pub href_attr: String,
    /// The resolved URL the browser would follow.
    pub href: String,
}

/// Read access to a loaded document.
pub trait Document {
    /// First anchor whose `href` attribute equals `href_attr` exactly.
    fn find_anchor(&self, href_attr: &str) -> Option<Anchor>;
}

/// CSS selector matching an `a` element whose `href` attribute equals `href_attr`.
///
/// The value is quoted, so only `"` and `\` need escaping.
#[must_use]
pub fn anchor_selector(href_attr: &str) -> String {
    let mut escaped = String::with_capacity(href_attr.len());
    for c in href_attr.chars() {
        if matches!(c, '"' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    format!("a[href=\"{escaped}\"]")
}

/// Changes the current location.
pub trait Navigator {
    /// Navigate to `href`. Once this returns `Ok`, navigation is not cancellable.
    fn navigate(&self, href: &str) -> AuthResult<()>;
}

/// Activation of an anchor.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClickEvent {
    default_prevented: bool,
}

impl ClickEvent {
    /// A fresh click whose default action is still pending.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            default_prevented: false,
        }
    }

    /// Suppress the browser's own navigation for this click.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Returns true once `prevent_default` has been called.
    #[must_use]
    pub const fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_quotes_plain_paths() {
        assert_eq!(anchor_selector("/logout/"), r#"a[href="/logout/"]"#);
    }

    #[test]
    fn selector_escapes_quotes_and_backslashes() {
        assert_eq!(anchor_selector(r#"/out"x"#), r#"a[href="/out\"x"]"#);
        assert_eq!(anchor_selector(r"/a\b"), r#"a[href="/a\\b"]"#);
    }

    #[test]
    fn click_event_starts_with_default_pending() {
        let mut click = ClickEvent::new();
        assert!(!click.is_default_prevented());
        click.prevent_default();
        assert!(click.is_default_prevented());
    }
}

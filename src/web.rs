//! Browser bindings over `web-sys`.
//!
//! ## Stores
//!
//! - `WebStorage` wraps `localStorage` / `sessionStorage`. A store the page
//!   cannot reach (privacy mode, sandboxed iframe) fails every operation with
//!   `StorageError::Unavailable` instead of failing installation.
//! - `WebCacheSweeper` wraps `CacheStorage` and sweeps on a `spawn_local`
//!   task. It only exists when `window.caches` is defined.
//!
//! ## Wiring
//!
//! The host calls `install` (or `installLogoutInterceptor` from JS) once the
//! document has loaded. The JS entry point also routes `tracing` output to the
//! browser console unless the page already installed a subscriber.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Reflect};
use tracing::{debug, info, warn, Level};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{CacheStorage, HtmlAnchorElement, Storage, Window};

use crate::config::LogoutConfig;
use crate::diagnostics::{self, ConsoleLevel};
use crate::dom::{anchor_selector, Anchor, ClickEvent, Document, Navigator};
use crate::error::{AuthError, AuthResult};
use crate::interceptor::LogoutInterceptor;
use crate::storage::{KeyValueStore, StorageError};
use crate::sweep::{CacheCapability, CacheSweeper, SweepId, SweepReport};

fn js_message(err: &JsValue) -> String {
    if let Some(s) = err.as_string() {
        return s;
    }
    if let Some(e) = err.dyn_ref::<js_sys::Error>() {
        return String::from(e.message());
    }
    format!("{err:?}")
}

fn storage_err(err: &JsValue) -> StorageError {
    if let Some(e) = err.dyn_ref::<js_sys::Error>() {
        if String::from(e.name()) == "QuotaExceededError" {
            return StorageError::QuotaExceeded(String::from(e.message()));
        }
    }
    StorageError::BackendError(js_message(err))
}

/// `localStorage` or `sessionStorage`.
#[derive(Debug, Clone)]
pub struct WebStorage {
    storage: Option<Storage>,
    name: &'static str,
}

impl WebStorage {
    /// The window's persistent store.
    #[must_use]
    pub fn local(window: &Window) -> Self {
        let storage = window.local_storage().ok().flatten();
        if storage.is_none() {
            warn!("localStorage is not available");
        }
        Self {
            storage,
            name: "localStorage",
        }
    }

    /// The window's session-scoped store.
    #[must_use]
    pub fn session(window: &Window) -> Self {
        let storage = window.session_storage().ok().flatten();
        if storage.is_none() {
            warn!("sessionStorage is not available");
        }
        Self {
            storage,
            name: "sessionStorage",
        }
    }

    fn inner(&self) -> Result<&Storage, StorageError> {
        self.storage
            .as_ref()
            .ok_or_else(|| StorageError::Unavailable(self.name.to_string()))
    }
}

impl KeyValueStore for WebStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner()?.get_item(key).map_err(|e| storage_err(&e))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner()?.set_item(key, value).map_err(|e| storage_err(&e))
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.inner()?.remove_item(key).map_err(|e| storage_err(&e))
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.inner()?.clear().map_err(|e| storage_err(&e))
    }

    fn len(&self) -> Result<usize, StorageError> {
        let n = self.inner()?.length().map_err(|e| storage_err(&e))?;
        Ok(n as usize)
    }
}

/// Sweeps `CacheStorage` on the page's event loop.
#[derive(Debug, Clone)]
pub struct WebCacheSweeper {
    caches: CacheStorage,
}

impl WebCacheSweeper {
    /// Returns `None` when the runtime has no `window.caches`
    /// (insecure origin, old browser).
    #[must_use]
    pub fn detect(window: &Window) -> Option<Self> {
        match Reflect::has(window.as_ref(), &JsValue::from_str("caches")) {
            Ok(true) => {}
            _ => return None,
        }
        window.caches().ok().map(|caches| Self { caches })
    }
}

impl CacheSweeper for WebCacheSweeper {
    fn dispatch(&self, marker: &str) -> AuthResult<SweepId> {
        let id = SweepId::new();
        let caches = self.caches.clone();
        let marker = marker.to_string();

        spawn_local(async move {
            let report = sweep_cache_storage(&caches, id, &marker).await;
            if report.is_clean() {
                debug!(sweep_id = %id, deleted = report.deleted.len(), "cache sweep finished");
            } else {
                warn!(
                    sweep_id = %id,
                    deleted = report.deleted.len(),
                    failures = report.failures.len(),
                    enumeration_error = ?report.enumeration_error,
                    "cache sweep finished with errors"
                );
            }
        });

        Ok(id)
    }
}

async fn sweep_cache_storage(caches: &CacheStorage, id: SweepId, marker: &str) -> SweepReport {
    let mut report = SweepReport::begin(id, marker);

    let names: Vec<String> = match JsFuture::from(caches.keys()).await {
        Ok(value) => Array::from(&value).iter().filter_map(|n| n.as_string()).collect(),
        Err(err) => return report.enumeration_failed(js_message(&err)),
    };

    for name in report.targets(names) {
        let outcome = JsFuture::from(caches.delete(&name))
            .await
            .map(|value| value.as_bool() == Some(true))
            .map_err(|err| js_message(&err));
        report.record_delete(name, outcome);
    }

    report.finish()
}

/// A live `web_sys::Document`.
///
/// `find_anchor` keeps the element it matched so the click listener can be
/// attached without querying the page again.
#[derive(Debug, Clone)]
pub struct WebDocument {
    document: web_sys::Document,
    matched: RefCell<Option<HtmlAnchorElement>>,
}

impl WebDocument {
    /// Wrap the page's document.
    #[must_use]
    pub fn new(document: web_sys::Document) -> Self {
        Self {
            document,
            matched: RefCell::new(None),
        }
    }

    /// The anchor element whose `href` attribute equals `href_attr`.
    pub fn anchor_element(&self, href_attr: &str) -> Option<HtmlAnchorElement> {
        let selector = anchor_selector(href_attr);
        match self.document.query_selector(&selector) {
            Ok(found) => found.and_then(|el| el.dyn_into::<HtmlAnchorElement>().ok()),
            Err(err) => {
                warn!(selector = %selector, error = %js_message(&err), "anchor query failed");
                None
            }
        }
    }
}

    /// Element matched by the last successful `find_anchor`.
    pub fn take_matched_element(&self) -> Option<HtmlAnchorElement> {
        self.matched.borrow_mut().take()
    }
}

impl Document for WebDocument {
    fn find_anchor(&self, href_attr: &str) -> Option<Anchor> {
        let element = self.anchor_element(href_attr)?;
        let anchor = Anchor {
            href_attr: href_attr.to_string(),
            href: element.href(),
        };
        *self.matched.borrow_mut() = Some(element);
        Some(anchor)
    }
}

/// Navigates by assigning `window.location.href`.
#[derive(Debug, Clone)]
pub struct WebNavigator {
    window: Window,
}

impl WebNavigator {
    /// Navigate through `window`'s location.
    #[must_use]
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl Navigator for WebNavigator {
    fn navigate(&self, href: &str) -> AuthResult<()> {
        self.window
            .location()
            .set_href(href)
            .map_err(|e| AuthError::navigation(js_message(&e)))
    }
}

/// Bind the logout interceptor to the page's logout anchor.
///
/// Returns `Ok(false)` when the page has no logout anchor.
pub fn install(window: &Window, document: &web_sys::Document, config: LogoutConfig) -> AuthResult<bool> {
    config.validate()?;

    let caches = WebCacheSweeper::detect(window).map_or(CacheCapability::Absent, CacheCapability::available);
    let logout_path = config.logout_path.clone();
    let interceptor = Rc::new(LogoutInterceptor::new(
        config,
        Rc::new(WebStorage::local(window)),
        Rc::new(WebStorage::session(window)),
        caches,
    ));

    let doc = WebDocument::new(document.clone());
    let navigator = Rc::new(WebNavigator::new(window.clone()));
    let Some(handler) = LogoutInterceptor::initialize(&interceptor, &doc, navigator) else {
        debug!(path = %logout_path, "no logout anchor on this page");
        return Ok(false);
    };
    let Some(element) = doc.take_matched_element() else {
        warn!(path = %logout_path, "logout anchor matched but its element was not retained");
        return Ok(false);
    };

    let href = handler.href().to_string();
    let on_click = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
        let mut click = ClickEvent::new();
        match handler.on_click(&mut click) {
            Ok(_) => {
                if click.is_default_prevented() {
                    event.prevent_default();
                }
            }
            // Leave the default action alone so the browser still follows the link.
            Err(err) => warn!(error = %err, "falling back to default logout navigation"),
        }
    });

    element
        .add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())
        .map_err(|e| AuthError::Dom {
            message: js_message(&e),
        })?;
    // The listener lives as long as the page.
    on_click.forget();

    info!(href = %href, "logout interceptor installed");
    Ok(true)
}

fn console_sink(level: ConsoleLevel, line: &str) {
    let line = JsValue::from_str(line);
    match level {
        ConsoleLevel::Debug => web_sys::console::debug_1(&line),
        ConsoleLevel::Log => web_sys::console::log_1(&line),
        ConsoleLevel::Warn => web_sys::console::warn_1(&line),
        ConsoleLevel::Error => web_sys::console::error_1(&line),
    }
}

/// JS entry point: install with the default configuration.
///
/// Routes `tracing` output at INFO and above to the browser console the first
/// time it runs, unless a subscriber is already set.
#[wasm_bindgen(js_name = installLogoutInterceptor)]
pub fn install_logout_interceptor() -> Result<bool, JsValue> {
    diagnostics::try_init_console(console_sink, Level::INFO);
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("window has no document"))?;
    install(&window, &document, LogoutConfig::default()).map_err(|e| JsValue::from_str(&e.to_string()))
}

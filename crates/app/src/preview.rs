//! Temporary preview references for selected files.
//!
//! A [`PreviewStore`] hands out opaque URLs that a renderer can use to show
//! a selected file. [`PreviewHandle`] owns one such URL and revokes it when
//! dropped, so a picker only has to drop its old handle to release it.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use syncavatar_core::media::MediaFile;
use uuid::Uuid;

/// URL scheme used by [`ObjectUrlRegistry`].
pub const OBJECT_URL_PREFIX: &str = "blob:syncavatar/";

/// Creates and revokes preview references.
pub trait PreviewStore: Send + Sync {
    /// Register `file` and return a URL that resolves to it.
    fn create(&self, file: &MediaFile) -> String;

    /// Release a URL previously returned by [`create`](Self::create).
    /// Unknown URLs are ignored.
    fn revoke(&self, url: &str);
}

/// In-memory registry mapping `blob:` URLs to local paths.
#[derive(Debug, Default)]
pub struct ObjectUrlRegistry {
    entries: Mutex<HashMap<String, PathBuf>>,
    created: AtomicU64,
    revoked: AtomicU64,
}

impl ObjectUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path behind a live URL.
    pub fn resolve(&self, url: &str) -> Option<PathBuf> {
        self.lock().get(url).cloned()
    }

    /// Number of URLs currently registered.
    pub fn live_count(&self) -> usize {
        self.lock().len()
    }

    /// Total URLs ever created.
    pub fn created_count(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }

    /// Total URLs revoked.
    pub fn revoked_count(&self) -> u64 {
        self.revoked.load(Ordering::Relaxed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, PathBuf>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl PreviewStore for ObjectUrlRegistry {
    fn create(&self, file: &MediaFile) -> String {
        let url = format!("{OBJECT_URL_PREFIX}{}", Uuid::new_v4());
        self.lock().insert(url.clone(), file.path.clone());
        self.created.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(url = %url, file = %file.file_name, "Preview created");
        url
    }

    fn revoke(&self, url: &str) {
        if self.lock().remove(url).is_some() {
            self.revoked.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(url, "Preview revoked");
        }
    }
}

/// Owned preview URL, revoked on drop.
pub struct PreviewHandle {
    url: String,
    store: Arc<dyn PreviewStore>,
}

impl PreviewHandle {
    pub fn acquire(store: &Arc<dyn PreviewStore>, file: &MediaFile) -> Self {
        Self {
            url: store.create(file),
            store: Arc::clone(store),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewHandle").field("url", &self.url).finish()
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.store.revoke(&self.url);
    }
}

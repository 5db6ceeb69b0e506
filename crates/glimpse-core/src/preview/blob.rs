//! Revocable in-memory object URLs.

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BlobError {
    #[error("blob URL {0} is not live (already revoked or never created)")]
    NotLive(String),

    #[error("blob store unavailable: {0}")]
    Unavailable(String),
}

/// Host store of object URLs, e.g. `URL.createObjectURL`.
pub trait BlobStore: Send + Sync + std::fmt::Debug {
    fn create(&self, content: &str, mime: &str) -> Result<String, BlobError>;

    fn revoke(&self, url: &str) -> Result<(), BlobError>;
}

#[derive(Debug, Clone)]
struct Blob {
    content: String,
    mime: String,
}

#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<FxHashMap<String, Blob>>,
    next_id: AtomicU64,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<(String, String)> {
        self.blobs
            .read()
            .get(url)
            .map(|blob| (blob.content.clone(), blob.mime.clone()))
    }

    pub fn live_count(&self) -> usize {
        self.blobs.read().len()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn create(&self, content: &str, mime: &str) -> Result<String, BlobError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let url = format!("blob:glimpse/{id}");
        self.blobs.write().insert(
            url.clone(),
            Blob {
                content: content.to_string(),
                mime: mime.to_string(),
            },
        );
        Ok(url)
    }

    fn revoke(&self, url: &str) -> Result<(), BlobError> {
        self.blobs
            .write()
            .remove(url)
            .map(|_| ())
            .ok_or_else(|| BlobError::NotLive(url.to_string()))
    }
}

/// Object URLs owned by one component.
///
/// URLs are revoked before being replaced and on teardown. Revoke errors
/// are logged and never interrupt a cleanup loop.
#[derive(Debug)]
pub struct BlobTracker {
    store: Arc<dyn BlobStore>,
    owned: Mutex<Vec<String>>,
}

impl BlobTracker {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self {
            store,
            owned: Mutex::new(Vec::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }

    /// Revoke everything owned, then create and own a new URL.
    pub fn replace(&self, content: &str, mime: &str) -> Result<String, BlobError> {
        self.revoke_all();
        let url = self.store.create(content, mime)?;
        self.owned.lock().push(url.clone());
        Ok(url)
    }

    pub fn current(&self) -> Option<String> {
        self.owned.lock().last().cloned()
    }

    /// Revoke one URL. Failure is logged; returns whether it succeeded.
    pub fn revoke(&self, url: &str) -> bool {
        self.owned.lock().retain(|owned| owned != url);
        match self.store.revoke(url) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(url, error = %err, "blob revoke failed");
                false
            }
        }
    }

    /// Revoke every owned URL. Returns how many revoked cleanly.
    pub fn revoke_all(&self) -> usize {
        let urls = std::mem::take(&mut *self.owned.lock());
        let mut revoked = 0;
        for url in &urls {
            match self.store.revoke(url) {
                Ok(()) => revoked += 1,
                Err(err) => tracing::warn!(url = %url, error = %err, "blob revoke failed"),
            }
        }
        revoked
    }

    pub fn len(&self) -> usize {
        self.owned.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.owned.lock().is_empty()
    }
}

impl Drop for BlobTracker {
    fn drop(&mut self) {
        self.revoke_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_revoke() {
        let store = InMemoryBlobStore::new();
        let url = store.create("<p>x</p>", "text/html").unwrap();
        assert_eq!(store.get(&url).unwrap().1, "text/html");
        store.revoke(&url).unwrap();
        assert_eq!(store.revoke(&url), Err(BlobError::NotLive(url)));
    }

    #[test]
    fn test_double_revoke_does_not_raise() {
        let store: Arc<dyn BlobStore> = Arc::new(InMemoryBlobStore::new());
        let tracker = BlobTracker::new(Arc::clone(&store));
        let url = tracker.replace("a", "text/html").unwrap();

        assert!(tracker.revoke(&url));
        assert!(!tracker.revoke(&url));
        assert_eq!(tracker.revoke_all(), 0);
    }

    #[test]
    fn test_replace_revokes_previous() {
        let store = Arc::new(InMemoryBlobStore::new());
        let tracker = BlobTracker::new(store.clone());
        let first = tracker.replace("a", "text/html").unwrap();
        let second = tracker.replace("b", "text/html").unwrap();

        assert!(store.get(&first).is_none());
        assert_eq!(store.get(&second).unwrap().0, "b");
        assert_eq!(tracker.current(), Some(second));
        assert_eq!(store.live_count(), 1);
    }

    #[test]
    fn test_cleanup_continues_past_failures() {
        let store = Arc::new(InMemoryBlobStore::new());
        let tracker = BlobTracker::new(store.clone());
        let url = tracker.replace("a", "text/html").unwrap();
        // Revoked behind the tracker's back
        store.revoke(&url).unwrap();
        tracker.owned.lock().push(store.create("b", "text/html").unwrap());

        assert_eq!(tracker.revoke_all(), 1);
        assert_eq!(store.live_count(), 0);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_drop_revokes_owned_urls() {
        let store = Arc::new(InMemoryBlobStore::new());
        {
            let tracker = BlobTracker::new(store.clone());
            tracker.replace("a", "text/html").unwrap();
        }
        assert_eq!(store.live_count(), 0);
    }
}

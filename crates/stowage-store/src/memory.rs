use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};
use crate::store::BlobStore;

/// In-memory [`BlobStore`].
///
/// Payloads live in a flat map keyed by the full key string, so the store is
/// ephemeral and forgets everything when dropped. It serves two purposes: a
/// last-resort backend when nothing durable is usable, and a test double for
/// exercising composites. Clones are cheap and share the same map and
/// availability flag, letting a test keep one handle for assertions while the
/// code under test owns another.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Rc<MemoryInner>,
}

struct MemoryInner {
    entries: RefCell<HashMap<String, Vec<u8>>>,
    available: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(MemoryInner {
                entries: RefCell::new(HashMap::new()),
                available: Cell::new(true),
            }),
        }
    }

    /// Set the availability the store will report from now on.
    ///
    /// An unavailable store rejects writes, reads nothing and deletes
    /// nothing, which is exactly the shape a dead backend presents through
    /// the contract. Tests use this to script outage windows.
    pub fn set_available(&self, available: bool) {
        self.inner.available.set(available);
    }

    /// Number of stored payloads.
    pub fn len(&self) -> usize {
        self.inner.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.borrow().is_empty()
    }

    /// Whether a payload is currently stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.entries.borrow().contains_key(key)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl BlobStore for MemoryStore {
    async fn is_available(&self) -> bool {
        self.inner.available.get()
    }

    async fn write(&self, key: &str, bytes: &[u8]) -> StoreResult<()> {
        if !self.inner.available.get() {
            return Err(StoreError::Unavailable);
        }
        self.inner
            .entries
            .borrow_mut()
            .insert(key.to_owned(), bytes.to_vec());
        Ok(())
    }

    async fn read(&self, key: &str) -> Option<Vec<u8>> {
        if !self.inner.available.get() {
            return None;
        }
        self.inner.entries.borrow().get(key).cloned()
    }

    async fn delete(&self, key: &str) {
        if !self.inner.available.get() {
            return;
        }
        self.inner.entries.borrow_mut().remove(key);
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn roundtrip_and_replace() {
        let store = MemoryStore::new();
        assert!(store.is_available().await);
        assert_eq!(store.read("drawings/a").await, None);

        store.write("drawings/a", b"first").await.unwrap();
        assert_eq!(store.read("drawings/a").await.as_deref(), Some(&b"first"[..]));

        store.write("drawings/a", b"second").await.unwrap();
        assert_eq!(
            store.read("drawings/a").await.as_deref(),
            Some(&b"second"[..])
        );
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn empty_payload_is_stored_not_absent() {
        let store = MemoryStore::new();
        store.write("empty", b"").await.unwrap();
        assert_eq!(store.read("empty").await, Some(Vec::new()));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryStore::new();
        store.write("k", b"v").await.unwrap();
        store.delete("k").await;
        assert_eq!(store.read("k").await, None);
        // Second delete of the same key is a silent no-op.
        store.delete("k").await;
        store.delete("never-written").await;
    }

    #[tokio::test]
    async fn unavailable_store_degrades_per_contract() {
        let store = MemoryStore::new();
        store.write("k", b"v").await.unwrap();
        store.set_available(false);

        assert!(!store.is_available().await);
        assert!(matches!(
            store.write("k", b"new").await,
            Err(StoreError::Unavailable)
        ));
        assert_eq!(store.read("k").await, None);
        store.delete("k").await;

        // The payload survives the outage untouched.
        store.set_available(true);
        assert_eq!(store.read("k").await.as_deref(), Some(&b"v"[..]));
    }

    #[tokio::test]
    async fn clones_share_state() {
        let store = MemoryStore::new();
        let observer = store.clone();
        store.write("shared", b"x").await.unwrap();
        assert!(observer.contains("shared"));
        observer.set_available(false);
        assert!(!store.is_available().await);
    }
}

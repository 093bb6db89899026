use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use common::ScopeKey;
use tokio::sync::broadcast;

use crate::{CartStorage, ChangeNotice, ContextId, Result, StorageError};

const NOTICE_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Default)]
struct SharedStorageState {
    entries: HashMap<ScopeKey, serde_json::Value>,
    fail_on_store: bool,
}

/// In-memory shared storage medium.
///
/// One `SharedStorage` stands in for the durable storage every open
/// execution context sees; each context attaches its own
/// [`StorageHandle`]. Writes through any handle are visible to reads
/// through every other handle, and broadcast a [`ChangeNotice`] carrying
/// the writing context's id.
#[derive(Clone)]
pub struct SharedStorage {
    state: Arc<RwLock<SharedStorageState>>,
    notices: broadcast::Sender<ChangeNotice>,
    next_context: Arc<AtomicU64>,
    quota_bytes: Option<usize>,
}

impl SharedStorage {
    /// Creates a new empty shared storage with no quota.
    pub fn new() -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(RwLock::new(SharedStorageState::default())),
            notices,
            next_context: Arc::new(AtomicU64::new(0)),
            quota_bytes: None,
        }
    }

    /// Creates a shared storage that rejects single writes above `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            quota_bytes: Some(bytes),
            ..Self::new()
        }
    }

    /// Attaches a new execution context to this storage.
    pub fn attach(&self) -> StorageHandle {
        let id = self.next_context.fetch_add(1, Ordering::Relaxed);
        StorageHandle {
            shared: self.clone(),
            context: ContextId::new(id),
        }
    }

    /// Configures every handle to fail its next store calls.
    pub fn set_fail_on_store(&self, fail: bool) {
        self.state.write().unwrap().fail_on_store = fail;
    }

    /// Returns the number of keys currently stored.
    pub fn key_count(&self) -> usize {
        self.state.read().unwrap().entries.len()
    }

    /// Returns true if a value exists under `key`.
    pub fn contains(&self, key: &ScopeKey) -> bool {
        self.state.read().unwrap().entries.contains_key(key)
    }
}

impl Default for SharedStorage {
    fn default() -> Self {
        Self::new()
    }
}

/// One execution context's view of the shared storage.
///
/// Implements [`CartStorage`]; every successful write broadcasts a
/// [`ChangeNotice`] stamped with this handle's [`ContextId`].
#[derive(Clone)]
pub struct StorageHandle {
    shared: SharedStorage,
    context: ContextId,
}

impl StorageHandle {
    /// Returns this context's id.
    pub fn context(&self) -> ContextId {
        self.context
    }

    /// Subscribes to change notices from every context.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeNotice> {
        self.shared.notices.subscribe()
    }

    fn publish(&self, key: &ScopeKey) {
        // No receivers is fine: a lone context has nobody to notify.
        let _ = self.shared.notices.send(ChangeNotice {
            key: key.clone(),
            origin: self.context,
        });
    }
}

impl CartStorage for StorageHandle {
    fn load(&self, key: &ScopeKey) -> Result<Option<serde_json::Value>> {
        let state = self.shared.state.read().unwrap();
        Ok(state.entries.get(key).cloned())
    }

    fn store(&self, key: &ScopeKey, payload: serde_json::Value) -> Result<()> {
        let mut state = self.shared.state.write().unwrap();

        if state.fail_on_store {
            return Err(StorageError::Backend("storage unavailable".to_string()));
        }

        if let Some(limit) = self.shared.quota_bytes {
            let attempted = payload.to_string().len();
            if attempted > limit {
                return Err(StorageError::QuotaExceeded {
                    key: key.clone(),
                    attempted,
                    limit,
                });
            }
        }

        state.entries.insert(key.clone(), payload);
        drop(state);

        self.publish(key);
        Ok(())
    }

    fn remove(&self, key: &ScopeKey) -> Result<()> {
        let removed = {
            let mut state = self.shared.state.write().unwrap();
            state.entries.remove(key).is_some()
        };

        if removed {
            self.publish(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::IdentityScope;

    fn guest_key() -> ScopeKey {
        IdentityScope::Guest.storage_key()
    }

    #[test]
    fn store_and_load_roundtrip() {
        let storage = SharedStorage::new();
        let handle = storage.attach();
        let key = guest_key();

        handle.store(&key, serde_json::json!([1, 2, 3])).unwrap();

        let loaded = handle.load(&key).unwrap();
        assert_eq!(loaded, Some(serde_json::json!([1, 2, 3])));
    }

    #[test]
    fn load_absent_key_is_none() {
        let storage = SharedStorage::new();
        let handle = storage.attach();

        assert_eq!(handle.load(&guest_key()).unwrap(), None);
    }

    #[test]
    fn writes_are_visible_through_other_handles() {
        let storage = SharedStorage::new();
        let tab_a = storage.attach();
        let tab_b = storage.attach();
        let key = guest_key();

        tab_a.store(&key, serde_json::json!({"from": "a"})).unwrap();

        let seen = tab_b.load(&key).unwrap();
        assert_eq!(seen, Some(serde_json::json!({"from": "a"})));
    }

    #[test]
    fn handles_get_distinct_context_ids() {
        let storage = SharedStorage::new();
        let a = storage.attach();
        let b = storage.attach();
        assert_ne!(a.context(), b.context());
    }

    #[test]
    fn remove_deletes_the_key() {
        let storage = SharedStorage::new();
        let handle = storage.attach();
        let key = guest_key();

        handle.store(&key, serde_json::json!([])).unwrap();
        assert!(storage.contains(&key));

        handle.remove(&key).unwrap();
        assert!(!storage.contains(&key));
        assert_eq!(handle.load(&key).unwrap(), None);
    }

    #[test]
    fn remove_absent_key_is_noop() {
        let storage = SharedStorage::new();
        let handle = storage.attach();
        handle.remove(&guest_key()).unwrap();
        assert_eq!(storage.key_count(), 0);
    }

    #[tokio::test]
    async fn store_broadcasts_change_notice_with_origin() {
        let storage = SharedStorage::new();
        let writer = storage.attach();
        let reader = storage.attach();
        let mut notices = reader.subscribe();
        let key = guest_key();

        writer.store(&key, serde_json::json!([])).unwrap();

        let notice = notices.recv().await.unwrap();
        assert_eq!(notice.key, key);
        assert_eq!(notice.origin, writer.context());
    }

    #[tokio::test]
    async fn remove_broadcasts_change_notice() {
        let storage = SharedStorage::new();
        let writer = storage.attach();
        let key = guest_key();
        writer.store(&key, serde_json::json!([])).unwrap();

        let mut notices = writer.subscribe();
        writer.remove(&key).unwrap();

        let notice = notices.recv().await.unwrap();
        assert_eq!(notice.key, key);
    }

    #[tokio::test]
    async fn notices_preserve_write_order() {
        let storage = SharedStorage::new();
        let writer = storage.attach();
        let mut notices = writer.subscribe();

        let guest = IdentityScope::Guest.storage_key();
        let user = IdentityScope::user("uid-1").storage_key();
        writer.store(&guest, serde_json::json!(1)).unwrap();
        writer.store(&user, serde_json::json!(2)).unwrap();
        writer.store(&guest, serde_json::json!(3)).unwrap();

        assert_eq!(notices.recv().await.unwrap().key, guest);
        assert_eq!(notices.recv().await.unwrap().key, user);
        assert_eq!(notices.recv().await.unwrap().key, guest);
    }

    #[test]
    fn fail_on_store_rejects_writes() {
        let storage = SharedStorage::new();
        let handle = storage.attach();
        storage.set_fail_on_store(true);

        let result = handle.store(&guest_key(), serde_json::json!([]));
        assert!(matches!(result, Err(StorageError::Backend(_))));
        assert_eq!(storage.key_count(), 0);
    }

    #[test]
    fn quota_rejects_oversized_writes() {
        let storage = SharedStorage::with_quota(8);
        let handle = storage.attach();

        let result = handle.store(&guest_key(), serde_json::json!("a very long payload"));
        assert!(matches!(result, Err(StorageError::QuotaExceeded { .. })));
    }
}

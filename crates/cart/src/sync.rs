//! Cart synchronizer: identity transitions and cross-context edits.

use cart_storage::{CartStorage, ChangeNotice, ContextId, StorageHandle};
use common::IdentityState;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::{broadcast, watch};

use crate::identity::IdentityProvider;
use crate::store::CartStore;

/// Reconciles a [`CartStore`] with identity-scope transitions and with
/// other execution contexts mutating the same persisted storage.
///
/// Everything runs on the host's single logical thread: the owning
/// context calls [`pump`](CartSynchronizer::pump) whenever its event
/// loop turns, and the synchronizer drains whatever has accumulated.
pub struct CartSynchronizer {
    identity: watch::Receiver<IdentityState>,
    notices: broadcast::Receiver<ChangeNotice>,
    origin: ContextId,
}

impl CartSynchronizer {
    /// Creates a synchronizer for the context owning `handle`.
    pub fn new<P: IdentityProvider>(provider: &P, handle: &StorageHandle) -> Self {
        Self {
            identity: provider.subscribe(),
            notices: handle.subscribe(),
            origin: handle.context(),
        }
    }

    /// Creates a synchronizer from raw channel ends.
    pub fn from_parts(
        identity: watch::Receiver<IdentityState>,
        notices: broadcast::Receiver<ChangeNotice>,
        origin: ContextId,
    ) -> Self {
        Self {
            identity,
            notices,
            origin,
        }
    }

    /// Drains pending identity transitions and storage notices into the
    /// store. Identity is applied first so a notice for the new scope's
    /// key lands on the right cart.
    pub fn pump<S: CartStorage>(&mut self, store: &mut CartStore<S>) {
        self.apply_identity(store);
        self.drain_notices(store);
    }

    fn apply_identity<S: CartStorage>(&mut self, store: &mut CartStore<S>) {
        // Only the latest value matters; watch collapses intermediate
        // transitions for us.
        let state = self.identity.borrow_and_update().clone();
        match state {
            IdentityState::Pending => {}
            IdentityState::Resolved(scope) => store.resolve_scope(scope),
        }
    }

    fn drain_notices<S: CartStorage>(&mut self, store: &mut CartStore<S>) {
        loop {
            match self.notices.try_recv() {
                Ok(notice) => self.handle_notice(store, notice),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                Err(TryRecvError::Lagged(missed)) => {
                    // Missed notices may include our own scope's key;
                    // resync unconditionally.
                    tracing::warn!(missed, "change notices lagged, reloading cart");
                    store.reload();
                }
            }
        }
    }

    fn handle_notice<S: CartStorage>(&self, store: &mut CartStore<S>, notice: ChangeNotice) {
        if notice.origin == self.origin {
            // Our own write; the in-memory cart is already current.
            return;
        }

        let Some(scope) = store.scope() else {
            // Unresolved: we do not yet know which key is ours.
            return;
        };

        if notice.key == scope.storage_key() {
            tracing::debug!(key = %notice.key, origin = %notice.origin, "external cart edit");
            store.reload();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cart_storage::SharedStorage;
    use common::IdentityScope;

    use crate::identity::InMemoryIdentityProvider;
    use crate::item::{CartKey, LineItem};
    use crate::money::Money;

    struct Context {
        store: CartStore<StorageHandle>,
        sync: CartSynchronizer,
    }

    fn open_context(storage: &SharedStorage, provider: &InMemoryIdentityProvider) -> Context {
        let handle = storage.attach();
        let sync = CartSynchronizer::new(provider, &handle);
        Context {
            store: CartStore::new(handle),
            sync,
        }
    }

    fn bowl(quantity: u32) -> LineItem {
        LineItem::product("prod-1", "Bowl", Money::from_paise(1000), quantity)
    }

    #[tokio::test]
    async fn test_pump_resolves_identity_once() {
        let storage = SharedStorage::new();
        let provider = InMemoryIdentityProvider::new();
        let mut ctx = open_context(&storage, &provider);

        ctx.sync.pump(&mut ctx.store);
        assert!(!ctx.store.is_resolved());

        provider.resolve_guest();
        ctx.sync.pump(&mut ctx.store);
        assert_eq!(ctx.store.scope(), Some(&IdentityScope::Guest));

        // Scope-unchanged pumps must not reload.
        let revision = ctx.store.revision();
        ctx.sync.pump(&mut ctx.store);
        ctx.sync.pump(&mut ctx.store);
        assert_eq!(ctx.store.revision(), revision);
    }

    #[tokio::test]
    async fn test_other_context_edits_become_visible() {
        let storage = SharedStorage::new();
        let provider = InMemoryIdentityProvider::resolved(IdentityScope::Guest);
        let mut tab_a = open_context(&storage, &provider);
        let mut tab_b = open_context(&storage, &provider);
        tab_a.sync.pump(&mut tab_a.store);
        tab_b.sync.pump(&mut tab_b.store);

        tab_a.store.add_item(bowl(2)).unwrap();
        tab_b.sync.pump(&mut tab_b.store);

        assert_eq!(tab_b.store.len(), 1);
        let line = tab_b
            .store
            .get(&CartKey::product(&"prod-1".into()))
            .unwrap();
        assert_eq!(line.quantity, 2);
    }

    #[tokio::test]
    async fn test_own_writes_are_not_reloaded() {
        let storage = SharedStorage::new();
        let provider = InMemoryIdentityProvider::resolved(IdentityScope::Guest);
        let mut ctx = open_context(&storage, &provider);
        ctx.sync.pump(&mut ctx.store);

        ctx.store.add_item(bowl(1)).unwrap();
        let revision = ctx.store.revision();

        ctx.sync.pump(&mut ctx.store);
        assert_eq!(ctx.store.revision(), revision);
    }

    #[tokio::test]
    async fn test_other_scope_notices_are_ignored() {
        let storage = SharedStorage::new();
        let guest_provider = InMemoryIdentityProvider::resolved(IdentityScope::Guest);
        let user_provider = InMemoryIdentityProvider::resolved(IdentityScope::user("uid-1"));

        let mut guest_tab = open_context(&storage, &guest_provider);
        let mut user_tab = open_context(&storage, &user_provider);
        guest_tab.sync.pump(&mut guest_tab.store);
        user_tab.sync.pump(&mut user_tab.store);

        guest_tab.store.add_item(bowl(3)).unwrap();
        user_tab.store
            .add_item(LineItem::product("prod-9", "Mug", Money::from_paise(500), 1))
            .unwrap();

        // Each tab pumps; neither cart leaks into the other.
        guest_tab.sync.pump(&mut guest_tab.store);
        user_tab.sync.pump(&mut user_tab.store);

        assert_eq!(guest_tab.store.len(), 1);
        assert_eq!(guest_tab.store.count(), 3);
        assert_eq!(user_tab.store.len(), 1);
        assert_eq!(user_tab.store.count(), 1);
    }

    #[tokio::test]
    async fn test_sign_in_switches_to_user_cart_wholesale() {
        let storage = SharedStorage::new();
        let provider = InMemoryIdentityProvider::resolved(IdentityScope::Guest);
        let mut ctx = open_context(&storage, &provider);
        ctx.sync.pump(&mut ctx.store);

        ctx.store.add_item(bowl(2)).unwrap();

        provider.sign_in("uid-1");
        ctx.sync.pump(&mut ctx.store);

        assert!(ctx.store.is_empty());
        assert_eq!(ctx.store.scope(), Some(&IdentityScope::user("uid-1")));
        // The guest cart stays persisted for the next guest session.
        assert!(storage.contains(&IdentityScope::Guest.storage_key()));

        provider.sign_out();
        ctx.sync.pump(&mut ctx.store);
        assert_eq!(ctx.store.count(), 2);
    }

    #[tokio::test]
    async fn test_deferred_mutations_flush_on_resolution() {
        let storage = SharedStorage::new();
        let provider = InMemoryIdentityProvider::new();
        let mut ctx = open_context(&storage, &provider);
        ctx.sync.pump(&mut ctx.store);

        ctx.store.add_item(bowl(1)).unwrap();
        assert_eq!(storage.key_count(), 0);

        provider.sign_in("uid-1");
        ctx.sync.pump(&mut ctx.store);

        assert_eq!(ctx.store.len(), 1);
        assert!(storage.contains(&IdentityScope::user("uid-1").storage_key()));
        assert!(!storage.contains(&IdentityScope::Guest.storage_key()));
    }
}

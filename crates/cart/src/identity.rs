//! Identity provider boundary.

use common::{IdentityScope, IdentityState};
use tokio::sync::watch;

/// Read-only view of the shopper's authentication state.
///
/// The cart only consumes the identity value and its transitions; how
/// the shopper signed in is someone else's problem.
pub trait IdentityProvider {
    /// The current identity state.
    fn state(&self) -> IdentityState;

    /// Subscribes to identity transitions.
    fn subscribe(&self) -> watch::Receiver<IdentityState>;
}

/// In-memory identity provider for tests and the demo shell.
///
/// Starts `Pending` to mirror a real provider settling asynchronously.
#[derive(Debug)]
pub struct InMemoryIdentityProvider {
    tx: watch::Sender<IdentityState>,
}

impl InMemoryIdentityProvider {
    /// Creates a provider that has not yet resolved.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(IdentityState::Pending);
        Self { tx }
    }

    /// Creates a provider already resolved to `scope`.
    pub fn resolved(scope: IdentityScope) -> Self {
        let (tx, _) = watch::channel(IdentityState::Resolved(scope));
        Self { tx }
    }

    /// Resolves to the guest scope.
    pub fn resolve_guest(&self) {
        self.set(IdentityState::Resolved(IdentityScope::Guest));
    }

    /// Signs a user in.
    pub fn sign_in(&self, user_id: impl Into<common::UserId>) {
        self.set(IdentityState::Resolved(IdentityScope::User(user_id.into())));
    }

    /// Signs out, returning to the guest scope.
    pub fn sign_out(&self) {
        self.set(IdentityState::Resolved(IdentityScope::Guest));
    }

    fn set(&self, state: IdentityState) {
        // send_replace keeps working with no active receivers.
        self.tx.send_replace(state);
    }
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for InMemoryIdentityProvider {
    fn state(&self) -> IdentityState {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<IdentityState> {
        self.tx.subscribe()
    }
}

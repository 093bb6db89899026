//! Cart store: single source of truth for the current scope's cart.

use std::collections::VecDeque;

use cart_storage::{CartStorage, StorageError};
use common::{IdentityScope, UserId};

use crate::error::CartError;
use crate::item::{CartKey, LineItem, LineKind};
use crate::money::Money;

/// A mutation deferred while identity resolution is outstanding.
///
/// Writing to storage before the scope is known risks landing in the
/// wrong scope's key, so mutations queue here until resolution.
#[derive(Debug, Clone)]
enum CartCommand {
    Add(LineItem),
    UpdateQuantity(CartKey, u32),
    Remove(CartKey),
    Clear,
}

/// A point-in-time copy of the cart taken for an in-flight checkout.
///
/// The snapshot is immune to later store mutations: a checkout attempt
/// prices and submits exactly what the shopper saw when they submitted.
#[derive(Debug, Clone)]
pub struct CartSnapshot {
    /// The lines at snapshot time, in cart order.
    pub lines: Vec<LineItem>,

    /// The store revision the snapshot was taken at.
    pub revision: u64,

    /// The identity scope that owned the cart.
    pub scope: Option<IdentityScope>,
}

impl CartSnapshot {
    /// Sum of line totals.
    pub fn subtotal(&self) -> Money {
        self.lines
            .iter()
            .fold(Money::zero(), |sum, line| sum + line.line_total())
    }

    /// Returns true if the snapshot has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The authenticated user id, when the owning scope has one.
    pub fn user_id(&self) -> Option<&UserId> {
        self.scope.as_ref().and_then(|scope| scope.user_id())
    }
}

/// The owning store for the current identity scope's cart.
///
/// Every mutation synchronously persists the full cart snapshot under
/// the scope's storage key. Persistence failures are reported and the
/// in-memory cart stays authoritative for the rest of the run; a
/// malformed persisted payload on load is discarded as an empty cart.
pub struct CartStore<S: CartStorage> {
    storage: S,
    scope: Option<IdentityScope>,
    lines: Vec<LineItem>,
    revision: u64,
    deferred: VecDeque<CartCommand>,
}

impl<S: CartStorage> CartStore<S> {
    /// Creates a store with an unresolved identity scope and empty cart.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            scope: None,
            lines: Vec::new(),
            revision: 0,
            deferred: VecDeque::new(),
        }
    }

    // Query methods

    /// The lines currently in the cart, in insertion order.
    pub fn items(&self) -> &[LineItem] {
        &self.lines
    }

    /// Returns a line by cart key.
    pub fn get(&self, key: &CartKey) -> Option<&LineItem> {
        self.lines.iter().find(|line| &line.cart_key == key)
    }

    /// Number of lines in the cart.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns true if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of `unit_price × quantity` over all lines.
    pub fn total(&self) -> Money {
        self.lines
            .iter()
            .fold(Money::zero(), |sum, line| sum + line.line_total())
    }

    /// Cart badge count: product lines count by quantity, each booking
    /// line counts as one.
    pub fn count(&self) -> u32 {
        self.lines.iter().map(LineItem::unit_count).sum()
    }

    /// Monotonic revision, bumped on every content change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The resolved scope, if any.
    pub fn scope(&self) -> Option<&IdentityScope> {
        self.scope.as_ref()
    }

    /// Returns true once an identity scope has been adopted.
    pub fn is_resolved(&self) -> bool {
        self.scope.is_some()
    }

    /// Number of mutations waiting for identity resolution.
    pub fn deferred_count(&self) -> usize {
        self.deferred.len()
    }

    /// Clones the cart for an in-flight checkout attempt.
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            lines: self.lines.clone(),
            revision: self.revision,
            scope: self.scope.clone(),
        }
    }

    // Scope lifecycle

    /// Adopts an identity scope, replacing the in-memory cart with the
    /// new scope's persisted cart.
    ///
    /// Idempotent per scope: re-resolving the current scope does not
    /// reload. The previous scope's persisted cart is left untouched.
    /// Mutations deferred while unresolved are replayed in order and
    /// persisted once.
    #[tracing::instrument(skip(self))]
    pub fn resolve_scope(&mut self, scope: IdentityScope) {
        if self.scope.as_ref() == Some(&scope) {
            return;
        }

        tracing::info!(%scope, "adopting identity scope");
        self.scope = Some(scope);
        self.lines = self.load_persisted();
        self.revision += 1;

        if !self.deferred.is_empty() {
            let queued: Vec<CartCommand> = self.deferred.drain(..).collect();
            for command in queued {
                self.apply(command);
            }
            self.revision += 1;
            self.persist();
        }
    }

    /// Replaces the in-memory cart from storage for the current scope.
    ///
    /// Used by the synchronizer when another context edits the same
    /// scope's persisted cart. Never writes. No-op while unresolved.
    pub fn reload(&mut self) {
        if self.scope.is_none() {
            return;
        }
        self.lines = self.load_persisted();
        self.revision += 1;
        metrics::counter!("cart_reloads_total").increment(1);
        tracing::debug!(lines = self.lines.len(), "cart reloaded from storage");
    }

    // Command methods

    /// Adds a line to the cart.
    ///
    /// A product with the same cart key as an existing line increments
    /// that line's quantity; workshop bookings are always appended as
    /// new lines. Preventing duplicate bookings is the caller's job.
    #[tracing::instrument(skip(self, item), fields(cart_key = %item.cart_key))]
    pub fn add_item(&mut self, item: LineItem) -> Result<(), CartError> {
        if item.quantity == 0 {
            return Err(CartError::InvalidQuantity {
                quantity: item.quantity,
            });
        }
        if item.unit_price.is_negative() {
            return Err(CartError::InvalidPrice {
                paise: item.unit_price.paise(),
            });
        }

        if self.scope.is_none() {
            tracing::debug!("identity unresolved, deferring add");
            self.deferred.push_back(CartCommand::Add(item));
            return Ok(());
        }

        self.apply(CartCommand::Add(item));
        self.revision += 1;
        self.persist();
        Ok(())
    }

    /// Replaces a product line's quantity.
    ///
    /// A quantity of zero removes the line instead. Absent keys are a
    /// silent no-op, as are positive updates to booking lines (a booking
    /// is atomic once its slot is chosen).
    #[tracing::instrument(skip(self))]
    pub fn update_quantity(&mut self, key: &CartKey, new_quantity: u32) {
        if self.scope.is_none() {
            self.deferred
                .push_back(CartCommand::UpdateQuantity(key.clone(), new_quantity));
            return;
        }

        if self.apply(CartCommand::UpdateQuantity(key.clone(), new_quantity)) {
            self.revision += 1;
            self.persist();
        }
    }

    /// Deletes a line. Absent keys are a no-op.
    #[tracing::instrument(skip(self))]
    pub fn remove_item(&mut self, key: &CartKey) {
        if self.scope.is_none() {
            self.deferred.push_back(CartCommand::Remove(key.clone()));
            return;
        }

        if self.apply(CartCommand::Remove(key.clone())) {
            self.revision += 1;
            self.persist();
        }
    }

    /// Empties the cart and removes its persisted representation.
    #[tracing::instrument(skip(self))]
    pub fn clear(&mut self) {
        if self.scope.is_none() {
            self.deferred.push_back(CartCommand::Clear);
            return;
        }

        self.lines.clear();
        self.revision += 1;
        self.persist();
    }

    // Internal helpers

    /// Applies a command to the in-memory lines without persisting.
    /// Returns true if the cart content changed.
    fn apply(&mut self, command: CartCommand) -> bool {
        match command {
            CartCommand::Add(item) => {
                match &item.kind {
                    LineKind::Product { .. } => {
                        if let Some(existing) = self
                            .lines
                            .iter_mut()
                            .find(|line| line.cart_key == item.cart_key)
                        {
                            existing.quantity += item.quantity;
                        } else {
                            self.lines.push(item);
                        }
                    }
                    // Bookings never merge, even for a recurring
                    // workshop/slot pair.
                    LineKind::WorkshopBooking { .. } => self.lines.push(item),
                }
                true
            }
            CartCommand::UpdateQuantity(key, 0) => self.apply(CartCommand::Remove(key)),
            CartCommand::UpdateQuantity(key, new_quantity) => {
                let Some(line) = self.lines.iter_mut().find(|line| line.cart_key == key) else {
                    tracing::debug!(%key, "quantity update for absent cart key ignored");
                    return false;
                };
                match line.kind {
                    LineKind::WorkshopBooking { .. } => {
                        tracing::debug!(%key, "booking line is atomic, quantity update ignored");
                        false
                    }
                    LineKind::Product { .. } => {
                        if line.quantity == new_quantity {
                            false
                        } else {
                            line.quantity = new_quantity;
                            true
                        }
                    }
                }
            }
            CartCommand::Remove(key) => {
                let before = self.lines.len();
                self.lines.retain(|line| line.cart_key != key);
                before != self.lines.len()
            }
            CartCommand::Clear => {
                self.lines.clear();
                true
            }
        }
    }

    /// Writes the full cart under the scope key, or removes the key when
    /// the cart is empty. Failures are reported; the in-memory cart
    /// stays authoritative.
    fn persist(&self) {
        let Some(scope) = &self.scope else {
            return;
        };
        let key = scope.storage_key();

        let result = if self.lines.is_empty() {
            self.storage.remove(&key)
        } else {
            match serde_json::to_value(&self.lines) {
                Ok(payload) => self.storage.store(&key, payload),
                Err(e) => Err(StorageError::Serialization(e)),
            }
        };

        if let Err(error) = result {
            tracing::error!(%key, %error, "failed to persist cart");
            metrics::counter!("cart_persist_failures").increment(1);
        }
    }

    /// Reads the current scope's persisted cart. Absent keys, read
    /// failures, and malformed payloads all load as an empty cart.
    fn load_persisted(&self) -> Vec<LineItem> {
        let Some(scope) = &self.scope else {
            return Vec::new();
        };
        let key = scope.storage_key();

        match self.storage.load(&key) {
            Ok(Some(value)) => match serde_json::from_value::<Vec<LineItem>>(value) {
                Ok(lines) => lines,
                Err(error) => {
                    tracing::warn!(%key, %error, "discarding malformed persisted cart");
                    metrics::counter!("cart_malformed_payloads").increment(1);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(error) => {
                tracing::error!(%key, %error, "failed to read persisted cart");
                Vec::new()
            }
        }
    }
}

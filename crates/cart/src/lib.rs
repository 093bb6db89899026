//! Cart state engine: the single source of truth for the current
//! identity scope's cart.
//!
//! The crate provides:
//! - Value objects for money and cart lines (products and workshop
//!   bookings as a tagged union)
//! - `CartStore`, the owning store with scope-keyed persistence
//! - `CartSynchronizer`, reconciling identity transitions and other
//!   execution contexts' edits
//! - The read-only `IdentityProvider` boundary

pub mod error;
pub mod identity;
pub mod item;
pub mod money;
pub mod store;
pub mod sync;

pub use common::{IdentityScope, IdentityState, UserId};
pub use error::CartError;
pub use identity::{IdentityProvider, InMemoryIdentityProvider};
pub use item::{BookingDetails, CartKey, LineItem, LineKind, ProductId, SlotId, WorkshopId};
pub use money::Money;
pub use store::{CartSnapshot, CartStore};
pub use sync::CartSynchronizer;

//! Shared types for the storefront cart and checkout core.

pub mod types;

pub use types::{IdentityScope, IdentityState, ScopeKey, UserId};

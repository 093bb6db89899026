use common::ScopeKey;

use crate::Result;

/// Durable, per-scope cart persistence.
///
/// The trait is synchronous by design: the storage medium it models
/// completes a write before returning control to the caller, and cart
/// mutations must never await persistence.
///
/// Consumers must tolerate an absent key (empty cart). Payloads are
/// opaque JSON values; interpreting or rejecting a malformed payload is
/// the loader's concern, not the storage's.
pub trait CartStorage {
    /// Loads the payload stored under `key`, or `None` if absent.
    fn load(&self, key: &ScopeKey) -> Result<Option<serde_json::Value>>;

    /// Stores `payload` under `key`, replacing any previous value.
    fn store(&self, key: &ScopeKey, payload: serde_json::Value) -> Result<()>;

    /// Removes the value stored under `key`. Absent keys are a no-op.
    fn remove(&self, key: &ScopeKey) -> Result<()>;
}

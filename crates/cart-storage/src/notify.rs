use common::ScopeKey;

/// Identifies one execution context (tab) attached to the shared storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ContextId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ctx-{}", self.0)
    }
}

/// Broadcast on every persisted-cart write or removal.
///
/// Carries the affected scope key and the originating context so a
/// context can skip notices for its own writes. Delivery is
/// order-preserving per key; consumers for a different scope's key
/// ignore the notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeNotice {
    /// The scope key that was written or removed.
    pub key: ScopeKey,

    /// The context that performed the write.
    pub origin: ContextId,
}

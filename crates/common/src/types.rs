use serde::{Deserialize, Serialize};

/// Opaque user identifier issued by the identity provider.
///
/// Wraps the provider's string id to prevent mixing it up with other
/// string-based identifiers. The value is never interpreted locally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a user ID from a provider-issued string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the user ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The namespace a cart is stored under.
///
/// A cart is owned by exactly one scope at a time: either the anonymous
/// guest scope or a specific authenticated user. Switching scope never
/// merges two scopes' carts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentityScope {
    /// Anonymous shopper.
    Guest,

    /// Authenticated user.
    User(UserId),
}

impl IdentityScope {
    /// Creates an authenticated-user scope.
    pub fn user(id: impl Into<UserId>) -> Self {
        IdentityScope::User(id.into())
    }

    /// Returns true for the guest scope.
    pub fn is_guest(&self) -> bool {
        matches!(self, IdentityScope::Guest)
    }

    /// Returns the user ID for authenticated scopes.
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            IdentityScope::Guest => None,
            IdentityScope::User(id) => Some(id),
        }
    }

    /// Returns the storage key this scope's cart is persisted under.
    pub fn storage_key(&self) -> ScopeKey {
        match self {
            IdentityScope::Guest => ScopeKey("cart:guest".to_string()),
            IdentityScope::User(id) => ScopeKey(format!("cart:user:{}", id)),
        }
    }
}

impl std::fmt::Display for IdentityScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentityScope::Guest => write!(f, "guest"),
            IdentityScope::User(id) => write!(f, "user:{}", id),
        }
    }
}

/// Key under which one scope's cart lives in durable storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeKey(String);

impl ScopeKey {
    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the identity provider currently knows about the shopper.
///
/// Resolution is asynchronous: until the provider settles guest-vs-user,
/// consumers must not touch any scope's persisted cart.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IdentityState {
    /// The provider has not yet settled.
    #[default]
    Pending,

    /// The provider has resolved a scope.
    Resolved(IdentityScope),
}

impl IdentityState {
    /// Returns the resolved scope, if any.
    pub fn scope(&self) -> Option<&IdentityScope> {
        match self {
            IdentityState::Pending => None,
            IdentityState::Resolved(scope) => Some(scope),
        }
    }

    /// Returns true while resolution is outstanding.
    pub fn is_pending(&self) -> bool {
        matches!(self, IdentityState::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guest_storage_key() {
        assert_eq!(IdentityScope::Guest.storage_key().as_str(), "cart:guest");
    }

    #[test]
    fn user_storage_key_embeds_user_id() {
        let scope = IdentityScope::user("uid-42");
        assert_eq!(scope.storage_key().as_str(), "cart:user:uid-42");
    }

    #[test]
    fn distinct_users_get_distinct_keys() {
        let a = IdentityScope::user("alice").storage_key();
        let b = IdentityScope::user("bob").storage_key();
        assert_ne!(a, b);
    }

    #[test]
    fn scope_display() {
        assert_eq!(IdentityScope::Guest.to_string(), "guest");
        assert_eq!(IdentityScope::user("uid-42").to_string(), "user:uid-42");
    }

    #[test]
    fn identity_state_defaults_to_pending() {
        assert!(IdentityState::default().is_pending());
        assert_eq!(IdentityState::default().scope(), None);
    }

    #[test]
    fn resolved_state_exposes_scope() {
        let state = IdentityState::Resolved(IdentityScope::Guest);
        assert!(!state.is_pending());
        assert_eq!(state.scope(), Some(&IdentityScope::Guest));
    }

    #[test]
    fn scope_serialization_roundtrip() {
        let scope = IdentityScope::user("uid-42");
        let json = serde_json::to_string(&scope).unwrap();
        let deserialized: IdentityScope = serde_json::from_str(&json).unwrap();
        assert_eq!(scope, deserialized);
    }
}

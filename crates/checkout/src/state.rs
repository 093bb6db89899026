//! Checkout state machine.

use serde::{Deserialize, Serialize};

/// The state of a checkout attempt in its lifecycle.
///
/// State transitions:
/// ```text
/// Editing ──► Validating ──► AwaitingIntent ──► AwaitingGatewayResult ──► Verifying ──► Succeeded
///    ▲            │                │                 │         │                │
///    └────────────┴────────────────┴─────────────────┘     Cancelled         Failed
/// ```
///
/// `Succeeded`, `Failed`, and `Cancelled` are terminal for the attempt;
/// a new attempt starts fresh, never resurrecting a terminal one.
/// Validation violations, reservation failures, gateway declines, and
/// dismissal return the session to `Editing` for resubmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CheckoutState {
    /// Shopper is editing contact and shipping details.
    #[default]
    Editing,

    /// Submitted fields are being validated locally.
    Validating,

    /// A payment intent is being reserved with the order service.
    AwaitingIntent,

    /// The payment gateway widget is open, awaiting its callback.
    AwaitingGatewayResult,

    /// A gateway success callback is being verified server-side.
    Verifying,

    /// Order created and cart cleared (terminal state).
    Succeeded,

    /// Attempt failed (terminal state).
    Failed,

    /// Shopper dismissed the payment widget (terminal state).
    Cancelled,
}

impl CheckoutState {
    /// Returns true if a submit can start from this state.
    pub fn can_submit(&self) -> bool {
        matches!(self, CheckoutState::Editing)
    }

    /// Returns true while an attempt is underway.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            CheckoutState::Validating
                | CheckoutState::AwaitingIntent
                | CheckoutState::AwaitingGatewayResult
                | CheckoutState::Verifying
        )
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CheckoutState::Succeeded | CheckoutState::Failed | CheckoutState::Cancelled
        )
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutState::Editing => "Editing",
            CheckoutState::Validating => "Validating",
            CheckoutState::AwaitingIntent => "AwaitingIntent",
            CheckoutState::AwaitingGatewayResult => "AwaitingGatewayResult",
            CheckoutState::Verifying => "Verifying",
            CheckoutState::Succeeded => "Succeeded",
            CheckoutState::Failed => "Failed",
            CheckoutState::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_editing() {
        assert_eq!(CheckoutState::default(), CheckoutState::Editing);
    }

    #[test]
    fn test_can_submit_only_from_editing() {
        assert!(CheckoutState::Editing.can_submit());
        assert!(!CheckoutState::Validating.can_submit());
        assert!(!CheckoutState::AwaitingIntent.can_submit());
        assert!(!CheckoutState::AwaitingGatewayResult.can_submit());
        assert!(!CheckoutState::Verifying.can_submit());
        assert!(!CheckoutState::Succeeded.can_submit());
        assert!(!CheckoutState::Failed.can_submit());
        assert!(!CheckoutState::Cancelled.can_submit());
    }

    #[test]
    fn test_in_flight_states() {
        assert!(!CheckoutState::Editing.is_in_flight());
        assert!(CheckoutState::Validating.is_in_flight());
        assert!(CheckoutState::AwaitingIntent.is_in_flight());
        assert!(CheckoutState::AwaitingGatewayResult.is_in_flight());
        assert!(CheckoutState::Verifying.is_in_flight());
        assert!(!CheckoutState::Succeeded.is_in_flight());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!CheckoutState::Editing.is_terminal());
        assert!(!CheckoutState::Validating.is_terminal());
        assert!(!CheckoutState::AwaitingIntent.is_terminal());
        assert!(!CheckoutState::AwaitingGatewayResult.is_terminal());
        assert!(!CheckoutState::Verifying.is_terminal());
        assert!(CheckoutState::Succeeded.is_terminal());
        assert!(CheckoutState::Failed.is_terminal());
        assert!(CheckoutState::Cancelled.is_terminal());
    }

    #[test]
    fn test_display() {
        assert_eq!(CheckoutState::Editing.to_string(), "Editing");
        assert_eq!(
            CheckoutState::AwaitingGatewayResult.to_string(),
            "AwaitingGatewayResult"
        );
        assert_eq!(CheckoutState::Succeeded.to_string(), "Succeeded");
    }

    #[test]
    fn test_serialization() {
        let state = CheckoutState::Verifying;
        let json = serde_json::to_string(&state).unwrap();
        let deserialized: CheckoutState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, deserialized);
    }
}

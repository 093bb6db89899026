//! Transient checkout session state.

use std::collections::BTreeMap;

use cart::{CartSnapshot, Money};
use uuid::Uuid;

use crate::form::{CheckoutForm, FormField};
use crate::state::CheckoutState;

/// Correlates one checkout session's log lines and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttemptId(Uuid);

impl AttemptId {
    /// Creates a new random attempt ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AttemptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Recorded when an attempt fails.
///
/// When the gateway reported success but verification did not produce
/// an order, `payment_ref` must be surfaced so support can reconcile
/// the charge manually.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutFailure {
    /// User-facing failure message.
    pub message: String,

    /// Gateway payment reference, when one exists.
    pub payment_ref: Option<String>,
}

/// One execution context's checkout state.
///
/// Never persisted and never shared across contexts; a page reload or a
/// new attempt after a terminal state starts a fresh session.
#[derive(Debug, Default)]
pub struct CheckoutSession {
    attempt_id: AttemptId,
    state: CheckoutState,
    form: CheckoutForm,
    field_errors: BTreeMap<FormField, String>,
    snapshot: Option<CartSnapshot>,
    shipping_quote: Option<Money>,
    intent_ref: Option<String>,
    order_number: Option<String>,
    failure: Option<CheckoutFailure>,
}

impl CheckoutSession {
    /// Creates a fresh session in `Editing`.
    pub fn new() -> Self {
        Self::default()
    }

    /// This session's correlation id.
    pub fn attempt_id(&self) -> AttemptId {
        self.attempt_id
    }

    /// Current state.
    pub fn state(&self) -> CheckoutState {
        self.state
    }

    /// The last submitted form.
    pub fn form(&self) -> &CheckoutForm {
        &self.form
    }

    /// Per-field validation errors from the last submit.
    pub fn field_errors(&self) -> &BTreeMap<FormField, String> {
        &self.field_errors
    }

    /// The cart snapshot the in-flight attempt is operating on.
    pub fn snapshot(&self) -> Option<&CartSnapshot> {
        self.snapshot.as_ref()
    }

    /// The shipping charge applied to the attempt, once priced.
    pub fn shipping_quote(&self) -> Option<Money> {
        self.shipping_quote
    }

    /// The reserved payment intent reference, once assigned.
    pub fn intent_ref(&self) -> Option<&str> {
        self.intent_ref.as_deref()
    }

    /// The created order number, on success.
    pub fn order_number(&self) -> Option<&str> {
        self.order_number.as_deref()
    }

    /// The last failure, if any.
    pub fn failure(&self) -> Option<&CheckoutFailure> {
        self.failure.as_ref()
    }

    // Orchestrator-internal transitions

    /// Starts an attempt: adopts the form and cart snapshot, clears
    /// previous attempt residue, and enters `Validating`.
    pub(crate) fn begin_attempt(&mut self, form: CheckoutForm, snapshot: CartSnapshot) {
        self.form = form;
        self.snapshot = Some(snapshot);
        self.field_errors.clear();
        self.intent_ref = None;
        self.order_number = None;
        self.failure = None;
        self.transition(CheckoutState::Validating);
    }

    /// Records validation errors and returns to `Editing`.
    pub(crate) fn reject_validation(&mut self, errors: BTreeMap<FormField, String>) {
        self.field_errors = errors;
        self.transition(CheckoutState::Editing);
    }

    pub(crate) fn transition(&mut self, next: CheckoutState) {
        tracing::debug!(from = %self.state, to = %next, "checkout state transition");
        self.state = next;
    }

    pub(crate) fn set_shipping_quote(&mut self, charge: Money) {
        self.shipping_quote = Some(charge);
    }

    pub(crate) fn set_intent_ref(&mut self, intent_ref: String) {
        self.intent_ref = Some(intent_ref);
    }

    pub(crate) fn set_order_number(&mut self, order_number: String) {
        self.order_number = Some(order_number);
    }

    pub(crate) fn record_failure(&mut self, failure: CheckoutFailure) {
        self.failure = Some(failure);
    }

    /// Reopens the session for resubmission after a retryable outcome.
    pub(crate) fn reopen_for_editing(&mut self) {
        self.transition(CheckoutState::Editing);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_editing_and_clean() {
        let session = CheckoutSession::new();
        assert_eq!(session.state(), CheckoutState::Editing);
        assert!(session.field_errors().is_empty());
        assert!(session.intent_ref().is_none());
        assert!(session.order_number().is_none());
        assert!(session.failure().is_none());
    }

    #[test]
    fn test_attempt_ids_are_unique() {
        assert_ne!(CheckoutSession::new().attempt_id(), CheckoutSession::new().attempt_id());
    }

    #[test]
    fn test_begin_attempt_clears_previous_residue() {
        let mut session = CheckoutSession::new();
        session.set_intent_ref("INT-0001".to_string());
        session.record_failure(CheckoutFailure {
            message: "declined".to_string(),
            payment_ref: None,
        });

        session.begin_attempt(
            CheckoutForm::default(),
            CartSnapshot {
                lines: Vec::new(),
                revision: 0,
                scope: None,
            },
        );

        assert_eq!(session.state(), CheckoutState::Validating);
        assert!(session.intent_ref().is_none());
        assert!(session.failure().is_none());
    }
}

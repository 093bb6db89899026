//! Payment gateway widget boundary.
//!
//! The gateway is third-party and only partially trusted: its success
//! callback carries a signature that the order service must verify
//! before any order exists. Each invocation resolves exactly once, to
//! exactly one of success, dismissal, or failure.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use cart::Money;

use crate::services::offline_signature;

/// Contact fields prefilled into the gateway widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayPrefill {
    pub name: String,
    pub email: String,
    pub contact: String,
}

/// Everything the gateway widget is opened with.
#[derive(Debug, Clone)]
pub struct GatewayInvocation {
    /// Public key identifying the merchant account.
    pub gateway_key: String,

    /// Amount to collect.
    pub amount: Money,

    /// ISO currency code.
    pub currency: String,

    /// The reserved payment intent this attempt pays.
    pub intent_ref: String,

    /// Prefilled contact details.
    pub prefill: GatewayPrefill,
}

/// The gateway's success callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayCallback {
    /// Gateway-assigned payment reference.
    pub payment_ref: String,

    /// Echo of the intent reference that was paid.
    pub intent_ref: String,

    /// Signature over the payment/intent pair; verified server-side.
    pub signature: String,
}

/// The single-shot resolution of one gateway invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayOutcome {
    /// The shopper completed payment; the claim still needs verifying.
    Completed(GatewayCallback),

    /// The shopper closed the widget without paying.
    Dismissed,

    /// The attempt failed with a human-readable reason.
    Failed(String),
}

/// Trait for the external payment gateway widget.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Whether the gateway SDK has loaded and can take an attempt.
    fn is_available(&self) -> bool {
        true
    }

    /// Opens the widget and resolves once with the attempt's outcome.
    async fn collect_payment(&self, invocation: GatewayInvocation) -> GatewayOutcome;
}

/// Scripted resolution for the in-memory gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayBehavior {
    /// Resolve with a signed success callback.
    Approve,

    /// Resolve as shopper-dismissed.
    Dismiss,

    /// Resolve as failed with the given reason.
    Decline(String),
}

#[derive(Debug)]
struct InMemoryGatewayState {
    behavior: GatewayBehavior,
    sdk_loaded: bool,
    next_id: u32,
    invocations: Vec<GatewayInvocation>,
}

/// In-memory payment gateway for testing.
#[derive(Debug, Clone)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

impl InMemoryPaymentGateway {
    /// Creates a gateway that approves every attempt.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryGatewayState {
                behavior: GatewayBehavior::Approve,
                sdk_loaded: true,
                next_id: 0,
                invocations: Vec::new(),
            })),
        }
    }

    /// Scripts the next invocations' resolution.
    pub fn set_behavior(&self, behavior: GatewayBehavior) {
        self.state.write().unwrap().behavior = behavior;
    }

    /// Simulates the SDK script failing (or succeeding) to load.
    pub fn set_sdk_loaded(&self, loaded: bool) {
        self.state.write().unwrap().sdk_loaded = loaded;
    }

    /// Returns the number of times the widget was opened.
    pub fn invocation_count(&self) -> usize {
        self.state.read().unwrap().invocations.len()
    }

    /// Returns the most recent invocation.
    pub fn last_invocation(&self) -> Option<GatewayInvocation> {
        self.state.read().unwrap().invocations.last().cloned()
    }
}

impl Default for InMemoryPaymentGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    fn is_available(&self) -> bool {
        self.state.read().unwrap().sdk_loaded
    }

    async fn collect_payment(&self, invocation: GatewayInvocation) -> GatewayOutcome {
        let mut state = self.state.write().unwrap();
        let intent_ref = invocation.intent_ref.clone();
        state.invocations.push(invocation);

        match state.behavior.clone() {
            GatewayBehavior::Approve => {
                state.next_id += 1;
                let payment_ref = format!("PAY-{:04}", state.next_id);
                let signature = offline_signature(&intent_ref, &payment_ref);
                GatewayOutcome::Completed(GatewayCallback {
                    payment_ref,
                    intent_ref,
                    signature,
                })
            }
            GatewayBehavior::Dismiss => GatewayOutcome::Dismissed,
            GatewayBehavior::Decline(reason) => GatewayOutcome::Failed(reason),
        }
    }
}

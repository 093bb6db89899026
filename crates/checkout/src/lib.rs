//! Checkout orchestration for the storefront core.
//!
//! Drives a single checkout attempt from validated input to a terminal
//! payment outcome, exactly once per attempt:
//! 1. Validate contact and shipping fields (no network on violation)
//! 2. Price the cart snapshot (shipping quote with fixed fallback)
//! 3. Reserve a payment intent with the order service
//! 4. Hand off to the payment gateway widget and await its single-shot
//!    result
//! 5. Verify the gateway callback server-side and durably create the
//!    order
//!
//! Success is the only path that clears the cart. A verification
//! failure after a genuine gateway success retains the payment
//! reference for manual support reconciliation.

pub mod error;
pub mod form;
pub mod orchestrator;
pub mod pricing;
pub mod services;
pub mod session;
pub mod state;

pub use error::CheckoutError;
pub use form::{CheckoutForm, FormField};
pub use orchestrator::{CheckoutOrchestrator, CheckoutOutcome};
pub use pricing::PricingEngine;
pub use services::{
    GatewayBehavior, GatewayCallback, GatewayInvocation, GatewayOutcome, GatewayPrefill,
    InMemoryOrderService, InMemoryPaymentGateway, InMemoryShippingRateService, IntentReservation,
    OrderAddress, OrderPayload, OrderService, OrderTotals, PaymentGateway, RateItem, RateRequest,
    ReserveIntentRequest, ShippingRateService, VerifiedOrder, VerifyPaymentRequest,
};
pub use session::{AttemptId, CheckoutFailure, CheckoutSession};
pub use state::CheckoutState;

//! External checkout collaborators: shipping rates, the order service,
//! and the payment gateway widget, each as a trait plus an in-memory
//! implementation for tests and the demo shell.

pub mod gateway;
pub mod order;
pub mod shipping;

pub use gateway::{
    GatewayBehavior, GatewayCallback, GatewayInvocation, GatewayOutcome, GatewayPrefill,
    InMemoryPaymentGateway, PaymentGateway,
};
pub use order::{
    InMemoryOrderService, IntentReservation, OrderAddress, OrderPayload, OrderService,
    OrderTotals, ReserveIntentRequest, VerifiedOrder, VerifyPaymentRequest,
};
pub use shipping::{InMemoryShippingRateService, RateItem, RateRequest, ShippingRateService};

/// Signature scheme shared by the in-memory gateway and order service,
/// standing in for the gateway's HMAC over `intent_ref|payment_ref`.
pub(crate) fn offline_signature(intent_ref: &str, payment_ref: &str) -> String {
    format!("sig:{intent_ref}:{payment_ref}")
}

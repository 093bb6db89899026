//! Checkout error types.

use thiserror::Error;

/// Errors surfaced by the external checkout collaborators.
///
/// These never cross into UI-facing state as raw errors; the
/// orchestrator converts them to typed outcomes.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Shipping rate service error.
    #[error("Shipping rate service error: {0}")]
    ShippingService(String),

    /// Order service error.
    #[error("Order service error: {0}")]
    OrderService(String),

    /// The order service does not know the referenced payment intent.
    #[error("Unknown payment intent: {0}")]
    UnknownIntent(String),

    /// The order service rejected the payment verification.
    #[error("Payment verification rejected: {0}")]
    VerificationRejected(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

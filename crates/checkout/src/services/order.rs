//! Order service trait and in-memory implementation.
//!
//! The order service owns the two server-side steps of a checkout:
//! reserving a payment intent before the gateway opens, and verifying a
//! gateway callback before durably creating the order. Order creation
//! is keyed by intent reference, so verifying the same intent twice can
//! never create a second order.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use cart::{LineItem, Money};
use common::UserId;

use crate::error::CheckoutError;
use crate::services::offline_signature;

/// Request to reserve a payment intent for an amount.
#[derive(Debug, Clone)]
pub struct ReserveIntentRequest {
    /// Total to be paid (subtotal + shipping).
    pub amount: Money,

    /// Customer full name.
    pub customer_name: String,

    /// Customer email.
    pub customer_email: String,

    /// Customer phone.
    pub customer_phone: String,
}

/// A reserved payment intent.
#[derive(Debug, Clone)]
pub struct IntentReservation {
    /// Opaque reference correlating the gateway callback to this intent.
    pub intent_ref: String,

    /// Public key the gateway widget is opened with.
    pub gateway_key: String,

    /// The reserved amount.
    pub amount: Money,

    /// ISO currency code.
    pub currency: String,
}

/// Shipping address fields on the order payload.
#[derive(Debug, Clone)]
pub struct OrderAddress {
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

/// Totals breakdown on the order payload.
#[derive(Debug, Clone)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub shipping_charge: Money,
    pub total: Money,
}

/// The full order as submitted for verification.
#[derive(Debug, Clone)]
pub struct OrderPayload {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub address: OrderAddress,
    pub lines: Vec<LineItem>,
    pub totals: OrderTotals,

    /// Authenticated user, when the cart's scope had one.
    pub user_id: Option<UserId>,
}

/// Request to verify a gateway callback and create the order.
#[derive(Debug, Clone)]
pub struct VerifyPaymentRequest {
    /// Payment reference from the gateway callback.
    pub payment_ref: String,

    /// Intent reference from the gateway callback.
    pub intent_ref: String,

    /// Cryptographic signature over the payment/intent pair.
    pub signature: String,

    /// The order to create once the signature checks out.
    pub order: OrderPayload,
}

/// A durably created order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedOrder {
    /// Order number surfaced to the shopper.
    pub order_number: String,
}

/// Trait for the external order service.
#[async_trait]
pub trait OrderService: Send + Sync {
    /// Reserves a payment intent for `amount` plus contact metadata.
    async fn reserve_intent(
        &self,
        request: ReserveIntentRequest,
    ) -> Result<IntentReservation, CheckoutError>;

    /// Verifies a gateway callback and durably creates the order.
    ///
    /// Must be idempotent per intent reference: a duplicate call for an
    /// already-created order returns the existing order number.
    async fn verify_and_create(
        &self,
        request: VerifyPaymentRequest,
    ) -> Result<VerifiedOrder, CheckoutError>;
}

#[derive(Debug, Default)]
struct InMemoryOrderState {
    intents: HashMap<String, Money>,
    orders: HashMap<String, VerifiedOrder>,
    last_verify: Option<VerifyPaymentRequest>,
    next_intent: u32,
    next_order: u32,
    fail_on_reserve: bool,
    fail_on_verify: bool,
}

/// In-memory order service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderService {
    state: Arc<RwLock<InMemoryOrderState>>,
}

impl InMemoryOrderService {
    /// Creates a new in-memory order service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the service to fail on the next reserve call.
    pub fn set_fail_on_reserve(&self, fail: bool) {
        self.state.write().unwrap().fail_on_reserve = fail;
    }

    /// Configures the service to fail on the next verify call.
    pub fn set_fail_on_verify(&self, fail: bool) {
        self.state.write().unwrap().fail_on_verify = fail;
    }

    /// Returns the number of reserved intents.
    pub fn intent_count(&self) -> usize {
        self.state.read().unwrap().intents.len()
    }

    /// Returns the number of created orders.
    pub fn order_count(&self) -> usize {
        self.state.read().unwrap().orders.len()
    }

    /// Returns the reserved amount for an intent.
    pub fn intent_amount(&self, intent_ref: &str) -> Option<Money> {
        self.state.read().unwrap().intents.get(intent_ref).copied()
    }

    /// Returns the order created for an intent, if any.
    pub fn order_for_intent(&self, intent_ref: &str) -> Option<VerifiedOrder> {
        self.state.read().unwrap().orders.get(intent_ref).cloned()
    }

    /// Returns the most recent verification request.
    pub fn last_verify_request(&self) -> Option<VerifyPaymentRequest> {
        self.state.read().unwrap().last_verify.clone()
    }
}

#[async_trait]
impl OrderService for InMemoryOrderService {
    async fn reserve_intent(
        &self,
        request: ReserveIntentRequest,
    ) -> Result<IntentReservation, CheckoutError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_reserve {
            return Err(CheckoutError::OrderService(
                "Failed to create payment order".to_string(),
            ));
        }

        state.next_intent += 1;
        let intent_ref = format!("INT-{:04}", state.next_intent);
        state.intents.insert(intent_ref.clone(), request.amount);

        Ok(IntentReservation {
            intent_ref,
            gateway_key: "key_test".to_string(),
            amount: request.amount,
            currency: "INR".to_string(),
        })
    }

    async fn verify_and_create(
        &self,
        request: VerifyPaymentRequest,
    ) -> Result<VerifiedOrder, CheckoutError> {
        let mut state = self.state.write().unwrap();
        state.last_verify = Some(request.clone());

        if state.fail_on_verify {
            return Err(CheckoutError::OrderService(
                "Payment verification failed".to_string(),
            ));
        }

        if !state.intents.contains_key(&request.intent_ref) {
            return Err(CheckoutError::UnknownIntent(request.intent_ref.clone()));
        }

        let expected = offline_signature(&request.intent_ref, &request.payment_ref);
        if request.signature != expected {
            return Err(CheckoutError::VerificationRejected(
                "signature mismatch".to_string(),
            ));
        }

        // Idempotent per intent: a duplicate verification returns the
        // order that already exists.
        if let Some(existing) = state.orders.get(&request.intent_ref) {
            return Ok(existing.clone());
        }

        state.next_order += 1;
        let order = VerifiedOrder {
            order_number: format!("ORD-{:04}", state.next_order),
        };
        state.orders.insert(request.intent_ref.clone(), order.clone());

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reserve_request(amount: Money) -> ReserveIntentRequest {
        ReserveIntentRequest {
            amount,
            customer_name: "Asha Rao".to_string(),
            customer_email: "asha@example.com".to_string(),
            customer_phone: "9876543210".to_string(),
        }
    }

    fn verify_request(intent_ref: &str, payment_ref: &str) -> VerifyPaymentRequest {
        VerifyPaymentRequest {
            payment_ref: payment_ref.to_string(),
            intent_ref: intent_ref.to_string(),
            signature: offline_signature(intent_ref, payment_ref),
            order: OrderPayload {
                customer_name: "Asha Rao".to_string(),
                customer_email: "asha@example.com".to_string(),
                customer_phone: "9876543210".to_string(),
                address: OrderAddress {
                    address: "12 Pottery Lane".to_string(),
                    city: "Bengaluru".to_string(),
                    state: "Karnataka".to_string(),
                    pincode: "560001".to_string(),
                },
                lines: Vec::new(),
                totals: OrderTotals {
                    subtotal: Money::from_rupees(1500),
                    shipping_charge: Money::from_rupees(100),
                    total: Money::from_rupees(1600),
                },
                user_id: None,
            },
        }
    }

    #[tokio::test]
    async fn test_reserve_and_verify() {
        let service = InMemoryOrderService::new();

        let reservation = service
            .reserve_intent(reserve_request(Money::from_rupees(1600)))
            .await
            .unwrap();
        assert_eq!(reservation.intent_ref, "INT-0001");
        assert_eq!(reservation.currency, "INR");
        assert_eq!(service.intent_count(), 1);

        let order = service
            .verify_and_create(verify_request(&reservation.intent_ref, "PAY-0001"))
            .await
            .unwrap();
        assert_eq!(order.order_number, "ORD-0001");
        assert_eq!(service.order_count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_verification_returns_same_order() {
        let service = InMemoryOrderService::new();
        let reservation = service
            .reserve_intent(reserve_request(Money::from_rupees(1600)))
            .await
            .unwrap();

        let first = service
            .verify_and_create(verify_request(&reservation.intent_ref, "PAY-0001"))
            .await
            .unwrap();
        let second = service
            .verify_and_create(verify_request(&reservation.intent_ref, "PAY-0001"))
            .await
            .unwrap();

        assert_eq!(first.order_number, second.order_number);
        assert_eq!(service.order_count(), 1);
    }

    #[tokio::test]
    async fn test_bad_signature_rejected() {
        let service = InMemoryOrderService::new();
        let reservation = service
            .reserve_intent(reserve_request(Money::from_rupees(1600)))
            .await
            .unwrap();

        let mut request = verify_request(&reservation.intent_ref, "PAY-0001");
        request.signature = "forged".to_string();

        let result = service.verify_and_create(request).await;
        assert!(matches!(result, Err(CheckoutError::VerificationRejected(_))));
        assert_eq!(service.order_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_intent_rejected() {
        let service = InMemoryOrderService::new();
        let result = service
            .verify_and_create(verify_request("INT-9999", "PAY-0001"))
            .await;
        assert!(matches!(result, Err(CheckoutError::UnknownIntent(_))));
    }

    #[tokio::test]
    async fn test_fail_on_reserve() {
        let service = InMemoryOrderService::new();
        service.set_fail_on_reserve(true);

        let result = service
            .reserve_intent(reserve_request(Money::from_rupees(100)))
            .await;
        assert!(matches!(result, Err(CheckoutError::OrderService(_))));
        assert_eq!(service.intent_count(), 0);
    }
}

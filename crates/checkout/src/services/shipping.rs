//! Shipping rate service trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use cart::{Money, ProductId};

use crate::error::CheckoutError;

/// One shippable product line in a rate request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateItem {
    /// The catalog product.
    pub product_id: ProductId,

    /// Units of that product.
    pub quantity: u32,
}

/// Request for a shipping quote.
///
/// Only product lines appear; workshop bookings are not physically
/// shipped and carry no shipping weight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateRequest {
    /// Shippable lines as `(product, quantity)` pairs.
    pub items: Vec<RateItem>,

    /// Cart subtotal at quote time.
    pub subtotal: Money,
}

/// Trait for the external shipping rate service.
#[async_trait]
pub trait ShippingRateService: Send + Sync {
    /// Quotes a shipping charge for the given lines.
    async fn shipping_charge(&self, request: RateRequest) -> Result<Money, CheckoutError>;
}

#[derive(Debug)]
struct InMemoryShippingState {
    charge: Money,
    fail_on_quote: bool,
    requests: Vec<RateRequest>,
}

/// In-memory shipping rate service for testing.
#[derive(Debug, Clone)]
pub struct InMemoryShippingRateService {
    state: Arc<RwLock<InMemoryShippingState>>,
}

impl InMemoryShippingRateService {
    /// Creates a service quoting a flat ₹100 charge.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryShippingState {
                charge: Money::from_rupees(100),
                fail_on_quote: false,
                requests: Vec::new(),
            })),
        }
    }

    /// Configures the flat charge returned by subsequent quotes.
    pub fn set_charge(&self, charge: Money) {
        self.state.write().unwrap().charge = charge;
    }

    /// Configures the service to fail on subsequent quote calls.
    pub fn set_fail_on_quote(&self, fail: bool) {
        self.state.write().unwrap().fail_on_quote = fail;
    }

    /// Returns the number of quote requests received.
    pub fn request_count(&self) -> usize {
        self.state.read().unwrap().requests.len()
    }

    /// Returns the most recent quote request.
    pub fn last_request(&self) -> Option<RateRequest> {
        self.state.read().unwrap().requests.last().cloned()
    }
}

impl Default for InMemoryShippingRateService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ShippingRateService for InMemoryShippingRateService {
    async fn shipping_charge(&self, request: RateRequest) -> Result<Money, CheckoutError> {
        let mut state = self.state.write().unwrap();
        state.requests.push(request);

        if state.fail_on_quote {
            return Err(CheckoutError::ShippingService(
                "Shipping rate service unavailable".to_string(),
            ));
        }

        Ok(state.charge)
    }
}

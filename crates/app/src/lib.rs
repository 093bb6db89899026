//! Composition root for the storefront cart and checkout core.
//!
//! There is no ambient singleton: one [`SharedStorage`] and one set of
//! external services are created per application session, and every
//! execution context (tab) gets its own store, synchronizer, session,
//! and orchestrator wired from them explicitly.

pub mod config;

pub use config::Config;

use cart::{CartStore, CartSynchronizer, InMemoryIdentityProvider};
use cart_storage::{SharedStorage, StorageHandle};
use checkout::{
    CheckoutOrchestrator, CheckoutSession, InMemoryOrderService, InMemoryPaymentGateway,
    InMemoryShippingRateService, PricingEngine,
};

/// The external collaborators a storefront session talks to.
///
/// In-memory implementations stand in for the real shipping, order,
/// and gateway endpoints in tests and the demo shell.
#[derive(Clone)]
pub struct ExternalServices {
    pub rates: InMemoryShippingRateService,
    pub orders: InMemoryOrderService,
    pub gateway: InMemoryPaymentGateway,
}

impl ExternalServices {
    /// Creates a fresh set of in-memory services.
    pub fn new() -> Self {
        Self {
            rates: InMemoryShippingRateService::new(),
            orders: InMemoryOrderService::new(),
            gateway: InMemoryPaymentGateway::new(),
        }
    }
}

impl Default for ExternalServices {
    fn default() -> Self {
        Self::new()
    }
}

/// One execution context's fully wired storefront core.
pub struct StorefrontContext {
    pub store: CartStore<StorageHandle>,
    pub sync: CartSynchronizer,
    pub session: CheckoutSession,
    pub orchestrator: CheckoutOrchestrator<
        InMemoryShippingRateService,
        InMemoryOrderService,
        InMemoryPaymentGateway,
    >,
}

impl StorefrontContext {
    /// Drains pending identity transitions and cross-context edits.
    pub fn pump(&mut self) {
        self.sync.pump(&mut self.store);
    }
}

/// Opens a new execution context against the shared storage, identity
/// provider, and external services.
pub fn open_context(
    storage: &SharedStorage,
    provider: &InMemoryIdentityProvider,
    services: &ExternalServices,
    config: &Config,
) -> StorefrontContext {
    let handle = storage.attach();
    let sync = CartSynchronizer::new(provider, &handle);
    let store = CartStore::new(handle);

    let pricing = PricingEngine::new(services.rates.clone(), config.fallback_shipping());
    let orchestrator =
        CheckoutOrchestrator::new(pricing, services.orders.clone(), services.gateway.clone());

    StorefrontContext {
        store,
        sync,
        session: CheckoutSession::new(),
        orchestrator,
    }
}

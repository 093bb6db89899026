//! Pricing engine: subtotal plus shipping quote with fixed fallback.

use cart::{LineItem, LineKind, Money};

use crate::services::{RateItem, RateRequest, ShippingRateService};

/// Derives the checkout-time price breakdown from a cart snapshot.
///
/// Shipping is quoted by the external rate service; a quote failure is
/// a degraded-but-continuable condition covered by a fixed fallback
/// charge. Quote recomputation is last-write-wins against the cart
/// revision: a quote resolving for an older snapshot than one already
/// applied is discarded.
pub struct PricingEngine<R: ShippingRateService> {
    rates: R,
    fallback_charge: Money,
    applied_revision: Option<u64>,
    shipping: Option<Money>,
}

impl<R: ShippingRateService> PricingEngine<R> {
    /// Creates a pricing engine with the given fallback charge.
    pub fn new(rates: R, fallback_charge: Money) -> Self {
        Self {
            rates,
            fallback_charge,
            applied_revision: None,
            shipping: None,
        }
    }

    /// Sum of line totals.
    pub fn subtotal(lines: &[LineItem]) -> Money {
        lines
            .iter()
            .fold(Money::zero(), |sum, line| sum + line.line_total())
    }

    /// The currently applied shipping charge, if any quote has landed.
    pub fn shipping(&self) -> Option<Money> {
        self.shipping
    }

    /// Requests a fresh shipping quote for the snapshot at `revision`.
    ///
    /// Workshop bookings carry no shipping weight and are excluded from
    /// the request. Returns the charge in effect after this call.
    pub async fn refresh_shipping(&mut self, lines: &[LineItem], revision: u64) -> Money {
        let request = RateRequest {
            items: lines
                .iter()
                .filter_map(|line| match &line.kind {
                    LineKind::Product { product_id } => Some(RateItem {
                        product_id: product_id.clone(),
                        quantity: line.quantity,
                    }),
                    LineKind::WorkshopBooking { .. } => None,
                })
                .collect(),
            subtotal: Self::subtotal(lines),
        };

        let charge = match self.rates.shipping_charge(request).await {
            Ok(charge) => charge,
            Err(error) => {
                tracing::warn!(%error, fallback = %self.fallback_charge, "shipping quote failed, applying fallback");
                metrics::counter!("shipping_quote_fallbacks").increment(1);
                self.fallback_charge
            }
        };

        // Last-write-wins: this quote resolved after a newer snapshot's
        // quote was already applied, so it is stale.
        if let Some(applied) = self.applied_revision
            && applied > revision
        {
            tracing::debug!(revision, applied, "discarding stale shipping quote");
            return self.shipping.unwrap_or(self.fallback_charge);
        }

        self.applied_revision = Some(revision);
        self.shipping = Some(charge);
        charge
    }
}

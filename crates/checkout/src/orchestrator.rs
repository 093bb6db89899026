//! Checkout orchestrator.

use cart::CartStore;
use cart_storage::CartStorage;

use crate::form::CheckoutForm;
use crate::pricing::PricingEngine;
use crate::services::{
    GatewayInvocation, GatewayOutcome, GatewayPrefill, OrderAddress, OrderPayload, OrderService,
    OrderTotals, PaymentGateway, ReserveIntentRequest, ShippingRateService, VerifyPaymentRequest,
};
use crate::session::{CheckoutFailure, CheckoutSession};
use crate::state::CheckoutState;

/// How one submit resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// Validation failed or the cart was empty; field errors are on the
    /// session and nothing was sent over the network.
    Invalid,

    /// Submit ignored: an attempt is already in flight, or the session
    /// ended in a terminal state and needs replacing.
    Ignored,

    /// Order created; the cart has been cleared.
    Succeeded { order_number: String },

    /// The shopper dismissed the payment widget; the session is back in
    /// editing with the cart untouched.
    Cancelled,

    /// The attempt failed. `retryable` distinguishes failures the
    /// shopper can simply resubmit from a verification failure, where a
    /// payment may exist without an order and `payment_ref` must reach
    /// support.
    Failed {
        message: String,
        payment_ref: Option<String>,
        retryable: bool,
    },
}

/// Drives a single checkout attempt from validated input to a terminal
/// payment outcome, exactly once per attempt.
///
/// The payment intent is reserved before the gateway opens, and the
/// order record is only created inside verification, keyed by the
/// intent reference. Verification is issued at most once per gateway
/// callback: `collect_payment` resolves once, and the sole
/// `verify_and_create` call site is gated behind it.
pub struct CheckoutOrchestrator<R, O, G>
where
    R: ShippingRateService,
    O: OrderService,
    G: PaymentGateway,
{
    pricing: PricingEngine<R>,
    orders: O,
    gateway: G,
}

impl<R, O, G> CheckoutOrchestrator<R, O, G>
where
    R: ShippingRateService,
    O: OrderService,
    G: PaymentGateway,
{
    /// Creates a new orchestrator.
    pub fn new(pricing: PricingEngine<R>, orders: O, gateway: G) -> Self {
        Self {
            pricing,
            orders,
            gateway,
        }
    }

    /// Runs one checkout attempt for `session` against the live store.
    ///
    /// The attempt snapshots the cart up front and operates on the
    /// snapshot throughout; concurrent store mutations (another tab)
    /// cannot shift what is priced, reserved, or submitted. Success is
    /// the only path that clears the cart.
    #[tracing::instrument(skip_all, fields(attempt_id = %session.attempt_id()))]
    pub async fn submit<S: CartStorage>(
        &mut self,
        session: &mut CheckoutSession,
        form: CheckoutForm,
        store: &mut CartStore<S>,
    ) -> CheckoutOutcome {
        metrics::counter!("checkout_attempts_total").increment(1);
        let started = std::time::Instant::now();

        // At most one in-flight attempt per session; terminal sessions
        // are never resurrected.
        if !session.state().can_submit() {
            tracing::debug!(state = %session.state(), "submit ignored");
            return CheckoutOutcome::Ignored;
        }

        if !self.gateway.is_available() {
            tracing::warn!("payment gateway SDK unavailable, submission disabled");
            session.record_failure(CheckoutFailure {
                message: "Payment system failed to load. Please retry.".to_string(),
                payment_ref: None,
            });
            return CheckoutOutcome::Failed {
                message: "Payment system failed to load. Please retry.".to_string(),
                payment_ref: None,
                retryable: true,
            };
        }

        session.begin_attempt(form, store.snapshot());

        let errors = session.form().validate();
        if !errors.is_empty() {
            tracing::debug!(violations = errors.len(), "validation failed");
            session.reject_validation(errors);
            return CheckoutOutcome::Invalid;
        }

        let snapshot = match session.snapshot() {
            Some(snapshot) if !snapshot.is_empty() => snapshot.clone(),
            _ => {
                tracing::warn!("submission with an empty cart refused");
                session.reopen_for_editing();
                return CheckoutOutcome::Invalid;
            }
        };

        // Price the snapshot: subtotal locally, shipping from the rate
        // service with its fixed fallback.
        let subtotal = snapshot.subtotal();
        let shipping = self
            .pricing
            .refresh_shipping(&snapshot.lines, snapshot.revision)
            .await;
        session.set_shipping_quote(shipping);
        let total = subtotal + shipping;

        session.transition(CheckoutState::AwaitingIntent);
        let reservation = match self
            .orders
            .reserve_intent(ReserveIntentRequest {
                amount: total,
                customer_name: session.form().customer_name(),
                customer_email: session.form().email.clone(),
                customer_phone: session.form().phone.clone(),
            })
            .await
        {
            Ok(reservation) => reservation,
            Err(error) => {
                tracing::warn!(%error, "payment intent reservation failed");
                metrics::counter!("checkout_failed").increment(1);
                return Self::conclude_retryable(
                    session,
                    "Could not start the payment. Please try again.".to_string(),
                );
            }
        };
        session.set_intent_ref(reservation.intent_ref.clone());

        session.transition(CheckoutState::AwaitingGatewayResult);
        let invocation = GatewayInvocation {
            gateway_key: reservation.gateway_key,
            amount: reservation.amount,
            currency: reservation.currency,
            intent_ref: reservation.intent_ref,
            prefill: GatewayPrefill {
                name: session.form().customer_name(),
                email: session.form().email.clone(),
                contact: session.form().phone.clone(),
            },
        };

        let callback = match self.gateway.collect_payment(invocation).await {
            GatewayOutcome::Dismissed => {
                tracing::info!("payment widget dismissed by shopper");
                session.transition(CheckoutState::Cancelled);
                session.reopen_for_editing();
                return CheckoutOutcome::Cancelled;
            }
            GatewayOutcome::Failed(reason) => {
                tracing::warn!(%reason, "gateway reported payment failure");
                metrics::counter!("checkout_failed").increment(1);
                return Self::conclude_retryable(session, reason);
            }
            GatewayOutcome::Completed(callback) => callback,
        };

        // The callback's success claim is not trusted on its own; the
        // order service checks the signature and creates the order.
        session.transition(CheckoutState::Verifying);
        let payload = Self::order_payload(session, &snapshot, subtotal, shipping, total);
        match self
            .orders
            .verify_and_create(VerifyPaymentRequest {
                payment_ref: callback.payment_ref.clone(),
                intent_ref: callback.intent_ref,
                signature: callback.signature,
                order: payload,
            })
            .await
        {
            Ok(verified) => {
                session.transition(CheckoutState::Succeeded);
                session.set_order_number(verified.order_number.clone());
                store.clear();

                metrics::counter!("checkout_succeeded").increment(1);
                metrics::histogram!("checkout_duration_seconds")
                    .record(started.elapsed().as_secs_f64());
                tracing::info!(order_number = %verified.order_number, "checkout succeeded");

                CheckoutOutcome::Succeeded {
                    order_number: verified.order_number,
                }
            }
            Err(error) => {
                // Money may have moved without an order record. Keep
                // the payment reference visible and leave the cart
                // alone so the attempt's contents are not lost.
                let message = format!(
                    "Payment received but order creation failed. Contact support with payment reference {}.",
                    callback.payment_ref
                );
                tracing::error!(%error, payment_ref = %callback.payment_ref, "payment verification failed");
                metrics::counter!("checkout_failed").increment(1);

                session.transition(CheckoutState::Failed);
                session.record_failure(CheckoutFailure {
                    message: message.clone(),
                    payment_ref: Some(callback.payment_ref.clone()),
                });

                CheckoutOutcome::Failed {
                    message,
                    payment_ref: Some(callback.payment_ref),
                    retryable: false,
                }
            }
        }
    }

    /// Records a retryable failure and reopens the session for editing.
    fn conclude_retryable(session: &mut CheckoutSession, message: String) -> CheckoutOutcome {
        session.transition(CheckoutState::Failed);
        session.record_failure(CheckoutFailure {
            message: message.clone(),
            payment_ref: None,
        });
        session.reopen_for_editing();
        CheckoutOutcome::Failed {
            message,
            payment_ref: None,
            retryable: true,
        }
    }

    fn order_payload(
        session: &CheckoutSession,
        snapshot: &cart::CartSnapshot,
        subtotal: cart::Money,
        shipping: cart::Money,
        total: cart::Money,
    ) -> OrderPayload {
        let form = session.form();
        OrderPayload {
            customer_name: form.customer_name(),
            customer_email: form.email.clone(),
            customer_phone: form.phone.clone(),
            address: OrderAddress {
                address: form.address.clone(),
                city: form.city.clone(),
                state: form.state.clone(),
                pincode: form.pincode.clone(),
            },
            lines: snapshot.lines.clone(),
            totals: OrderTotals {
                subtotal,
                shipping_charge: shipping,
                total,
            },
            user_id: snapshot.user_id().cloned(),
        }
    }
}

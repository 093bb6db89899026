//! Headless demo shell: two simulated tabs share one cart through the
//! storage medium, then one of them drives a full checkout.

use app::{Config, ExternalServices, open_context};
use cart::{InMemoryIdentityProvider, LineItem, Money};
use cart_storage::SharedStorage;
use checkout::{CheckoutForm, CheckoutOutcome};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() {
    // 1. Initialize tracing
    let config = Config::from_env();
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. One shared storage + identity provider + external services per
    //    application session; two open tabs
    let storage = SharedStorage::new();
    let provider = InMemoryIdentityProvider::new();
    let services = ExternalServices::new();

    let mut tab_a = open_context(&storage, &provider, &services, &config);
    let mut tab_b = open_context(&storage, &provider, &services, &config);

    // 4. Identity settles to guest; both tabs adopt the scope
    provider.resolve_guest();
    tab_a.pump();
    tab_b.pump();

    // 5. Shop in tab A
    tab_a
        .store
        .add_item(LineItem::product(
            "prod-1",
            "Stoneware Bowl",
            Money::from_rupees(700),
            2,
        ))
        .expect("add to cart failed");
    tab_a
        .store
        .add_item(LineItem::product(
            "prod-2",
            "Bud Vase",
            Money::from_rupees(100),
            1,
        ))
        .expect("add to cart failed");

    // 6. Tab B catches up and checks out
    tab_b.pump();
    tracing::info!(
        count = tab_b.store.count(),
        total = %tab_b.store.total(),
        "tab B sees the shared cart"
    );

    let form = CheckoutForm {
        first_name: "Asha".to_string(),
        last_name: "Rao".to_string(),
        phone: "9876543210".to_string(),
        email: "asha@example.com".to_string(),
        address: "12 Pottery Lane".to_string(),
        city: "Bengaluru".to_string(),
        state: "Karnataka".to_string(),
        pincode: "560001".to_string(),
    };

    let outcome = tab_b
        .orchestrator
        .submit(&mut tab_b.session, form, &mut tab_b.store)
        .await;

    match outcome {
        CheckoutOutcome::Succeeded { order_number } => {
            tracing::info!(%order_number, "checkout complete");
        }
        other => tracing::warn!(?other, "checkout did not complete"),
    }

    // 7. The cleared cart propagates back to tab A
    tab_a.pump();
    tracing::info!(count = tab_a.store.count(), "tab A after checkout");

    // 8. Dump collected metrics
    println!("{}", metrics_handle.render());
}

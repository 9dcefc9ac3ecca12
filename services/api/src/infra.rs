use bistro::reputation::{
    DishId, DishListing, EnginePolicy, InMemoryCatalog, InMemoryStore, ReputationEngine,
};
use metrics_exporter_prometheus::PrometheusHandle;
use rust_decimal::Decimal;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type InMemoryEngine = ReputationEngine<InMemoryStore, InMemoryCatalog>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Menu the service starts with until the menu module is wired in.
pub(crate) fn seeded_menu() -> InMemoryCatalog {
    let dish = |id: &str, name: &str, cents: i64, vip_only: bool| DishListing {
        dish_id: DishId(id.to_string()),
        name: name.to_string(),
        price: Decimal::new(cents, 2),
        available: true,
        vip_only,
    };

    InMemoryCatalog::with_dishes([
        dish("dish-ramen", "Tonkotsu Ramen", 2000, false),
        dish("dish-salad", "Garden Salad", 1000, false),
        dish("dish-curry", "Green Curry", 1850, false),
        dish("dish-dumplings", "Pork Dumplings", 950, false),
        dish("dish-truffle", "Truffle Risotto", 4200, true),
    ])
}

pub(crate) fn in_memory_engine(
    store: Arc<InMemoryStore>,
    policy: EnginePolicy,
) -> Arc<InMemoryEngine> {
    Arc::new(ReputationEngine::new(store, Arc::new(seeded_menu()), policy))
}

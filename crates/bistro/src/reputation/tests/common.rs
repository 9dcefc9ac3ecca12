use std::str::FromStr;
use std::sync::Arc;

use axum::response::Response;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::reputation::domain::{
    AccountId, AccountRecord, AccountRole, DishId, DishListing, FeedbackId, FeedbackItem,
    FeedbackSubmission, FeedbackTargetKind, MembershipTier, Order, OrderId, WarningEntry,
};
use crate::reputation::memory::{InMemoryCatalog, InMemoryStore};
use crate::reputation::repository::{
    AccountRepository, DishCatalog, FeedbackRepository, OrderRepository, RepositoryError,
};
use crate::reputation::{EnginePolicy, ReputationEngine};

pub(super) const RAMEN: &str = "dish-ramen";
pub(super) const SALAD: &str = "dish-salad";
pub(super) const CURRY: &str = "dish-curry";
pub(super) const TRUFFLE: &str = "dish-truffle";

pub(super) fn money(raw: &str) -> Decimal {
    Decimal::from_str(raw).expect("valid decimal literal")
}

pub(super) fn account_id(raw: &str) -> AccountId {
    AccountId(raw.to_string())
}

pub(super) fn dish_id(raw: &str) -> DishId {
    DishId(raw.to_string())
}

fn listing(id: &str, name: &str, price: &str, vip_only: bool) -> DishListing {
    DishListing {
        dish_id: dish_id(id),
        name: name.to_string(),
        price: money(price),
        available: true,
        vip_only,
    }
}

pub(super) fn menu() -> InMemoryCatalog {
    InMemoryCatalog::with_dishes([
        listing(RAMEN, "Tonkotsu Ramen", "20.00", false),
        listing(SALAD, "Garden Salad", "10.00", false),
        listing(CURRY, "Green Curry", "30.00", false),
        listing(TRUFFLE, "Truffle Risotto", "40.00", true),
    ])
}

pub(super) struct Harness {
    pub(super) engine: ReputationEngine<InMemoryStore, InMemoryCatalog>,
    pub(super) store: Arc<InMemoryStore>,
    pub(super) catalog: Arc<InMemoryCatalog>,
}

impl Harness {
    pub(super) fn new() -> Self {
        let store = Arc::new(InMemoryStore::default());
        let catalog = Arc::new(menu());
        let engine = ReputationEngine::new(store.clone(), catalog.clone(), EnginePolicy::default());
        Self {
            engine,
            store,
            catalog,
        }
    }

    /// Insert a customer whose reputation fields are adjusted by `configure`.
    pub(super) fn customer(
        &self,
        id: &str,
        configure: impl FnOnce(&mut AccountRecord),
    ) -> AccountId {
        let mut record = AccountRecord::registered(account_id(id), AccountRole::Customer);
        configure(&mut record);
        self.store.insert_account(record).expect("account seeded");
        account_id(id)
    }

    pub(super) fn vip(&self, id: &str, warnings: u32) -> AccountId {
        self.customer(id, |record| {
            record.tier = MembershipTier::Vip;
            record.warnings = warnings;
        })
    }

    pub(super) fn registered(&self, id: &str) -> AccountId {
        self.customer(id, |_| {})
    }

    pub(super) fn record(&self, id: &AccountId) -> AccountRecord {
        self.store
            .fetch_account(id)
            .expect("fetch succeeds")
            .expect("account present")
    }

    pub(super) fn item(&self, id: &FeedbackId) -> FeedbackItem {
        self.store
            .fetch_feedback(id)
            .expect("fetch succeeds")
            .expect("feedback present")
    }

    pub(super) fn cart(&self, id: &AccountId) -> Order {
        self.store
            .active_cart(id)
            .expect("fetch succeeds")
            .expect("cart present")
    }

    pub(super) fn add(&self, account: &AccountId, dish: &str, times: usize) {
        for _ in 0..times {
            self.engine
                .checkout_service()
                .add_to_cart(account, &dish_id(dish))
                .expect("dish added");
        }
    }

    pub(super) fn file(
        &self,
        filer: &AccountId,
        target: &AccountId,
        compliment: bool,
    ) -> FeedbackId {
        self.engine
            .file_feedback(feedback(filer, target, compliment))
            .expect("feedback filed")
            .id
    }
}

pub(super) fn feedback(
    filer: &AccountId,
    target: &AccountId,
    compliment: bool,
) -> FeedbackSubmission {
    FeedbackSubmission {
        filer_id: filer.clone(),
        target_kind: FeedbackTargetKind::Customer,
        target_id: target.clone(),
        message: if compliment {
            "Friendly at pickup".to_string()
        } else {
            "Abusive to the driver".to_string()
        },
        is_compliment: compliment,
    }
}

pub(super) struct UnavailableStore;

fn offline() -> RepositoryError {
    RepositoryError::Unavailable("database offline".to_string())
}

impl AccountRepository for UnavailableStore {
    fn insert_account(&self, _record: AccountRecord) -> Result<AccountRecord, RepositoryError> {
        Err(offline())
    }

    fn update_account(&self, _record: AccountRecord) -> Result<(), RepositoryError> {
        Err(offline())
    }

    fn fetch_account(&self, _id: &AccountId) -> Result<Option<AccountRecord>, RepositoryError> {
        Err(offline())
    }

    fn append_warning(&self, _entry: WarningEntry) -> Result<(), RepositoryError> {
        Err(offline())
    }

    fn warning_history(
        &self,
        _account: &AccountId,
    ) -> Result<Vec<WarningEntry>, RepositoryError> {
        Err(offline())
    }
}

impl FeedbackRepository for UnavailableStore {
    fn insert_feedback(&self, _item: FeedbackItem) -> Result<FeedbackItem, RepositoryError> {
        Err(offline())
    }

    fn update_feedback(&self, _item: FeedbackItem) -> Result<(), RepositoryError> {
        Err(offline())
    }

    fn fetch_feedback(&self, _id: &FeedbackId) -> Result<Option<FeedbackItem>, RepositoryError> {
        Err(offline())
    }

    fn feedback_for_target(
        &self,
        _target: &AccountId,
    ) -> Result<Vec<FeedbackItem>, RepositoryError> {
        Err(offline())
    }

    fn pending_feedback(&self, _limit: usize) -> Result<Vec<FeedbackItem>, RepositoryError> {
        Err(offline())
    }
}

impl OrderRepository for UnavailableStore {
    fn open_cart(&self, _cart: Order) -> Result<Order, RepositoryError> {
        Err(offline())
    }

    fn active_cart(&self, _account: &AccountId) -> Result<Option<Order>, RepositoryError> {
        Err(offline())
    }

    fn save_order(&self, _order: Order) -> Result<(), RepositoryError> {
        Err(offline())
    }

    fn fetch_order(&self, _id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        Err(offline())
    }
}

pub(super) struct EmptyMenu;

impl DishCatalog for EmptyMenu {
    fn listing(&self, _dish: &DishId) -> Result<Option<DishListing>, RepositoryError> {
        Ok(None)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn json_money(value: &Value) -> Decimal {
    match value {
        Value::String(raw) => money(raw),
        other => money(&other.to_string()),
    }
}

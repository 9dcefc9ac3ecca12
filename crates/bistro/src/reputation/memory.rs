//! Process-local adapters used by the API service, demos, and integration tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{
    AccountId, AccountRecord, DishId, DishListing, FeedbackId, FeedbackItem, FeedbackStatus,
    Order, OrderId, WarningEntry,
};
use super::repository::{
    AccountRepository, DishCatalog, FeedbackRepository, OrderRepository, RepositoryError,
};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
}

/// Single store backing accounts, the feedback ledger, and orders.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    accounts: Arc<Mutex<HashMap<AccountId, AccountRecord>>>,
    feedback: Arc<Mutex<Vec<FeedbackItem>>>,
    warnings: Arc<Mutex<Vec<WarningEntry>>>,
    orders: Arc<Mutex<HashMap<OrderId, Order>>>,
}

impl InMemoryStore {
    pub fn orders_for(&self, account: &AccountId) -> Result<Vec<Order>, RepositoryError> {
        let guard = lock(&self.orders)?;
        let mut orders: Vec<Order> = guard
            .values()
            .filter(|order| &order.account_id == account)
            .cloned()
            .collect();
        orders.sort_by_key(|order| order.created_at);
        Ok(orders)
    }
}

impl AccountRepository for InMemoryStore {
    fn insert_account(&self, record: AccountRecord) -> Result<AccountRecord, RepositoryError> {
        let mut guard = lock(&self.accounts)?;
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update_account(&self, record: AccountRecord) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.accounts)?;
        match guard.get_mut(&record.id) {
            Some(slot) => {
                *slot = record;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_account(&self, id: &AccountId) -> Result<Option<AccountRecord>, RepositoryError> {
        Ok(lock(&self.accounts)?.get(id).cloned())
    }

    fn append_warning(&self, entry: WarningEntry) -> Result<(), RepositoryError> {
        lock(&self.warnings)?.push(entry);
        Ok(())
    }

    fn warning_history(
        &self,
        account: &AccountId,
    ) -> Result<Vec<WarningEntry>, RepositoryError> {
        let guard = lock(&self.warnings)?;
        Ok(guard
            .iter()
            .filter(|entry| &entry.account_id == account)
            .cloned()
            .collect())
    }
}

impl FeedbackRepository for InMemoryStore {
    fn insert_feedback(&self, item: FeedbackItem) -> Result<FeedbackItem, RepositoryError> {
        let mut guard = lock(&self.feedback)?;
        if guard.iter().any(|existing| existing.id == item.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(item.clone());
        Ok(item)
    }

    fn update_feedback(&self, item: FeedbackItem) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.feedback)?;
        let slot = guard
            .iter_mut()
            .find(|existing| existing.id == item.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = item;
        Ok(())
    }

    fn fetch_feedback(&self, id: &FeedbackId) -> Result<Option<FeedbackItem>, RepositoryError> {
        let guard = lock(&self.feedback)?;
        Ok(guard.iter().find(|item| &item.id == id).cloned())
    }

    fn feedback_for_target(
        &self,
        target: &AccountId,
    ) -> Result<Vec<FeedbackItem>, RepositoryError> {
        let guard = lock(&self.feedback)?;
        let mut items: Vec<FeedbackItem> = guard
            .iter()
            .filter(|item| &item.target_id == target)
            .cloned()
            .collect();
        items.sort_by_key(|item| item.sequence);
        Ok(items)
    }

    fn pending_feedback(&self, limit: usize) -> Result<Vec<FeedbackItem>, RepositoryError> {
        let guard = lock(&self.feedback)?;
        let mut items: Vec<FeedbackItem> = guard
            .iter()
            .filter(|item| item.status == FeedbackStatus::Pending)
            .cloned()
            .collect();
        items.sort_by_key(|item| item.sequence);
        items.truncate(limit);
        Ok(items)
    }
}

impl OrderRepository for InMemoryStore {
    fn open_cart(&self, cart: Order) -> Result<Order, RepositoryError> {
        let mut guard = lock(&self.orders)?;
        let duplicate = guard
            .values()
            .any(|order| order.account_id == cart.account_id && order.is_pending());
        if duplicate || guard.contains_key(&cart.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(cart.id.clone(), cart.clone());
        Ok(cart)
    }

    fn active_cart(&self, account: &AccountId) -> Result<Option<Order>, RepositoryError> {
        let guard = lock(&self.orders)?;
        Ok(guard
            .values()
            .find(|order| &order.account_id == account && order.is_pending())
            .cloned())
    }

    fn save_order(&self, order: Order) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.orders)?;
        if order.is_pending() {
            let other_pending = guard.values().any(|existing| {
                existing.account_id == order.account_id
                    && existing.is_pending()
                    && existing.id != order.id
            });
            if other_pending {
                return Err(RepositoryError::Conflict);
            }
        }
        guard.insert(order.id.clone(), order);
        Ok(())
    }

    fn fetch_order(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(lock(&self.orders)?.get(id).cloned())
    }
}

/// Menu stand-in keyed by dish id.
#[derive(Default, Clone)]
pub struct InMemoryCatalog {
    dishes: Arc<Mutex<HashMap<DishId, DishListing>>>,
}

impl InMemoryCatalog {
    pub fn with_dishes(listings: impl IntoIterator<Item = DishListing>) -> Self {
        let dishes = listings
            .into_iter()
            .map(|listing| (listing.dish_id.clone(), listing))
            .collect();
        Self {
            dishes: Arc::new(Mutex::new(dishes)),
        }
    }

    pub fn upsert(&self, listing: DishListing) -> Result<(), RepositoryError> {
        lock(&self.dishes)?.insert(listing.dish_id.clone(), listing);
        Ok(())
    }

    pub fn set_available(&self, dish: &DishId, available: bool) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.dishes)?;
        let listing = guard.get_mut(dish).ok_or(RepositoryError::NotFound)?;
        listing.available = available;
        Ok(())
    }
}

impl DishCatalog for InMemoryCatalog {
    fn listing(&self, dish: &DishId) -> Result<Option<DishListing>, RepositoryError> {
        Ok(lock(&self.dishes)?.get(dish).cloned())
    }
}

use super::domain::{
    AccountId, AccountRecord, DishId, DishListing, FeedbackId, FeedbackItem, Order, OrderId,
    WarningEntry,
};

/// Account storage and warning history. Only the checkout and feedback services write
/// reputation fields.
pub trait AccountRepository: Send + Sync {
    fn insert_account(&self, record: AccountRecord) -> Result<AccountRecord, RepositoryError>;
    fn update_account(&self, record: AccountRecord) -> Result<(), RepositoryError>;
    fn fetch_account(&self, id: &AccountId) -> Result<Option<AccountRecord>, RepositoryError>;
    fn append_warning(&self, entry: WarningEntry) -> Result<(), RepositoryError>;
    /// Warnings issued to `account`, oldest first.
    fn warning_history(&self, account: &AccountId)
        -> Result<Vec<WarningEntry>, RepositoryError>;
}

/// Append-only feedback ledger.
pub trait FeedbackRepository: Send + Sync {
    fn insert_feedback(&self, item: FeedbackItem) -> Result<FeedbackItem, RepositoryError>;
    fn update_feedback(&self, item: FeedbackItem) -> Result<(), RepositoryError>;
    fn fetch_feedback(&self, id: &FeedbackId) -> Result<Option<FeedbackItem>, RepositoryError>;
    /// Every item filed against `target`, oldest filing first.
    fn feedback_for_target(&self, target: &AccountId)
        -> Result<Vec<FeedbackItem>, RepositoryError>;
    /// Items awaiting a manager decision, oldest filing first.
    fn pending_feedback(&self, limit: usize) -> Result<Vec<FeedbackItem>, RepositoryError>;
}

/// Cart and order storage.
///
/// Implementations must reject a second `Pending` order for the same account with
/// [`RepositoryError::Conflict`], whether it arrives through `open_cart` or `save_order`.
pub trait OrderRepository: Send + Sync {
    fn open_cart(&self, cart: Order) -> Result<Order, RepositoryError>;
    fn active_cart(&self, account: &AccountId) -> Result<Option<Order>, RepositoryError>;
    fn save_order(&self, order: Order) -> Result<(), RepositoryError>;
    fn fetch_order(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError>;
}

/// Dish availability lookup provided by the menu module.
pub trait DishCatalog: Send + Sync {
    fn listing(&self, dish: &DishId) -> Result<Option<DishListing>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

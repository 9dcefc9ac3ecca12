//! Customer standing, feedback resolution, and checkout.
//!
//! Every warning, whether issued by a declined checkout or by a feedback decision, is followed
//! by one pass of [`StatusEvaluator`] inside the affected account's lock. Tier and blacklist
//! changes are decided nowhere else.

pub mod accounts;
pub mod checkout;
pub mod domain;
pub mod evaluation;
pub mod feedback;
pub mod locks;
pub mod memory;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use accounts::AccountService;
pub use checkout::{CartPricing, CartQuote, CheckoutPolicy, CheckoutService};
pub use domain::{
    AccountClosure, AccountId, AccountRecord, AccountRole, AccountStatusView, ClosureReceipt,
    DishId, DishListing, Dispute, FeedbackDecision, FeedbackId, FeedbackItem, FeedbackStatus,
    FeedbackSubmission, FeedbackTargetKind, MembershipTier, Order, OrderId, OrderLine,
    OrderStatus, WarningEntry, WarningReason,
};
pub use evaluation::{
    PromotionReason, StatusEvaluator, StatusOutcome, StatusPolicy, StatusTransition,
};
pub use feedback::FeedbackResolutionService;
pub use locks::AccountLocks;
pub use memory::{InMemoryCatalog, InMemoryStore};
pub use repository::{
    AccountRepository, DishCatalog, FeedbackRepository, OrderRepository, RepositoryError,
};
pub use router::reputation_router;
pub use service::{EnginePolicy, Missing, ReputationEngine, ReputationError};

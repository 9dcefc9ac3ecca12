use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::accounts::AccountService;
use super::checkout::{CheckoutPolicy, CheckoutService};
use super::domain::{
    AccountClosure, AccountId, AccountRecord, AccountRole, AccountStatusView, ClosureReceipt,
    DishId, FeedbackDecision, FeedbackId, FeedbackItem, FeedbackSubmission, FeedbackTargetKind,
    Order, WarningEntry,
};
use super::evaluation::{StatusEvaluator, StatusPolicy};
use super::feedback::FeedbackResolutionService;
use super::locks::AccountLocks;
use super::repository::{
    AccountRepository, DishCatalog, FeedbackRepository, OrderRepository, RepositoryError,
};

/// Tunable business rules for the whole engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnginePolicy {
    pub status: StatusPolicy,
    pub checkout: CheckoutPolicy,
    /// Deposits must stay strictly below this amount.
    pub max_deposit: Decimal,
}

impl Default for EnginePolicy {
    fn default() -> Self {
        Self {
            status: StatusPolicy::default(),
            checkout: CheckoutPolicy::default(),
            max_deposit: Decimal::from(100_000),
        }
    }
}

/// Facade composing the account, feedback, and checkout services over one store.
///
/// All three services share a single [`AccountLocks`] registry so that warnings issued by
/// checkout and by feedback resolution serialize against each other.
pub struct ReputationEngine<S, C> {
    accounts: AccountService<S>,
    feedback: FeedbackResolutionService<S>,
    checkout: CheckoutService<S, C>,
}

impl<S, C> ReputationEngine<S, C>
where
    S: AccountRepository + FeedbackRepository + OrderRepository + 'static,
    C: DishCatalog + 'static,
{
    pub fn new(store: Arc<S>, catalog: Arc<C>, policy: EnginePolicy) -> Self {
        let locks = Arc::new(AccountLocks::default());
        let evaluator = Arc::new(StatusEvaluator::new(policy.status));

        Self {
            accounts: AccountService::new(store.clone(), locks.clone(), policy.max_deposit),
            feedback: FeedbackResolutionService::new(
                store.clone(),
                evaluator.clone(),
                locks.clone(),
            ),
            checkout: CheckoutService::new(store, catalog, evaluator, locks, policy.checkout),
        }
    }

    pub fn accounts(&self) -> &AccountService<S> {
        &self.accounts
    }

    pub fn feedback(&self) -> &FeedbackResolutionService<S> {
        &self.feedback
    }

    pub fn checkout_service(&self) -> &CheckoutService<S, C> {
        &self.checkout
    }

    pub fn file_feedback(
        &self,
        submission: FeedbackSubmission,
    ) -> Result<FeedbackItem, ReputationError> {
        self.feedback.file_feedback(submission)
    }

    pub fn resolve_feedback(
        &self,
        feedback_id: &FeedbackId,
        decision: FeedbackDecision,
    ) -> Result<FeedbackItem, ReputationError> {
        self.feedback.resolve_feedback(feedback_id, decision)
    }

    pub fn resolve_feedback_with_note(
        &self,
        feedback_id: &FeedbackId,
        decision: FeedbackDecision,
        note: Option<String>,
    ) -> Result<FeedbackItem, ReputationError> {
        self.feedback
            .resolve_feedback_with_note(feedback_id, decision, note)
    }

    pub fn checkout(&self, account_id: &AccountId) -> Result<Order, ReputationError> {
        self.checkout.checkout(account_id)
    }

    pub fn account_status(
        &self,
        account_id: &AccountId,
    ) -> Result<AccountStatusView, ReputationError> {
        self.accounts.account_status(account_id)
    }

    pub fn warning_history(
        &self,
        account_id: &AccountId,
    ) -> Result<Vec<WarningEntry>, ReputationError> {
        self.accounts.warning_history(account_id)
    }

    pub fn close_account(
        &self,
        account_id: &AccountId,
        closure: AccountClosure,
    ) -> Result<ClosureReceipt, ReputationError> {
        self.accounts.close_account(account_id, closure)
    }
}

/// Add `entry.count` warnings to `record` and append the entry to its history.
///
/// The caller settles `record` afterwards, inside the same lock scope.
pub(crate) fn issue_warnings<S>(
    store: &S,
    record: &mut AccountRecord,
    entry: WarningEntry,
) -> Result<(), RepositoryError>
where
    S: AccountRepository + ?Sized,
{
    record.warnings = record.warnings.saturating_add(entry.count);
    store.append_warning(entry)
}

/// Evaluate `record`, log any transitions, and persist the result.
pub(crate) fn settle_standing<S>(
    store: &S,
    evaluator: &StatusEvaluator,
    record: AccountRecord,
) -> Result<AccountRecord, RepositoryError>
where
    S: AccountRepository + ?Sized,
{
    let outcome = evaluator.evaluate(&record);
    for transition in &outcome.transitions {
        info!(
            account = %outcome.record.id,
            transition = %transition.summary(),
            "account standing changed"
        );
    }
    store.update_account(outcome.record.clone())?;
    Ok(outcome.record)
}

pub(crate) fn require_account<S>(
    store: &S,
    account_id: &AccountId,
) -> Result<AccountRecord, ReputationError>
where
    S: AccountRepository + ?Sized,
{
    store
        .fetch_account(account_id)?
        .ok_or_else(|| ReputationError::NotFound(Missing::Account(account_id.clone())))
}

/// What a `NotFound` error refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Missing {
    Account(AccountId),
    Feedback(FeedbackId),
    Dish(DishId),
    CartItem(DishId),
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Missing::Account(id) => write!(f, "account {id}"),
            Missing::Feedback(id) => write!(f, "feedback {id}"),
            Missing::Dish(id) => write!(f, "dish {id}"),
            Missing::CartItem(id) => write!(f, "cart item {id}"),
        }
    }
}

/// Business errors returned by the engine.
#[derive(Debug, thiserror::Error)]
pub enum ReputationError {
    #[error("cart is empty")]
    EmptyCart,
    #[error("insufficient balance: order total {required}, available {available}")]
    InsufficientBalance {
        required: Decimal,
        available: Decimal,
    },
    #[error("feedback {0} has already been resolved")]
    AlreadyResolved(FeedbackId),
    #[error("account {0} is blacklisted")]
    AccountBlacklisted(AccountId),
    #[error("account {0} is closed")]
    AccountClosed(AccountId),
    #[error("{0} not found")]
    NotFound(Missing),
    #[error("compliments can only be accepted")]
    UnsupportedDecision,
    #[error("feedback {0} cannot be disputed")]
    NotDisputable(FeedbackId),
    #[error("accounts cannot file feedback about themselves")]
    SelfFeedback,
    #[error("target account is a {}, not a {}", .actual.label(), .submitted.label())]
    TargetKindMismatch {
        submitted: FeedbackTargetKind,
        actual: AccountRole,
    },
    #[error("{0} is currently unavailable")]
    DishUnavailable(String),
    #[error("quantity must be greater than 0")]
    InvalidQuantity,
    #[error("deposit must be positive and below {max}")]
    InvalidDeposit { max: Decimal },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

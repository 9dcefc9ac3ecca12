use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use super::domain::{
    AccountClosure, AccountId, AccountRecord, AccountRole, AccountStatusView, ClosureReceipt,
    OrderStatus, WarningEntry,
};
use super::locks::AccountLocks;
use super::repository::{AccountRepository, OrderRepository};
use super::service::{require_account, ReputationError};

/// Registration hand-off, status reads, deposits, and manager closure.
pub struct AccountService<S> {
    store: Arc<S>,
    locks: Arc<AccountLocks>,
    max_deposit: Decimal,
}

impl<S> AccountService<S>
where
    S: AccountRepository + OrderRepository + 'static,
{
    pub fn new(store: Arc<S>, locks: Arc<AccountLocks>, max_deposit: Decimal) -> Self {
        Self {
            store,
            locks,
            max_deposit,
        }
    }

    pub fn open_account(
        &self,
        account_id: AccountId,
        role: AccountRole,
    ) -> Result<AccountRecord, ReputationError> {
        let record = self
            .store
            .insert_account(AccountRecord::registered(account_id, role))?;
        info!(account = %record.id, role = ?record.role, "account opened");
        Ok(record)
    }

    pub fn account_status(
        &self,
        account_id: &AccountId,
    ) -> Result<AccountStatusView, ReputationError> {
        Ok(require_account(&*self.store, account_id)?.status_view())
    }

    /// Every warning issued to the account, oldest first.
    pub fn warning_history(
        &self,
        account_id: &AccountId,
    ) -> Result<Vec<WarningEntry>, ReputationError> {
        require_account(&*self.store, account_id)?;
        Ok(self.store.warning_history(account_id)?)
    }

    /// Credit `amount` to the balance. Deposits never touch warnings or tier.
    pub fn deposit(
        &self,
        account_id: &AccountId,
        amount: Decimal,
    ) -> Result<AccountStatusView, ReputationError> {
        if amount <= Decimal::ZERO || amount >= self.max_deposit {
            return Err(ReputationError::InvalidDeposit {
                max: self.max_deposit,
            });
        }

        let scope = self.locks.scope([account_id]);
        let _held = scope.enter();

        let mut account = require_account(&*self.store, account_id)?;
        if account.blacklisted {
            return Err(ReputationError::AccountBlacklisted(account.id));
        }
        if account.closed {
            return Err(ReputationError::AccountClosed(account.id));
        }

        account.balance += amount;
        self.store.update_account(account.clone())?;
        info!(
            account = %account.id,
            amount = %amount,
            balance = %account.balance,
            "deposit credited"
        );
        Ok(account.status_view())
    }

    /// Close the account for good. The balance always ends at zero: refunded on
    /// [`AccountClosure::Quit`], seized on [`AccountClosure::Kicked`], which also blacklists.
    /// A pending cart is marked failed.
    pub fn close_account(
        &self,
        account_id: &AccountId,
        closure: AccountClosure,
    ) -> Result<ClosureReceipt, ReputationError> {
        let scope = self.locks.scope([account_id]);
        let _held = scope.enter();

        let mut account = require_account(&*self.store, account_id)?;
        if account.closed {
            return Err(ReputationError::AccountClosed(account.id));
        }

        let released = std::mem::replace(&mut account.balance, Decimal::ZERO);
        let (refunded, seized) = match closure {
            AccountClosure::Quit => (released, Decimal::ZERO),
            AccountClosure::Kicked => {
                account.blacklisted = true;
                (Decimal::ZERO, released)
            }
        };
        account.closed = true;

        if let Some(mut cart) = self.store.active_cart(account_id)? {
            cart.status = OrderStatus::Failed;
            self.store.save_order(cart)?;
        }
        self.store.update_account(account.clone())?;

        warn!(
            account = %account.id,
            closure = closure.label(),
            refunded = %refunded,
            seized = %seized,
            "account closed"
        );
        Ok(ClosureReceipt {
            account: account.status_view(),
            closure,
            refunded,
            seized,
        })
    }
}

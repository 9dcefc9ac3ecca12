use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{
    AccountId, AccountRecord, DishId, Order, OrderId, OrderLine, OrderStatus, WarningEntry,
    WarningReason,
};
use super::evaluation::StatusEvaluator;
use super::locks::AccountLocks;
use super::repository::{AccountRepository, DishCatalog, OrderRepository, RepositoryError};
use super::service::{
    issue_warnings, require_account, settle_standing, Missing, ReputationError,
};

/// Pricing rules applied when a cart is quoted or checked out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutPolicy {
    pub standard_delivery_fee: Decimal,
    pub vip_discount_rate: Decimal,
    /// VIP delivery is free on every Nth completed order; zero disables it.
    pub free_delivery_every: u32,
}

impl Default for CheckoutPolicy {
    fn default() -> Self {
        Self {
            standard_delivery_fee: Decimal::new(500, 2),
            vip_discount_rate: Decimal::new(5, 2),
            free_delivery_every: 3,
        }
    }
}

impl CheckoutPolicy {
    /// Price `lines` for `account`. The discount is rounded once, here, to cents.
    pub fn price(&self, account: &AccountRecord, lines: &[OrderLine]) -> CartPricing {
        let subtotal: Decimal = lines.iter().map(OrderLine::line_total).sum();

        let (discount_amount, free_delivery_applied) = if account.is_vip() {
            let discount = (subtotal * self.vip_discount_rate)
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            let upcoming_order = account.lifetime_order_count.saturating_add(1);
            let free =
                self.free_delivery_every > 0 && upcoming_order % self.free_delivery_every == 0;
            (discount, free)
        } else {
            (Decimal::ZERO, false)
        };

        let delivery_fee = if free_delivery_applied {
            Decimal::ZERO
        } else {
            self.standard_delivery_fee
        };

        CartPricing {
            subtotal,
            discount_amount,
            delivery_fee,
            total: subtotal - discount_amount + delivery_fee,
            vip_discount_applied: account.is_vip(),
            free_delivery_applied,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartPricing {
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
    pub vip_discount_applied: bool,
    pub free_delivery_applied: bool,
}

/// Validated cart preview returned to the cart UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartQuote {
    pub order_id: OrderId,
    pub lines: Vec<OrderLine>,
    #[serde(flatten)]
    pub pricing: CartPricing,
    /// Names of dishes pruned because they are no longer orderable.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<String>,
}

static ORDER_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_order_id() -> OrderId {
    let id = ORDER_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    OrderId(format!("ord-{id:06}"))
}

/// Cart maintenance, pricing, and payment against the account balance.
pub struct CheckoutService<S, C> {
    store: Arc<S>,
    catalog: Arc<C>,
    evaluator: Arc<StatusEvaluator>,
    locks: Arc<AccountLocks>,
    policy: CheckoutPolicy,
}

impl<S, C> CheckoutService<S, C>
where
    S: AccountRepository + OrderRepository + 'static,
    C: DishCatalog + 'static,
{
    pub fn new(
        store: Arc<S>,
        catalog: Arc<C>,
        evaluator: Arc<StatusEvaluator>,
        locks: Arc<AccountLocks>,
        policy: CheckoutPolicy,
    ) -> Self {
        Self {
            store,
            catalog,
            evaluator,
            locks,
            policy,
        }
    }

    pub fn policy(&self) -> &CheckoutPolicy {
        &self.policy
    }

    /// Add one unit of `dish_id`, opening the account's cart if it has none.
    pub fn add_to_cart(
        &self,
        account_id: &AccountId,
        dish_id: &DishId,
    ) -> Result<Order, ReputationError> {
        let scope = self.locks.scope([account_id]);
        let _held = scope.enter();

        let account = self.require_active(account_id)?;
        let listing = self
            .catalog
            .listing(dish_id)?
            .ok_or_else(|| ReputationError::NotFound(Missing::Dish(dish_id.clone())))?;
        if !listing.orderable_by(account.tier) {
            return Err(ReputationError::DishUnavailable(listing.name));
        }

        let mut cart = self.cart_for(account_id)?;
        match cart.line_mut(dish_id) {
            Some(line) => line.quantity = line.quantity.saturating_add(1),
            None => cart.lines.push(OrderLine {
                dish_id: listing.dish_id,
                dish_name: listing.name,
                unit_price: listing.price,
                quantity: 1,
            }),
        }

        self.store.save_order(cart.clone())?;
        Ok(cart)
    }

    pub fn update_cart_item(
        &self,
        account_id: &AccountId,
        dish_id: &DishId,
        quantity: u32,
    ) -> Result<Order, ReputationError> {
        if quantity == 0 {
            return Err(ReputationError::InvalidQuantity);
        }

        let scope = self.locks.scope([account_id]);
        let _held = scope.enter();

        self.require_active(account_id)?;
        let missing = || ReputationError::NotFound(Missing::CartItem(dish_id.clone()));
        let mut cart = self.store.active_cart(account_id)?.ok_or_else(missing)?;
        cart.line_mut(dish_id).ok_or_else(missing)?.quantity = quantity;

        self.store.save_order(cart.clone())?;
        Ok(cart)
    }

    pub fn remove_cart_item(
        &self,
        account_id: &AccountId,
        dish_id: &DishId,
    ) -> Result<Order, ReputationError> {
        let scope = self.locks.scope([account_id]);
        let _held = scope.enter();

        self.require_active(account_id)?;
        let missing = || ReputationError::NotFound(Missing::CartItem(dish_id.clone()));
        let mut cart = self.store.active_cart(account_id)?.ok_or_else(missing)?;
        let before = cart.lines.len();
        cart.lines.retain(|line| &line.dish_id != dish_id);
        if cart.lines.len() == before {
            return Err(missing());
        }

        self.store.save_order(cart.clone())?;
        Ok(cart)
    }

    /// Validate and price the account's cart without paying for it.
    pub fn cart(&self, account_id: &AccountId) -> Result<CartQuote, ReputationError> {
        let scope = self.locks.scope([account_id]);
        let _held = scope.enter();

        let account = self.require_active(account_id)?;
        let cart = self.cart_for(account_id)?;
        let (cart, removed) = self.prune_unavailable(&account, cart)?;
        let pricing = self.policy.price(&account, &cart.lines);

        Ok(CartQuote {
            order_id: cart.id,
            lines: cart.lines,
            pricing,
            removed,
        })
    }

    /// Pay for the account's pending cart.
    ///
    /// On insufficient balance the only mutation is one logged warning (plus evaluation);
    /// balance, lifetime totals, and the cart stay as they were.
    pub fn checkout(&self, account_id: &AccountId) -> Result<Order, ReputationError> {
        let scope = self.locks.scope([account_id]);
        let _held = scope.enter();

        let mut account = self.require_active(account_id)?;
        let cart = self
            .store
            .active_cart(account_id)?
            .filter(|cart| !cart.lines.is_empty())
            .ok_or(ReputationError::EmptyCart)?;

        let (mut order, removed) = self.prune_unavailable(&account, cart)?;
        if order.lines.is_empty() {
            warn!(
                account = %account_id,
                removed = ?removed,
                "checkout aborted, every dish unavailable"
            );
            return Err(ReputationError::EmptyCart);
        }

        let pricing = self.policy.price(&account, &order.lines);
        if account.balance < pricing.total {
            let available = account.balance;
            let entry = WarningEntry::new(&account, WarningReason::InsufficientBalance, 1);
            issue_warnings(&*self.store, &mut account, entry)?;
            warn!(
                account = %account_id,
                required = %pricing.total,
                available = %available,
                warnings = account.warnings,
                "checkout declined for insufficient balance, warning issued"
            );
            settle_standing(&*self.store, &self.evaluator, account)?;
            return Err(ReputationError::InsufficientBalance {
                required: pricing.total,
                available,
            });
        }

        account.balance -= pricing.total;
        account.lifetime_spend += pricing.subtotal;
        account.lifetime_order_count = account.lifetime_order_count.saturating_add(1);

        order.subtotal = pricing.subtotal;
        order.discount_amount = pricing.discount_amount;
        order.delivery_fee = pricing.delivery_fee;
        order.total = pricing.total;
        order.status = OrderStatus::Paid;
        order.paid_at = Some(Utc::now());

        self.store.save_order(order.clone())?;
        let account = settle_standing(&*self.store, &self.evaluator, account)?;
        self.store
            .open_cart(Order::empty_cart(next_order_id(), account_id.clone()))?;

        info!(
            account = %account_id,
            order = %order.id,
            total = %order.total,
            balance = %account.balance,
            tier = account.tier.label(),
            "order paid"
        );
        Ok(order)
    }

    fn require_active(&self, account_id: &AccountId) -> Result<AccountRecord, ReputationError> {
        let account = require_account(&*self.store, account_id)?;
        if account.blacklisted {
            return Err(ReputationError::AccountBlacklisted(account.id));
        }
        if account.closed {
            return Err(ReputationError::AccountClosed(account.id));
        }
        Ok(account)
    }

    fn cart_for(&self, account_id: &AccountId) -> Result<Order, ReputationError> {
        if let Some(cart) = self.store.active_cart(account_id)? {
            return Ok(cart);
        }

        match self
            .store
            .open_cart(Order::empty_cart(next_order_id(), account_id.clone()))
        {
            Ok(cart) => Ok(cart),
            Err(RepositoryError::Conflict) => self
                .store
                .active_cart(account_id)?
                .ok_or(ReputationError::Repository(RepositoryError::Conflict)),
            Err(err) => Err(err.into()),
        }
    }

    /// Drop lines whose dish is gone, inactive, or VIP-only for a Registered account.
    fn prune_unavailable(
        &self,
        account: &AccountRecord,
        mut cart: Order,
    ) -> Result<(Order, Vec<String>), ReputationError> {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(cart.lines.len());

        for line in std::mem::take(&mut cart.lines) {
            match self.catalog.listing(&line.dish_id)? {
                Some(listing) if listing.orderable_by(account.tier) => kept.push(line),
                _ => removed.push(line.dish_name),
            }
        }
        cart.lines = kept;

        if !removed.is_empty() {
            self.store.save_order(cart.clone())?;
            info!(
                account = %account.id,
                removed = ?removed,
                "unavailable dishes removed from cart"
            );
        }

        Ok((cart, removed))
    }
}

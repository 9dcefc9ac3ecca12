use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for customer, chef, and driver accounts.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(pub String);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for filed complaints and compliments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeedbackId(pub String);

impl fmt::Display for FeedbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for carts and placed orders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a dish owned by the menu module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DishId(pub String);

impl fmt::Display for DishId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who an account belongs to. Every feedback party carries an account record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    Customer,
    Chef,
    Driver,
}

impl AccountRole {
    pub const fn label(self) -> &'static str {
        match self {
            AccountRole::Customer => "customer",
            AccountRole::Chef => "chef",
            AccountRole::Driver => "driver",
        }
    }
}

/// Membership level driving discounts and feedback weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipTier {
    Registered,
    Vip,
}

impl MembershipTier {
    pub const fn label(self) -> &'static str {
        match self {
            MembershipTier::Registered => "registered",
            MembershipTier::Vip => "vip",
        }
    }
}

/// Mutable reputation fields tracked per account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub id: AccountId,
    pub role: AccountRole,
    pub tier: MembershipTier,
    pub warnings: u32,
    pub blacklisted: bool,
    pub balance: Decimal,
    pub lifetime_spend: Decimal,
    pub lifetime_order_count: u32,
    /// Closed by a manager; see [`AccountClosure`].
    #[serde(default)]
    pub closed: bool,
}

impl AccountRecord {
    /// Fresh record handed over by registration.
    pub fn registered(id: AccountId, role: AccountRole) -> Self {
        Self {
            id,
            role,
            tier: MembershipTier::Registered,
            warnings: 0,
            blacklisted: false,
            balance: Decimal::ZERO,
            lifetime_spend: Decimal::ZERO,
            lifetime_order_count: 0,
            closed: false,
        }
    }

    pub fn is_vip(&self) -> bool {
        self.tier == MembershipTier::Vip
    }

    pub fn status_view(&self) -> AccountStatusView {
        AccountStatusView {
            account_id: self.id.clone(),
            tier: self.tier.label(),
            warnings: self.warnings,
            blacklisted: self.blacklisted,
            closed: self.closed,
            balance: self.balance,
        }
    }
}

/// Read-only projection consumed by dashboards and login flows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountStatusView {
    pub account_id: AccountId,
    pub tier: &'static str,
    pub warnings: u32,
    pub blacklisted: bool,
    pub closed: bool,
    pub balance: Decimal,
}

/// Manager-initiated end of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountClosure {
    /// The customer left; the balance is refunded.
    Quit,
    /// Removed for cause; blacklisted and the balance is seized.
    Kicked,
}

impl AccountClosure {
    pub const fn label(self) -> &'static str {
        match self {
            AccountClosure::Quit => "quit",
            AccountClosure::Kicked => "kicked",
        }
    }
}

/// Outcome of closing an account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClosureReceipt {
    pub account: AccountStatusView,
    pub closure: AccountClosure,
    pub refunded: Decimal,
    pub seized: Decimal,
}

/// Kind of party a piece of feedback is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackTargetKind {
    Customer,
    Chef,
    Driver,
}

impl FeedbackTargetKind {
    pub const fn label(self) -> &'static str {
        match self {
            FeedbackTargetKind::Customer => "customer",
            FeedbackTargetKind::Chef => "chef",
            FeedbackTargetKind::Driver => "driver",
        }
    }
}

impl From<AccountRole> for FeedbackTargetKind {
    fn from(role: AccountRole) -> Self {
        match role {
            AccountRole::Customer => FeedbackTargetKind::Customer,
            AccountRole::Chef => FeedbackTargetKind::Chef,
            AccountRole::Driver => FeedbackTargetKind::Driver,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackStatus {
    Pending,
    Accepted,
    Dismissed,
    Cancelled,
}

impl FeedbackStatus {
    pub const fn label(self) -> &'static str {
        match self {
            FeedbackStatus::Pending => "pending",
            FeedbackStatus::Accepted => "accepted",
            FeedbackStatus::Dismissed => "dismissed",
            FeedbackStatus::Cancelled => "cancelled",
        }
    }
}

/// Manager verdict on a pending complaint or compliment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackDecision {
    Accept,
    Dismiss,
}

/// Rebuttal filed by the target of a pending complaint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dispute {
    pub disputed_by: AccountId,
    pub reason: String,
    pub disputed_at: DateTime<Utc>,
}

/// Payload accepted when a customer or driver files feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackSubmission {
    pub filer_id: AccountId,
    pub target_kind: FeedbackTargetKind,
    pub target_id: AccountId,
    pub message: String,
    pub is_compliment: bool,
}

/// Ledger entry for a complaint or compliment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackItem {
    pub id: FeedbackId,
    /// Filing order; cancellation pairs by ascending sequence.
    pub sequence: u64,
    pub filer_id: AccountId,
    pub target_kind: FeedbackTargetKind,
    pub target_id: AccountId,
    pub is_compliment: bool,
    pub weight: u32,
    pub message: String,
    pub status: FeedbackStatus,
    pub filed_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub cancelled_with: Option<FeedbackId>,
    pub dispute: Option<Dispute>,
    /// Manager's note recorded with the decision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_note: Option<String>,
}

impl FeedbackItem {
    pub fn is_pending(&self) -> bool {
        self.status == FeedbackStatus::Pending
    }
}

/// Why a warning was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningReason {
    InsufficientBalance,
    ComplaintUpheld,
    ComplaintDismissed,
}

impl WarningReason {
    pub const fn label(self) -> &'static str {
        match self {
            WarningReason::InsufficientBalance => "insufficient_balance",
            WarningReason::ComplaintUpheld => "complaint_upheld",
            WarningReason::ComplaintDismissed => "complaint_dismissed",
        }
    }
}

/// Append-only record of warnings issued to one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningEntry {
    pub account_id: AccountId,
    pub role: AccountRole,
    pub reason: WarningReason,
    pub count: u32,
    pub feedback_id: Option<FeedbackId>,
    pub note: Option<String>,
    pub issued_at: DateTime<Utc>,
}

impl WarningEntry {
    pub fn new(record: &AccountRecord, reason: WarningReason, count: u32) -> Self {
        Self {
            account_id: record.id.clone(),
            role: record.role,
            reason,
            count,
            feedback_id: None,
            note: None,
            issued_at: Utc::now(),
        }
    }

    /// Attach the feedback item and manager note behind this warning.
    pub fn with_feedback(mut self, item: &FeedbackItem) -> Self {
        self.feedback_id = Some(item.id.clone());
        self.note = item.decision_note.clone();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Paid,
    /// Cart abandoned when its account was closed.
    Failed,
}

/// Cart line with the unit price captured when the dish was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub dish_id: DishId,
    pub dish_name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl OrderLine {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// A pending cart or a finalized order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub account_id: AccountId,
    pub lines: Vec<OrderLine>,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn empty_cart(id: OrderId, account_id: AccountId) -> Self {
        Self {
            id,
            account_id,
            lines: Vec::new(),
            subtotal: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            delivery_fee: Decimal::ZERO,
            total: Decimal::ZERO,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            paid_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    pub fn line_mut(&mut self, dish_id: &DishId) -> Option<&mut OrderLine> {
        self.lines.iter_mut().find(|line| &line.dish_id == dish_id)
    }
}

/// Menu-side view of a dish used during cart validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DishListing {
    pub dish_id: DishId,
    pub name: String,
    pub price: Decimal,
    /// Dish active and its chef still employed.
    pub available: bool,
    pub vip_only: bool,
}

impl DishListing {
    pub fn orderable_by(&self, tier: MembershipTier) -> bool {
        self.available && (!self.vip_only || tier == MembershipTier::Vip)
    }
}

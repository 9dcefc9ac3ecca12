use super::super::domain::{AccountRecord, MembershipTier};
use super::config::StatusPolicy;
use super::{PromotionReason, StatusTransition};
use rust_decimal::Decimal;

pub(crate) type StatusRule = fn(&StatusPolicy, &mut AccountRecord) -> Option<StatusTransition>;

/// Applied in this order on every pass; demotion clears warnings before deactivation looks at them.
pub(crate) const ORDERED_RULES: [StatusRule; 3] = [promote, demote, deactivate];

pub(crate) fn promote(
    policy: &StatusPolicy,
    record: &mut AccountRecord,
) -> Option<StatusTransition> {
    if record.tier != MembershipTier::Registered {
        return None;
    }

    let reason = if record.lifetime_spend > policy.vip_spend_threshold {
        PromotionReason::LifetimeSpend
    } else if record.lifetime_order_count >= policy.vip_order_threshold && record.warnings == 0 {
        PromotionReason::OrderHistory
    } else {
        return None;
    };

    record.tier = MembershipTier::Vip;
    Some(StatusTransition::Promoted { reason })
}

pub(crate) fn demote(
    policy: &StatusPolicy,
    record: &mut AccountRecord,
) -> Option<StatusTransition> {
    if record.tier != MembershipTier::Vip || record.warnings < policy.demotion_warnings {
        return None;
    }

    let cleared_warnings = record.warnings;
    record.tier = MembershipTier::Registered;
    record.warnings = 0;
    Some(StatusTransition::Demoted { cleared_warnings })
}

pub(crate) fn deactivate(
    policy: &StatusPolicy,
    record: &mut AccountRecord,
) -> Option<StatusTransition> {
    if record.tier != MembershipTier::Registered
        || record.warnings < policy.deactivation_warnings
    {
        return None;
    }

    let seized_balance = record.balance;
    record.blacklisted = true;
    record.balance = Decimal::ZERO;
    Some(StatusTransition::Deactivated { seized_balance })
}

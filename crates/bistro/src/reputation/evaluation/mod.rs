mod config;
mod rules;

pub use config::StatusPolicy;

use super::domain::AccountRecord;
use rules::ORDERED_RULES;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Stateless evaluator applying the ordered status rules to an account snapshot.
#[derive(Debug, Clone, Default)]
pub struct StatusEvaluator {
    policy: StatusPolicy,
}

impl StatusEvaluator {
    pub fn new(policy: StatusPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &StatusPolicy {
        &self.policy
    }

    /// Run promotion, demotion, then deactivation against the current field values.
    ///
    /// Blacklisted records are terminal and come back unchanged.
    pub fn evaluate(&self, record: &AccountRecord) -> StatusOutcome {
        let mut next = record.clone();
        if next.blacklisted {
            return StatusOutcome {
                record: next,
                transitions: Vec::new(),
            };
        }

        let transitions = ORDERED_RULES
            .iter()
            .filter_map(|rule| rule(&self.policy, &mut next))
            .collect();

        StatusOutcome {
            record: next,
            transitions,
        }
    }
}

/// Why an account earned VIP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionReason {
    LifetimeSpend,
    OrderHistory,
}

/// Tier or standing change applied by a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatusTransition {
    Promoted { reason: PromotionReason },
    Demoted { cleared_warnings: u32 },
    Deactivated { seized_balance: Decimal },
}

impl StatusTransition {
    pub fn summary(&self) -> String {
        match self {
            StatusTransition::Promoted {
                reason: PromotionReason::LifetimeSpend,
            } => "promoted to vip for lifetime spend".to_string(),
            StatusTransition::Promoted {
                reason: PromotionReason::OrderHistory,
            } => "promoted to vip for clean order history".to_string(),
            StatusTransition::Demoted { cleared_warnings } => {
                format!("demoted to registered, {cleared_warnings} warning(s) cleared")
            }
            StatusTransition::Deactivated { seized_balance } => {
                format!("account deactivated, balance {seized_balance} seized")
            }
        }
    }
}

/// Evaluation output: the proposed record plus the transitions that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusOutcome {
    pub record: AccountRecord,
    pub transitions: Vec<StatusTransition>,
}

impl StatusOutcome {
    pub fn changed(&self) -> bool {
        !self.transitions.is_empty()
    }
}

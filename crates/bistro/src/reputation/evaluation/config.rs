use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Thresholds driving promotion, demotion, and deactivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusPolicy {
    /// Lifetime dish spend that must be exceeded to earn VIP.
    pub vip_spend_threshold: Decimal,
    /// Completed orders that earn VIP when the account has no warnings.
    pub vip_order_threshold: u32,
    pub demotion_warnings: u32,
    pub deactivation_warnings: u32,
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self {
            vip_spend_threshold: Decimal::from(100),
            vip_order_threshold: 3,
            demotion_warnings: 2,
            deactivation_warnings: 3,
        }
    }
}

//! Policy configuration types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Entitlement and rounding policy applied by the engine.
///
/// Loaded from `policy.yaml`. The values here are company-wide defaults;
/// bulk allocation calls may override the entitlement figures per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnginePolicy {
    /// Default yearly vacation entitlement in days.
    pub default_vacation_days: Decimal,
    /// Default yearly compensation hours.
    pub default_compensation_hours: Decimal,
    /// Proration factor applied to flex workers (e.g. 0.6).
    pub flex_worker_factor: Decimal,
    /// Decimal places for reported worked-hour totals.
    pub hour_rounding_dp: u32,
}

impl Default for EnginePolicy {
    fn default() -> Self {
        Self {
            default_vacation_days: Decimal::new(25, 0),
            default_compensation_hours: Decimal::ZERO,
            flex_worker_factor: Decimal::new(6, 1),
            hour_rounding_dp: 2,
        }
    }
}

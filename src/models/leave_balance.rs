//! Leave balance model.
//!
//! One balance row exists per (subject, calendar year). Rows are created
//! lazily on first allocation, mutated by leave consumption and by bulk
//! allocation runs, and never hard-deleted.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-subject, per-year leave entitlement and consumption counters.
///
/// The arithmetic invariant `days_remaining == days_total - days_used`
/// holds after every committed mutation, and `days_remaining` is never
/// negative; consumption that would breach that fails upstream with
/// `InsufficientBalance`.
///
/// # Example
///
/// ```
/// use roster_engine::models::LeaveBalance;
/// use rust_decimal::Decimal;
///
/// let balance = LeaveBalance::fresh("worker_001", 2025, Decimal::new(25, 0), Decimal::ZERO);
/// assert_eq!(balance.days_remaining, Decimal::new(25, 0));
/// assert_eq!(balance.days_used, Decimal::ZERO);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveBalance {
    /// The subject the balance belongs to.
    pub subject_id: String,
    /// The entitlement year.
    pub year: i32,
    /// Total vacation entitlement for the year.
    pub days_total: Decimal,
    /// Vacation days already consumed.
    pub days_used: Decimal,
    /// Vacation days remaining.
    pub days_remaining: Decimal,
    /// Sick days consumed (tracked independently of the entitlement).
    pub sick_days_used: Decimal,
    /// Accrued compensation hours.
    pub compensation_hours: Decimal,
    /// Special leave days consumed.
    pub special_leave_used: Decimal,
}

impl LeaveBalance {
    /// Creates a fresh balance with no consumption recorded.
    pub fn fresh(
        subject_id: impl Into<String>,
        year: i32,
        days_total: Decimal,
        compensation_hours: Decimal,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            year,
            days_total,
            days_used: Decimal::ZERO,
            days_remaining: days_total,
            sick_days_used: Decimal::ZERO,
            compensation_hours,
            special_leave_used: Decimal::ZERO,
        }
    }

    /// Resets the entitlement while preserving consumption counters.
    ///
    /// Used by re-runs of bulk allocation: the total and remaining are
    /// recomputed from the fresh entitlement, but days already taken this
    /// year are never erased.
    pub fn reallocate(&mut self, days_total: Decimal, compensation_hours: Decimal) {
        self.days_total = days_total;
        self.days_remaining = days_total - self.days_used;
        self.compensation_hours = compensation_hours;
    }
}

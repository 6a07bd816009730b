//! Leave entitlement allocation and consumption.
//!
//! Bulk allocation computes per-subject, per-year entitlements for an
//! entire company roster, prorating by employment category, and upserts
//! the (subject, year) balance idempotently: re-running a year never
//! erases consumption already recorded. Consumption happens on leave
//! approval, guarded by the non-negative balance rule.

use chrono::Datelike;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::EnginePolicy;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    EmploymentCategory, IntervalKind, LeaveBalance, LeavePeriod, LeaveStatus, LeaveType,
};

use super::{Engine, with_conflict_retry};

/// Entitlement defaults for one bulk allocation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllocationDefaults {
    /// Default yearly vacation days before proration.
    pub days_total: Decimal,
    /// Default yearly compensation hours.
    pub compensation_hours: Decimal,
}

impl AllocationDefaults {
    /// Takes the defaults from the loaded policy.
    pub fn from_policy(policy: &EnginePolicy) -> Self {
        Self {
            days_total: policy.default_vacation_days,
            compensation_hours: policy.default_compensation_hours,
        }
    }
}

/// One successfully allocated subject in a bulk run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationOutcome {
    /// The allocated subject.
    pub subject_id: String,
    /// The entitlement after proration.
    pub days_total: Decimal,
    /// Days remaining after preserving prior consumption.
    pub days_remaining: Decimal,
}

/// One failed subject in a bulk run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationError {
    /// The subject that failed.
    pub subject_id: String,
    /// Why the upsert failed.
    pub message: String,
}

/// Result of a bulk allocation run. Partial success is the normal
/// outcome at roster scale; errors never abort the remaining subjects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkAllocationReport {
    /// Subjects allocated in this run.
    pub processed: Vec<AllocationOutcome>,
    /// Subjects that failed, with reasons.
    pub errors: Vec<AllocationError>,
}

/// Prorates the default entitlement by employment category.
///
/// Freelancers receive no entitlement, flex workers a fixed fraction of
/// the default rounded to whole days with standard midpoint rounding,
/// permanent workers the default unchanged.
///
/// # Example
///
/// ```
/// use roster_engine::engine::prorated_entitlement;
/// use roster_engine::models::EmploymentCategory;
/// use rust_decimal::Decimal;
///
/// let days = prorated_entitlement(
///     EmploymentCategory::FlexWorker,
///     Decimal::new(25, 0),
///     Decimal::new(6, 1),
/// );
/// assert_eq!(days, Decimal::new(15, 0));
/// ```
pub fn prorated_entitlement(
    category: EmploymentCategory,
    default_days: Decimal,
    flex_factor: Decimal,
) -> Decimal {
    match category {
        EmploymentCategory::Permanent => default_days,
        EmploymentCategory::FlexWorker => (default_days * flex_factor)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
        EmploymentCategory::Freelancer => Decimal::ZERO,
    }
}

impl Engine {
    /// Allocates leave entitlements for a company roster for one year.
    ///
    /// Covers active subjects with the employee or manager role;
    /// freelancer engagements and admin accounts are excluded from
    /// default runs. The upsert is idempotent per (subject, year):
    /// creation starts with zero used days, a re-run recomputes total
    /// and remaining but never resets the used counters. A failed
    /// subject is recorded and the run continues; work committed before
    /// an interruption stays valid.
    pub fn bulk_allocate(
        &self,
        company_id: &str,
        year: i32,
        defaults: AllocationDefaults,
        policy: &EnginePolicy,
    ) -> EngineResult<BulkAllocationReport> {
        let roster = self.directory().company_roster(company_id)?;
        let mut report = BulkAllocationReport {
            processed: Vec::new(),
            errors: Vec::new(),
        };

        for subject in roster {
            if !subject.is_allocatable()
                || subject.employment_category == EmploymentCategory::Freelancer
            {
                continue;
            }

            let days_total = prorated_entitlement(
                subject.employment_category,
                defaults.days_total,
                policy.flex_worker_factor,
            );

            let result = with_conflict_retry(|| {
                let (existing, version) = self.store().leave_balance(&subject.id, year)?;
                let balance = match existing {
                    Some(mut balance) => {
                        balance.reallocate(days_total, defaults.compensation_hours);
                        balance
                    }
                    None => LeaveBalance::fresh(
                        subject.id.clone(),
                        year,
                        days_total,
                        defaults.compensation_hours,
                    ),
                };
                self.store().put_leave_balance(version, balance.clone())?;
                Ok(balance)
            });

            match result {
                Ok(balance) => report.processed.push(AllocationOutcome {
                    subject_id: subject.id,
                    days_total: balance.days_total,
                    days_remaining: balance.days_remaining,
                }),
                Err(err) => {
                    warn!(subject_id = %subject.id, error = %err, "allocation failed");
                    report.errors.push(AllocationError {
                        subject_id: subject.id,
                        message: err.to_string(),
                    });
                }
            }
        }

        info!(
            company_id,
            year,
            processed = report.processed.len(),
            errors = report.errors.len(),
            "bulk allocation finished"
        );
        Ok(report)
    }

    /// Approves a pending leave period and consumes the balance.
    ///
    /// Vacation leave consumes the yearly entitlement and fails with
    /// `InsufficientBalance` before the remaining days would go
    /// negative. Sick and special leave only record their own counters;
    /// unpaid leave touches no counter. The balance row is created
    /// lazily with policy defaults if the year was never allocated.
    pub fn approve_leave(
        &self,
        subject_id: &str,
        period_id: Uuid,
        policy: &EnginePolicy,
    ) -> EngineResult<LeavePeriod> {
        let subject = self.directory().subject(subject_id)?;
        let period = self
            .store()
            .leave_period(subject_id, period_id)?
            .ok_or_else(|| EngineError::InvalidInterval {
                message: format!("no leave period {period_id} for subject '{subject_id}'"),
            })?;
        if period.status != LeaveStatus::Pending {
            return Err(EngineError::InvalidInterval {
                message: format!("leave period {period_id} is not pending"),
            });
        }

        let year = period.start_date.year();
        with_conflict_retry(|| {
            let (existing, version) = self.store().leave_balance(subject_id, year)?;
            let mut balance = existing.unwrap_or_else(|| {
                LeaveBalance::fresh(
                    subject_id,
                    year,
                    prorated_entitlement(
                        subject.employment_category,
                        policy.default_vacation_days,
                        policy.flex_worker_factor,
                    ),
                    policy.default_compensation_hours,
                )
            });

            match period.leave_type {
                LeaveType::Vacation => {
                    if balance.days_remaining < period.day_count {
                        return Err(EngineError::InsufficientBalance {
                            subject_id: subject_id.to_string(),
                            year,
                            requested: period.day_count,
                            remaining: balance.days_remaining,
                        });
                    }
                    balance.days_used += period.day_count;
                    balance.days_remaining -= period.day_count;
                }
                LeaveType::Sick => balance.sick_days_used += period.day_count,
                LeaveType::Special => balance.special_leave_used += period.day_count,
                LeaveType::Unpaid => {}
            }
            self.store().put_leave_balance(version, balance)
        })?;

        with_conflict_retry(|| {
            let version = self.store().version(subject_id, IntervalKind::LeavePeriod)?;
            self.store()
                .set_leave_status(subject_id, version, period_id, LeaveStatus::Approved)
        })
    }

    /// Rejects a pending leave period. No balance is touched.
    ///
    /// Only pending periods can be rejected: an approved period holds
    /// consumed days, and flipping it to rejected would strand that
    /// consumption on the balance.
    pub fn reject_leave(&self, subject_id: &str, period_id: Uuid) -> EngineResult<LeavePeriod> {
        self.directory().subject(subject_id)?;
        let period = self
            .store()
            .leave_period(subject_id, period_id)?
            .ok_or_else(|| EngineError::InvalidInterval {
                message: format!("no leave period {period_id} for subject '{subject_id}'"),
            })?;
        if period.status != LeaveStatus::Pending {
            return Err(EngineError::InvalidInterval {
                message: format!("leave period {period_id} is not pending"),
            });
        }

        with_conflict_retry(|| {
            let version = self.store().version(subject_id, IntervalKind::LeavePeriod)?;
            self.store()
                .set_leave_status(subject_id, version, period_id, LeaveStatus::Rejected)
        })
    }
}

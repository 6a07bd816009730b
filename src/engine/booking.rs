//! Interval booking operations: shift creation and status changes,
//! manual time entries, availability marks, and leave requests.
//!
//! Every create runs the overlap detector and re-checks it under the
//! store's version check, so a booking can never slip past a concurrent
//! conflicting one.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    AvailabilityMark, AvailabilityStatus, IntervalKind, LeavePeriod, LeaveStatus, LeaveType,
    ScheduledShift, ShiftStatus, TimeEntry,
};

use super::{Engine, with_conflict_retry};

/// A shift booking request before the engine assigns it an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftDraft {
    /// The subject to book.
    pub subject_id: String,
    /// Planned start.
    pub start: NaiveDateTime,
    /// Planned end.
    pub end: NaiveDateTime,
    /// Role label for the shift.
    pub role_label: String,
    /// Optional linked work assignment.
    pub assignment_id: Option<Uuid>,
}

/// A leave request before the engine assigns it an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveDraft {
    /// The subject requesting leave.
    pub subject_id: String,
    /// First day of leave (inclusive).
    pub start_date: NaiveDate,
    /// Last day of leave (inclusive).
    pub end_date: NaiveDate,
    /// Whether the period covers whole days.
    pub full_day: bool,
    /// Start time of day for a partial-day request.
    pub start_time: Option<NaiveTime>,
    /// End time of day for a partial-day request.
    pub end_time: Option<NaiveTime>,
    /// The tagged leave type.
    pub leave_type: LeaveType,
    /// Days the period consumes.
    pub day_count: Decimal,
}

impl Engine {
    /// Books a scheduled shift, rejecting any same-subject shift overlap.
    ///
    /// Touching boundaries are allowed: a shift may start exactly when
    /// the previous one ends.
    pub fn create_shift(&self, draft: ShiftDraft, now: NaiveDateTime) -> EngineResult<ScheduledShift> {
        self.directory().subject(&draft.subject_id)?;

        let shift = with_conflict_retry(|| {
            let version = self
                .store()
                .version(&draft.subject_id, IntervalKind::ScheduledShift)?;
            self.check_no_overlap(
                &draft.subject_id,
                IntervalKind::ScheduledShift,
                draft.start,
                Some(draft.end),
                None,
                now,
            )?;

            let shift = ScheduledShift {
                id: Uuid::new_v4(),
                subject_id: draft.subject_id.clone(),
                start: draft.start,
                end: draft.end,
                role_label: draft.role_label.clone(),
                status: ShiftStatus::Scheduled,
                assignment_id: draft.assignment_id,
            };
            self.store().insert_shift(version, shift.clone())?;
            Ok(shift)
        })?;

        info!(subject_id = %shift.subject_id, start = %shift.start, "shift booked");
        Ok(shift)
    }

    /// Changes the lifecycle status of an existing shift.
    pub fn set_shift_status(
        &self,
        subject_id: &str,
        shift_id: Uuid,
        status: ShiftStatus,
    ) -> EngineResult<ScheduledShift> {
        self.directory().subject(subject_id)?;

        with_conflict_retry(|| {
            let version = self.store().version(subject_id, IntervalKind::ScheduledShift)?;
            self.store()
                .update_shift_status(subject_id, version, shift_id, status)
        })
    }

    /// Records a closed time entry directly, for corrections and
    /// back-filled work.
    ///
    /// Unlike a clock-in this takes a complete `[start, end)` range and
    /// is checked against all existing entries, including the open
    /// session if one exists.
    pub fn record_time_entry(
        &self,
        subject_id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        assignment_id: Option<Uuid>,
        notes: Option<String>,
        now: NaiveDateTime,
    ) -> EngineResult<TimeEntry> {
        self.directory().subject(subject_id)?;

        with_conflict_retry(|| {
            let version = self.store().version(subject_id, IntervalKind::TimeEntry)?;
            self.check_no_overlap(
                subject_id,
                IntervalKind::TimeEntry,
                start,
                Some(end),
                None,
                now,
            )?;

            let entry = TimeEntry {
                id: Uuid::new_v4(),
                subject_id: subject_id.to_string(),
                start,
                end: Some(end),
                assignment_id,
                approved: false,
                notes: notes.clone(),
            };
            self.store().insert_time_entry(version, entry.clone())?;
            Ok(entry)
        })
    }

    /// Submits the availability mark for a calendar day, replacing any
    /// earlier mark for the same day.
    pub fn submit_availability(
        &self,
        subject_id: &str,
        date: NaiveDate,
        status: AvailabilityStatus,
        partial_hours: Option<Decimal>,
    ) -> EngineResult<AvailabilityMark> {
        self.directory().subject(subject_id)?;

        if status != AvailabilityStatus::Partial && partial_hours.is_some() {
            return Err(EngineError::InvalidInterval {
                message: "partial hours are only valid with partial availability".to_string(),
            });
        }

        with_conflict_retry(|| {
            let version = self
                .store()
                .version(subject_id, IntervalKind::AvailabilityMark)?;
            let mark = AvailabilityMark {
                id: Uuid::new_v4(),
                subject_id: subject_id.to_string(),
                date,
                status,
                partial_hours,
            };
            self.store().put_availability(version, mark.clone())?;
            Ok(mark)
        })
    }

    /// Files a pending leave request. Entitlement is only consumed on
    /// approval.
    pub fn request_leave(&self, draft: LeaveDraft) -> EngineResult<LeavePeriod> {
        self.directory().subject(&draft.subject_id)?;

        if draft.end_date < draft.start_date {
            return Err(EngineError::InvalidInterval {
                message: format!(
                    "leave end {} precedes start {}",
                    draft.end_date, draft.start_date
                ),
            });
        }
        if draft.day_count <= Decimal::ZERO {
            return Err(EngineError::InvalidInterval {
                message: "leave must consume a positive number of days".to_string(),
            });
        }

        with_conflict_retry(|| {
            let version = self
                .store()
                .version(&draft.subject_id, IntervalKind::LeavePeriod)?;
            let period = LeavePeriod {
                id: Uuid::new_v4(),
                subject_id: draft.subject_id.clone(),
                start_date: draft.start_date,
                end_date: draft.end_date,
                full_day: draft.full_day,
                start_time: draft.start_time,
                end_time: draft.end_time,
                leave_type: draft.leave_type,
                day_count: draft.day_count,
                status: LeaveStatus::Pending,
            };
            self.store().insert_leave_period(version, period.clone())?;
            Ok(period)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmploymentCategory, Subject, SubjectRole};
    use crate::store::{LoggingPresenceSink, MemoryDirectory, MemoryStore};
    use std::sync::Arc;

    fn make_datetime(date_str: &str, time_str: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{} {}", date_str, time_str), "%Y-%m-%d %H:%M:%S")
            .unwrap()
    }

    fn make_date(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
    }

    fn test_engine() -> Engine {
        let directory = MemoryDirectory::new();
        directory.insert(Subject {
            id: "worker_001".to_string(),
            employment_category: EmploymentCategory::Permanent,
            role: SubjectRole::Employee,
            company_id: "acme".to_string(),
            active: true,
        });
        Engine::new(
            Arc::new(MemoryStore::new()),
            Arc::new(directory),
            Arc::new(LoggingPresenceSink),
        )
    }

    fn draft(start: &str, end: &str) -> ShiftDraft {
        ShiftDraft {
            subject_id: "worker_001".to_string(),
            start: make_datetime("2025-03-10", start),
            end: make_datetime("2025-03-10", end),
            role_label: "host".to_string(),
            assignment_id: None,
        }
    }

    fn noon() -> NaiveDateTime {
        make_datetime("2025-03-01", "12:00:00")
    }

    #[test]
    fn test_overlapping_shift_is_rejected() {
        let engine = test_engine();
        engine.create_shift(draft("09:00:00", "17:00:00"), noon()).unwrap();

        let result = engine.create_shift(draft("16:00:00", "20:00:00"), noon());
        assert!(matches!(result, Err(EngineError::OverlapConflict { .. })));
    }

    #[test]
    fn test_back_to_back_shift_is_accepted() {
        let engine = test_engine();
        engine.create_shift(draft("09:00:00", "17:00:00"), noon()).unwrap();

        let result = engine.create_shift(draft("17:00:00", "20:00:00"), noon());
        assert!(result.is_ok());
    }

    #[test]
    fn test_zero_duration_shift_is_rejected() {
        let engine = test_engine();
        let result = engine.create_shift(draft("09:00:00", "09:00:00"), noon());
        assert!(matches!(result, Err(EngineError::InvalidInterval { .. })));
    }

    #[test]
    fn test_cancelling_frees_the_window() {
        let engine = test_engine();
        let shift = engine.create_shift(draft("09:00:00", "17:00:00"), noon()).unwrap();
        engine
            .set_shift_status("worker_001", shift.id, ShiftStatus::Cancelled)
            .unwrap();

        let replacement = engine.create_shift(draft("09:00:00", "17:00:00"), noon());
        assert!(replacement.is_ok());
    }

    #[test]
    fn test_status_change_on_unknown_shift_fails() {
        let engine = test_engine();
        let result =
            engine.set_shift_status("worker_001", Uuid::new_v4(), ShiftStatus::Confirmed);
        assert!(matches!(result, Err(EngineError::InvalidInterval { .. })));
    }

    #[test]
    fn test_manual_entry_checked_against_existing_entries() {
        let engine = test_engine();
        engine
            .record_time_entry(
                "worker_001",
                make_datetime("2025-03-10", "09:00:00"),
                make_datetime("2025-03-10", "12:00:00"),
                None,
                None,
                noon(),
            )
            .unwrap();

        let overlapping = engine.record_time_entry(
            "worker_001",
            make_datetime("2025-03-10", "11:00:00"),
            make_datetime("2025-03-10", "13:00:00"),
            None,
            None,
            noon(),
        );
        assert!(matches!(overlapping, Err(EngineError::OverlapConflict { .. })));

        let adjacent = engine.record_time_entry(
            "worker_001",
            make_datetime("2025-03-10", "12:00:00"),
            make_datetime("2025-03-10", "13:00:00"),
            None,
            None,
            noon(),
        );
        assert!(adjacent.is_ok());
    }

    #[test]
    fn test_partial_hours_require_partial_status() {
        let engine = test_engine();
        let result = engine.submit_availability(
            "worker_001",
            make_date("2025-03-10"),
            AvailabilityStatus::Available,
            Some(Decimal::new(4, 0)),
        );
        assert!(matches!(result, Err(EngineError::InvalidInterval { .. })));
    }

    #[test]
    fn test_resubmitted_availability_replaces_mark() {
        let engine = test_engine();
        engine
            .submit_availability(
                "worker_001",
                make_date("2025-03-10"),
                AvailabilityStatus::Available,
                None,
            )
            .unwrap();
        engine
            .submit_availability(
                "worker_001",
                make_date("2025-03-10"),
                AvailabilityStatus::Unavailable,
                None,
            )
            .unwrap();

        let mark = engine
            .store()
            .availability_on("worker_001", make_date("2025-03-10"))
            .unwrap()
            .unwrap();
        assert_eq!(mark.status, AvailabilityStatus::Unavailable);
    }

    #[test]
    fn test_leave_request_starts_pending() {
        let engine = test_engine();
        let period = engine
            .request_leave(LeaveDraft {
                subject_id: "worker_001".to_string(),
                start_date: make_date("2025-07-07"),
                end_date: make_date("2025-07-11"),
                full_day: true,
                start_time: None,
                end_time: None,
                leave_type: LeaveType::Vacation,
                day_count: Decimal::new(5, 0),
            })
            .unwrap();
        assert_eq!(period.status, LeaveStatus::Pending);
    }

    #[test]
    fn test_inverted_leave_range_is_rejected() {
        let engine = test_engine();
        let result = engine.request_leave(LeaveDraft {
            subject_id: "worker_001".to_string(),
            start_date: make_date("2025-07-11"),
            end_date: make_date("2025-07-07"),
            full_day: true,
            start_time: None,
            end_time: None,
            leave_type: LeaveType::Vacation,
            day_count: Decimal::new(5, 0),
        });
        assert!(matches!(result, Err(EngineError::InvalidInterval { .. })));
    }
}

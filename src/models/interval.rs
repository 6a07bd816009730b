//! Interval models: time entries, scheduled shifts, availability marks,
//! and leave periods.
//!
//! All four kinds share a subject, a start instant, and an optional end
//! instant where a missing end means an open or ongoing interval. Ranges
//! are half-open `[start, end)`, so back-to-back intervals never overlap.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Discriminates the concrete kinds of interval the store holds.
///
/// Overlap checks are scoped per kind: a scheduled shift may coincide with
/// a worked time entry, but two shifts for one subject may not intersect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalKind {
    /// An actual worked period.
    TimeEntry,
    /// A planned future period.
    ScheduledShift,
    /// A full-calendar-day availability mark.
    AvailabilityMark,
    /// A leave period.
    LeavePeriod,
}

impl std::fmt::Display for IntervalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntervalKind::TimeEntry => write!(f, "time entry"),
            IntervalKind::ScheduledShift => write!(f, "scheduled shift"),
            IntervalKind::AvailabilityMark => write!(f, "availability mark"),
            IntervalKind::LeavePeriod => write!(f, "leave period"),
        }
    }
}

/// Half-open overlap test between two ranges.
///
/// An absent end is treated as unbounded, which makes an open clock
/// session conflict with everything after its start. Touching boundaries
/// (`a.end == b.start`) do not overlap.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use roster_engine::models::overlaps;
///
/// let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
/// let nine = day.and_hms_opt(9, 0, 0).unwrap();
/// let five = day.and_hms_opt(17, 0, 0).unwrap();
/// let eight = day.and_hms_opt(20, 0, 0).unwrap();
///
/// assert!(overlaps(nine, Some(five), day.and_hms_opt(16, 0, 0), Some(eight)));
/// assert!(!overlaps(nine, Some(five), Some(five), Some(eight)));
/// ```
pub fn overlaps(
    a_start: NaiveDateTime,
    a_end: Option<NaiveDateTime>,
    b_start: Option<NaiveDateTime>,
    b_end: Option<NaiveDateTime>,
) -> bool {
    let b_start = match b_start {
        Some(start) => start,
        // Unbounded start only arises for open-ended candidates probing
        // everything; treat as the minimum representable instant.
        None => NaiveDateTime::MIN,
    };
    let a_before_b_end = match b_end {
        Some(end) => a_start < end,
        None => true,
    };
    let b_before_a_end = match a_end {
        Some(end) => b_start < end,
        None => true,
    };
    a_before_b_end && b_before_a_end
}

/// An actual worked period, created by clock-in and closed by clock-out.
///
/// An entry with `end == None` is an open clock session. At most one open
/// entry may exist per subject at any instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    /// Unique identifier for the entry.
    pub id: Uuid,
    /// The subject who worked the period.
    pub subject_id: String,
    /// When the session started.
    pub start: NaiveDateTime,
    /// When the session ended; `None` while the session is open.
    pub end: Option<NaiveDateTime>,
    /// Optional linked work assignment.
    pub assignment_id: Option<Uuid>,
    /// Whether a manager has approved the entry.
    pub approved: bool,
    /// Free-text notes.
    pub notes: Option<String>,
}

impl TimeEntry {
    /// Returns true while the session has no recorded end.
    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// Duration of a closed entry in hours, unrounded.
    ///
    /// Returns `None` for an open entry; open sessions contribute nothing
    /// to closed-window totals and are reported through the real-time
    /// current-session query instead.
    pub fn worked_hours(&self) -> Option<Decimal> {
        let end = self.end?;
        let seconds = (end - self.start).num_seconds();
        Some(Decimal::new(seconds, 0) / Decimal::new(3600, 0))
    }
}

/// Lifecycle status of a scheduled shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    /// Planned, not yet confirmed by the worker.
    Scheduled,
    /// Confirmed by the worker.
    Confirmed,
    /// Cancelled; no longer occupies the subject's calendar.
    Cancelled,
    /// Worked and completed.
    Completed,
}

/// A planned future work period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledShift {
    /// Unique identifier for the shift.
    pub id: Uuid,
    /// The subject the shift is booked for.
    pub subject_id: String,
    /// Planned start.
    pub start: NaiveDateTime,
    /// Planned end.
    pub end: NaiveDateTime,
    /// Role label for the shift (e.g. "bartender").
    pub role_label: String,
    /// Lifecycle status.
    pub status: ShiftStatus,
    /// Optional linked work assignment.
    pub assignment_id: Option<Uuid>,
}

impl ScheduledShift {
    /// Returns true if the shift still occupies the subject's calendar.
    ///
    /// Cancelled shifts are excluded from overlap checks so a replacement
    /// booking over the same window is accepted.
    pub fn blocks_calendar(&self) -> bool {
        self.status != ShiftStatus::Cancelled
    }
}

/// Status of a full-day availability mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    /// Available for the whole day.
    Available,
    /// Available for part of the day.
    Partial,
    /// Not available.
    Unavailable,
}

/// A full-calendar-day availability mark submitted by a subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityMark {
    /// Unique identifier for the mark.
    pub id: Uuid,
    /// The subject the mark belongs to.
    pub subject_id: String,
    /// The calendar day the mark covers.
    pub date: NaiveDate,
    /// Availability for the day.
    pub status: AvailabilityStatus,
    /// Hours available when the status is partial.
    pub partial_hours: Option<Decimal>,
}

/// The type of a leave period.
///
/// The tagged type drives attendance status derivation; free-text notes
/// never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveType {
    /// Vacation leave, consumed from the yearly entitlement.
    Vacation,
    /// Sick leave, tracked separately from the vacation entitlement.
    Sick,
    /// Special leave (weddings, funerals), tracked separately.
    Special,
    /// Unpaid leave; tracked but consumes no entitlement.
    Unpaid,
}

/// Approval status of a leave period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    /// Requested, awaiting a decision.
    Pending,
    /// Approved; counts against the balance and attendance.
    Approved,
    /// Rejected.
    Rejected,
}

/// A requested or approved leave period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeavePeriod {
    /// Unique identifier for the period.
    pub id: Uuid,
    /// The subject taking leave.
    pub subject_id: String,
    /// First day of leave (inclusive).
    pub start_date: NaiveDate,
    /// Last day of leave (inclusive).
    pub end_date: NaiveDate,
    /// Whether the period covers whole days.
    pub full_day: bool,
    /// Start time of day for a partial-day period.
    pub start_time: Option<NaiveTime>,
    /// End time of day for a partial-day period.
    pub end_time: Option<NaiveTime>,
    /// The tagged leave type.
    pub leave_type: LeaveType,
    /// Precomputed number of days the period consumes (may be fractional
    /// for partial days).
    pub day_count: Decimal,
    /// Approval status.
    pub status: LeaveStatus,
}

impl LeavePeriod {
    /// Returns true if the period covers the given calendar day.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Returns true for an approved period of the given type covering the day.
    pub fn is_approved_for(&self, leave_type: LeaveType, date: NaiveDate) -> bool {
        self.status == LeaveStatus::Approved && self.leave_type == leave_type && self.covers(date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_datetime(date_str: &str, time_str: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{} {}", date_str, time_str), "%Y-%m-%d %H:%M:%S")
            .unwrap()
    }

    fn make_date(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_intersecting_ranges_overlap() {
        assert!(overlaps(
            make_datetime("2025-03-10", "09:00:00"),
            Some(make_datetime("2025-03-10", "17:00:00")),
            Some(make_datetime("2025-03-10", "16:00:00")),
            Some(make_datetime("2025-03-10", "20:00:00")),
        ));
    }

    #[test]
    fn test_touching_ranges_do_not_overlap() {
        // End of A equals start of B: back-to-back, no conflict.
        assert!(!overlaps(
            make_datetime("2025-03-10", "09:00:00"),
            Some(make_datetime("2025-03-10", "17:00:00")),
            Some(make_datetime("2025-03-10", "17:00:00")),
            Some(make_datetime("2025-03-10", "20:00:00")),
        ));
    }

    #[test]
    fn test_disjoint_ranges_do_not_overlap() {
        assert!(!overlaps(
            make_datetime("2025-03-10", "09:00:00"),
            Some(make_datetime("2025-03-10", "12:00:00")),
            Some(make_datetime("2025-03-10", "13:00:00")),
            Some(make_datetime("2025-03-10", "17:00:00")),
        ));
    }

    #[test]
    fn test_open_ended_range_overlaps_everything_after_start() {
        assert!(overlaps(
            make_datetime("2025-03-10", "09:00:00"),
            None,
            Some(make_datetime("2025-03-12", "09:00:00")),
            Some(make_datetime("2025-03-12", "17:00:00")),
        ));
    }

    #[test]
    fn test_open_ended_range_does_not_overlap_before_its_start() {
        assert!(!overlaps(
            make_datetime("2025-03-10", "09:00:00"),
            None,
            Some(make_datetime("2025-03-09", "09:00:00")),
            Some(make_datetime("2025-03-09", "17:00:00")),
        ));
    }

    #[test]
    fn test_contained_range_overlaps() {
        assert!(overlaps(
            make_datetime("2025-03-10", "09:00:00"),
            Some(make_datetime("2025-03-10", "17:00:00")),
            Some(make_datetime("2025-03-10", "11:00:00")),
            Some(make_datetime("2025-03-10", "12:00:00")),
        ));
    }

    #[test]
    fn test_open_entry_has_no_worked_hours() {
        let entry = TimeEntry {
            id: Uuid::new_v4(),
            subject_id: "worker_001".to_string(),
            start: make_datetime("2025-03-10", "09:00:00"),
            end: None,
            assignment_id: None,
            approved: false,
            notes: None,
        };
        assert!(entry.is_open());
        assert_eq!(entry.worked_hours(), None);
    }

    #[test]
    fn test_closed_entry_worked_hours() {
        let entry = TimeEntry {
            id: Uuid::new_v4(),
            subject_id: "worker_001".to_string(),
            start: make_datetime("2025-03-10", "09:00:00"),
            end: Some(make_datetime("2025-03-10", "16:30:00")),
            assignment_id: None,
            approved: false,
            notes: None,
        };
        assert_eq!(entry.worked_hours(), Some(Decimal::new(75, 1))); // 7.5
    }

    #[test]
    fn test_worked_hours_keep_sub_minute_seconds() {
        let entry = TimeEntry {
            id: Uuid::new_v4(),
            subject_id: "worker_001".to_string(),
            start: make_datetime("2025-03-10", "09:00:00"),
            end: Some(make_datetime("2025-03-10", "10:30:30")),
            assignment_id: None,
            approved: false,
            notes: None,
        };
        // 5430 seconds, not a whole number of minutes times sixty.
        assert_eq!(
            entry.worked_hours(),
            Some(Decimal::new(5430, 0) / Decimal::new(3600, 0))
        );
    }

    #[test]
    fn test_cancelled_shift_does_not_block_calendar() {
        let shift = ScheduledShift {
            id: Uuid::new_v4(),
            subject_id: "worker_001".to_string(),
            start: make_datetime("2025-03-10", "09:00:00"),
            end: make_datetime("2025-03-10", "17:00:00"),
            role_label: "bartender".to_string(),
            status: ShiftStatus::Cancelled,
            assignment_id: None,
        };
        assert!(!shift.blocks_calendar());
    }

    #[test]
    fn test_leave_period_covers_inclusive_range() {
        let period = LeavePeriod {
            id: Uuid::new_v4(),
            subject_id: "worker_001".to_string(),
            start_date: make_date("2025-07-07"),
            end_date: make_date("2025-07-11"),
            full_day: true,
            start_time: None,
            end_time: None,
            leave_type: LeaveType::Vacation,
            day_count: Decimal::new(5, 0),
            status: LeaveStatus::Approved,
        };

        assert!(period.covers(make_date("2025-07-07")));
        assert!(period.covers(make_date("2025-07-11")));
        assert!(!period.covers(make_date("2025-07-12")));
        assert!(period.is_approved_for(LeaveType::Vacation, make_date("2025-07-09")));
        assert!(!period.is_approved_for(LeaveType::Sick, make_date("2025-07-09")));
    }

    #[test]
    fn test_pending_leave_is_not_approved_for_any_day() {
        let period = LeavePeriod {
            id: Uuid::new_v4(),
            subject_id: "worker_001".to_string(),
            start_date: make_date("2025-07-07"),
            end_date: make_date("2025-07-07"),
            full_day: true,
            start_time: None,
            end_time: None,
            leave_type: LeaveType::Vacation,
            day_count: Decimal::ONE,
            status: LeaveStatus::Pending,
        };
        assert!(!period.is_approved_for(LeaveType::Vacation, make_date("2025-07-07")));
    }

    #[test]
    fn test_time_entry_serialization() {
        let entry = TimeEntry {
            id: Uuid::new_v4(),
            subject_id: "worker_001".to_string(),
            start: make_datetime("2025-03-10", "09:00:00"),
            end: None,
            assignment_id: None,
            approved: false,
            notes: Some("front desk".to_string()),
        };

        let json = serde_json::to_string(&entry).unwrap();
        let deserialized: TimeEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, deserialized);
    }

    #[test]
    fn test_interval_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&IntervalKind::ScheduledShift).unwrap(),
            "\"scheduled_shift\""
        );
        let kind: IntervalKind = serde_json::from_str("\"time_entry\"").unwrap();
        assert_eq!(kind, IntervalKind::TimeEntry);
    }

    #[test]
    fn test_interval_kind_display() {
        assert_eq!(format!("{}", IntervalKind::TimeEntry), "time entry");
        assert_eq!(format!("{}", IntervalKind::ScheduledShift), "scheduled shift");
    }
}

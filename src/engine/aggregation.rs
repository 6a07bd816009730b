//! Worked-hour aggregation and attendance status derivation.
//!
//! The read side of the engine: daily and windowed worked-hour totals,
//! attendance status with the precedence sick > vacation > present >
//! absent, and roster-wide rollups where absence is the implicit default
//! state rather than a stored row.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::config::EnginePolicy;
use crate::error::EngineResult;
use crate::models::{AvailabilityStatus, IntervalKind, LeaveType, TimeEntry, overlaps};

use super::Engine;

/// Attendance status of a subject for a day or a window.
///
/// Derived, never stored. The variants are ordered by derivation
/// precedence: a sick day outranks a vacation day, which outranks
/// recorded presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    /// An approved sick leave period covers the day.
    Sick,
    /// An approved vacation leave period covers the day.
    Vacation,
    /// A time entry overlaps the day.
    Present,
    /// Nothing recorded; the default state.
    Absent,
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttendanceStatus::Sick => write!(f, "sick"),
            AttendanceStatus::Vacation => write!(f, "vacation"),
            AttendanceStatus::Present => write!(f, "present"),
            AttendanceStatus::Absent => write!(f, "absent"),
        }
    }
}

/// Aggregated result for a subject over a half-open time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSummary {
    /// The subject the summary covers.
    pub subject_id: String,
    /// Window start (inclusive).
    pub window_start: NaiveDateTime,
    /// Window end (exclusive).
    pub window_end: NaiveDateTime,
    /// Sum of closed-entry hours, rounded to the policy precision.
    pub worked_hours: Decimal,
    /// Attendance over the window, by day-status precedence.
    pub attendance: AttendanceStatus,
}

/// Per-day breakdown inside a summary window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    /// The calendar day.
    pub date: NaiveDate,
    /// Derived attendance status for the day.
    pub status: AttendanceStatus,
    /// Closed-entry hours for entries starting on the day.
    pub worked_hours: Decimal,
    /// The day's availability mark, where one was submitted.
    pub availability: Option<AvailabilityStatus>,
}

/// An in-progress clock session as reported by the real-time query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentSession {
    /// The open entry.
    pub entry: TimeEntry,
    /// Elapsed hours since the session started.
    pub elapsed_hours: Decimal,
}

/// The half-open week window containing `date`: Monday 00:00 up to the
/// following Monday 00:00.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use roster_engine::engine::week_window;
///
/// // 2025-03-12 is a Wednesday.
/// let (start, end) = week_window(NaiveDate::from_ymd_opt(2025, 3, 12).unwrap());
/// assert_eq!(start.date(), NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
/// assert_eq!(end.date(), NaiveDate::from_ymd_opt(2025, 3, 17).unwrap());
/// ```
pub fn week_window(date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let monday = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
    let start = monday.and_hms_opt(0, 0, 0).expect("valid midnight");
    let end = (monday + Duration::days(7))
        .and_hms_opt(0, 0, 0)
        .expect("valid midnight");
    (start, end)
}

fn round_hours(hours: Decimal, dp: u32) -> Decimal {
    let mut rounded = hours.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    // Pin the scale so 7 reports as 7.00 under the default precision.
    rounded.rescale(dp);
    rounded
}

impl Engine {
    /// Computes worked hours and attendance for a subject over a
    /// half-open window.
    ///
    /// Only closed entries whose start falls inside the window count;
    /// an open session contributes zero here and is reported by
    /// [`Engine::current_session`] instead. Totals are rounded to the
    /// policy precision with standard midpoint rounding, never truncated.
    pub fn aggregate(
        &self,
        subject_id: &str,
        window_start: NaiveDateTime,
        window_end: NaiveDateTime,
        policy: &EnginePolicy,
    ) -> EngineResult<WindowSummary> {
        let entries = self
            .store()
            .time_entries_in(subject_id, window_start, window_end)?;
        let total: Decimal = entries.iter().filter_map(TimeEntry::worked_hours).sum();

        let attendance = self.window_attendance(subject_id, window_start, window_end)?;

        Ok(WindowSummary {
            subject_id: subject_id.to_string(),
            window_start,
            window_end,
            worked_hours: round_hours(total, policy.hour_rounding_dp),
            attendance,
        })
    }

    /// Derives the attendance status of a subject for one calendar day.
    ///
    /// Precedence: sick if an approved sick leave period covers the day;
    /// else vacation if an approved vacation period covers it; else
    /// present if any time entry (open entries included) overlaps the
    /// day; else absent. The tagged leave type drives the decision;
    /// free-text notes never do.
    pub fn day_status(&self, subject_id: &str, date: NaiveDate) -> EngineResult<AttendanceStatus> {
        let leave = self.store().leave_periods_in(subject_id, date, date)?;
        if leave.iter().any(|p| p.is_approved_for(LeaveType::Sick, date)) {
            return Ok(AttendanceStatus::Sick);
        }
        if leave
            .iter()
            .any(|p| p.is_approved_for(LeaveType::Vacation, date))
        {
            return Ok(AttendanceStatus::Vacation);
        }

        let day_start = date.and_hms_opt(0, 0, 0).expect("valid midnight");
        let day_end = (date + Duration::days(1))
            .and_hms_opt(0, 0, 0)
            .expect("valid midnight");
        let spans = self.store().spans_near(
            subject_id,
            IntervalKind::TimeEntry,
            day_start,
            Some(day_end),
        )?;
        let present = spans
            .iter()
            .any(|s| overlaps(day_start, Some(day_end), Some(s.start), s.end));
        Ok(if present {
            AttendanceStatus::Present
        } else {
            AttendanceStatus::Absent
        })
    }

    /// Per-day summaries for an inclusive date range.
    pub fn day_summaries(
        &self,
        subject_id: &str,
        from: NaiveDate,
        to: NaiveDate,
        policy: &EnginePolicy,
    ) -> EngineResult<Vec<DaySummary>> {
        let mut summaries = Vec::new();
        let mut date = from;
        while date <= to {
            let day_start = date.and_hms_opt(0, 0, 0).expect("valid midnight");
            let day_end = (date + Duration::days(1))
                .and_hms_opt(0, 0, 0)
                .expect("valid midnight");
            let entries = self.store().time_entries_in(subject_id, day_start, day_end)?;
            let hours: Decimal = entries.iter().filter_map(TimeEntry::worked_hours).sum();

            summaries.push(DaySummary {
                date,
                status: self.day_status(subject_id, date)?,
                worked_hours: round_hours(hours, policy.hour_rounding_dp),
                availability: self
                    .store()
                    .availability_on(subject_id, date)?
                    .map(|m| m.status),
            });
            date += Duration::days(1);
        }
        Ok(summaries)
    }

    /// Windowed summaries for a set of subjects.
    ///
    /// A subject with nothing recorded in the window yields zero hours
    /// and absent status; absence needs no stored row.
    pub fn roster_rollup(
        &self,
        subject_ids: &[String],
        window_start: NaiveDateTime,
        window_end: NaiveDateTime,
        policy: &EnginePolicy,
    ) -> EngineResult<Vec<WindowSummary>> {
        subject_ids
            .iter()
            .map(|id| self.aggregate(id, window_start, window_end, policy))
            .collect()
    }

    /// The in-progress session of a subject, if one is open.
    ///
    /// Reports the running duration as `now - start`; this is the only
    /// place an open entry contributes a duration.
    pub fn current_session(
        &self,
        subject_id: &str,
        now: NaiveDateTime,
        policy: &EnginePolicy,
    ) -> EngineResult<Option<CurrentSession>> {
        let Some(entry) = self.store().open_time_entry(subject_id)? else {
            return Ok(None);
        };
        let seconds = (now - entry.start).num_seconds().max(0);
        let elapsed = Decimal::new(seconds, 0) / Decimal::new(3600, 0);
        Ok(Some(CurrentSession {
            entry,
            elapsed_hours: round_hours(elapsed, policy.hour_rounding_dp),
        }))
    }

    fn window_attendance(
        &self,
        subject_id: &str,
        window_start: NaiveDateTime,
        window_end: NaiveDateTime,
    ) -> EngineResult<AttendanceStatus> {
        let mut best = AttendanceStatus::Absent;
        let mut date = window_start.date();
        while date.and_hms_opt(0, 0, 0).expect("valid midnight") < window_end {
            match self.day_status(subject_id, date)? {
                AttendanceStatus::Sick => return Ok(AttendanceStatus::Sick),
                AttendanceStatus::Vacation => best = AttendanceStatus::Vacation,
                AttendanceStatus::Present => {
                    if best == AttendanceStatus::Absent {
                        best = AttendanceStatus::Present;
                    }
                }
                AttendanceStatus::Absent => {}
            }
            date += Duration::days(1);
        }
        Ok(best)
    }
}

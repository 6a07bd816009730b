//! Storage and collaborator contracts for the workforce engine.
//!
//! The engine's correctness rests on the query and serialization contract
//! defined here, not on any particular backend. The bundled
//! [`MemoryStore`] keeps everything behind one lock with per-subject
//! optimistic versioning; a SQL backend would satisfy the same trait with
//! row-level locks.

mod memory;

use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::{
    AvailabilityMark, IntervalKind, LeaveBalance, LeavePeriod, LeaveStatus, PresenceState,
    ScheduledShift, ShiftStatus, Subject, TimeEntry,
};

pub use memory::{LoggingPresenceSink, MemoryDirectory, MemoryStore};

/// A stored interval reduced to the fields the overlap test needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSpan {
    /// The id of the stored interval.
    pub id: Uuid,
    /// Start instant.
    pub start: NaiveDateTime,
    /// End instant; `None` for an open interval.
    pub end: Option<NaiveDateTime>,
}

/// Durable ordered storage of time-stamped intervals keyed by subject.
///
/// Every mutation takes the version the caller observed for the touched
/// (subject, kind) pair and must fail with `WriteConflict` if the version
/// has since moved. That check is the per-subject serialization that keeps
/// two racing clock-ins from both succeeding: both read `CLOSED`, both
/// attempt the insert, exactly one commit bumps the version and the other
/// observes the mismatch.
///
/// Implementations must bound lock wait time and surface a retryable
/// conflict rather than deadlock; `StoreUnavailable` marks an unreachable
/// backend and is never retried by the engine.
pub trait IntervalStore: Send + Sync {
    /// Current version for a (subject, kind) pair. Starts at zero for
    /// subjects with no records.
    fn version(&self, subject_id: &str, kind: IntervalKind) -> EngineResult<u64>;

    /// The open time entry for a subject, if one exists.
    fn open_time_entry(&self, subject_id: &str) -> EngineResult<Option<TimeEntry>>;

    /// Closed and open time entries whose start falls in `[from, to)`.
    fn time_entries_in(
        &self,
        subject_id: &str,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> EngineResult<Vec<TimeEntry>>;

    /// Inserts a time entry. Fails with `WriteConflict` on version mismatch.
    fn insert_time_entry(&self, expected_version: u64, entry: TimeEntry) -> EngineResult<()>;

    /// Sets the end instant of an open entry and returns the closed entry.
    fn close_time_entry(
        &self,
        subject_id: &str,
        expected_version: u64,
        entry_id: Uuid,
        end: NaiveDateTime,
    ) -> EngineResult<TimeEntry>;

    /// Shifts intersecting the window `[from, to)`, any status.
    fn shifts_in(
        &self,
        subject_id: &str,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> EngineResult<Vec<ScheduledShift>>;

    /// Inserts a scheduled shift. Fails with `WriteConflict` on version
    /// mismatch.
    fn insert_shift(&self, expected_version: u64, shift: ScheduledShift) -> EngineResult<()>;

    /// Updates the status of an existing shift and returns it.
    fn update_shift_status(
        &self,
        subject_id: &str,
        expected_version: u64,
        shift_id: Uuid,
        status: ShiftStatus,
    ) -> EngineResult<ScheduledShift>;

    /// Spans of `kind` that could overlap a candidate window: stored end
    /// is absent or at/after `from`, and stored start is before `to`
    /// (unbounded candidate when `to` is `None`). Cancelled shifts are
    /// not returned.
    fn spans_near(
        &self,
        subject_id: &str,
        kind: IntervalKind,
        from: NaiveDateTime,
        to: Option<NaiveDateTime>,
    ) -> EngineResult<Vec<StoredSpan>>;

    /// The availability mark for a subject on a calendar day.
    fn availability_on(
        &self,
        subject_id: &str,
        date: NaiveDate,
    ) -> EngineResult<Option<AvailabilityMark>>;

    /// Upserts the availability mark for its (subject, date) key.
    fn put_availability(&self, expected_version: u64, mark: AvailabilityMark) -> EngineResult<()>;

    /// Leave periods whose date range intersects `[from, to]` (inclusive
    /// dates), any status.
    fn leave_periods_in(
        &self,
        subject_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<LeavePeriod>>;

    /// Inserts a leave period.
    fn insert_leave_period(&self, expected_version: u64, period: LeavePeriod) -> EngineResult<()>;

    /// Looks up a single leave period by id.
    fn leave_period(&self, subject_id: &str, period_id: Uuid)
    -> EngineResult<Option<LeavePeriod>>;

    /// Updates the status of an existing leave period and returns it.
    fn set_leave_status(
        &self,
        subject_id: &str,
        expected_version: u64,
        period_id: Uuid,
        status: LeaveStatus,
    ) -> EngineResult<LeavePeriod>;

    /// The balance for a (subject, year) key together with its version.
    /// Returns version zero alongside `None` for keys never written.
    fn leave_balance(
        &self,
        subject_id: &str,
        year: i32,
    ) -> EngineResult<(Option<LeaveBalance>, u64)>;

    /// Upserts the balance for its (subject, year) key. Fails with
    /// `WriteConflict` on version mismatch.
    fn put_leave_balance(&self, expected_version: u64, balance: LeaveBalance) -> EngineResult<()>;
}

/// Identity service contract: supplies subject records the engine trusts.
///
/// Authorization has already happened by the time the engine is called;
/// the directory only resolves ids and company rosters.
pub trait SubjectDirectory: Send + Sync {
    /// Resolves a subject id, failing with `SubjectNotFound`.
    fn subject(&self, subject_id: &str) -> EngineResult<Subject>;

    /// All active subjects affiliated with a company.
    fn company_roster(&self, company_id: &str) -> EngineResult<Vec<Subject>>;
}

/// Best-effort presence sink notified on clock transitions.
///
/// Delivery failure must never fail the state transition that triggered
/// it; the engine logs and moves on.
pub trait PresenceSink: Send + Sync {
    /// Reports that a subject's live status changed.
    fn presence_changed(&self, subject_id: &str, state: PresenceState) -> EngineResult<()>;
}

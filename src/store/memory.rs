//! In-memory store, directory, and presence sink implementations.
//!
//! The memory store keeps all interval records behind a single `RwLock`
//! with a version counter per (subject, kind) pair. Version checks and
//! mutations happen under one write-lock acquisition, so of two racing
//! writers that read the same version, exactly one commits; the other
//! observes a `WriteConflict`.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::info;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    AvailabilityMark, IntervalKind, LeaveBalance, LeavePeriod, LeaveStatus, PresenceState,
    ScheduledShift, ShiftStatus, Subject, TimeEntry,
};

use super::{IntervalStore, PresenceSink, StoredSpan, SubjectDirectory};

#[derive(Debug, Default)]
struct SubjectRecords {
    time_entries: Vec<TimeEntry>,
    shifts: Vec<ScheduledShift>,
    availability: Vec<AvailabilityMark>,
    leave: Vec<LeavePeriod>,
    versions: HashMap<IntervalKind, u64>,
}

impl SubjectRecords {
    fn version(&self, kind: IntervalKind) -> u64 {
        self.versions.get(&kind).copied().unwrap_or(0)
    }

    fn check_and_bump(&mut self, subject_id: &str, kind: IntervalKind, expected: u64) -> EngineResult<()> {
        let current = self.version(kind);
        if current != expected {
            return Err(EngineError::WriteConflict {
                subject_id: subject_id.to_string(),
                message: format!("{kind} version is {current}, caller read {expected}"),
            });
        }
        self.versions.insert(kind, current + 1);
        Ok(())
    }
}

/// In-memory [`IntervalStore`] implementation.
///
/// Suitable for tests and single-process deployments; the trait contract
/// is what a SQL backend would implement with row locks.
#[derive(Debug, Default)]
pub struct MemoryStore {
    subjects: RwLock<HashMap<String, SubjectRecords>>,
    balances: RwLock<HashMap<(String, i32), (LeaveBalance, u64)>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> EngineResult<std::sync::RwLockReadGuard<'_, HashMap<String, SubjectRecords>>> {
        self.subjects.read().map_err(|_| EngineError::StoreUnavailable {
            message: "interval store lock poisoned".to_string(),
        })
    }

    fn write(
        &self,
    ) -> EngineResult<std::sync::RwLockWriteGuard<'_, HashMap<String, SubjectRecords>>> {
        self.subjects.write().map_err(|_| EngineError::StoreUnavailable {
            message: "interval store lock poisoned".to_string(),
        })
    }
}

impl IntervalStore for MemoryStore {
    fn version(&self, subject_id: &str, kind: IntervalKind) -> EngineResult<u64> {
        let guard = self.read()?;
        Ok(guard.get(subject_id).map(|r| r.version(kind)).unwrap_or(0))
    }

    fn open_time_entry(&self, subject_id: &str) -> EngineResult<Option<TimeEntry>> {
        let guard = self.read()?;
        Ok(guard
            .get(subject_id)
            .and_then(|r| r.time_entries.iter().find(|e| e.is_open()).cloned()))
    }

    fn time_entries_in(
        &self,
        subject_id: &str,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> EngineResult<Vec<TimeEntry>> {
        let guard = self.read()?;
        let mut entries: Vec<TimeEntry> = guard
            .get(subject_id)
            .map(|r| {
                r.time_entries
                    .iter()
                    .filter(|e| e.start >= from && e.start < to)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        entries.sort_by_key(|e| e.start);
        Ok(entries)
    }

    fn insert_time_entry(&self, expected_version: u64, entry: TimeEntry) -> EngineResult<()> {
        let mut guard = self.write()?;
        let subject_id = entry.subject_id.clone();
        let records = guard.entry(subject_id.clone()).or_default();
        records.check_and_bump(&subject_id, IntervalKind::TimeEntry, expected_version)?;
        records.time_entries.push(entry);
        Ok(())
    }

    fn close_time_entry(
        &self,
        subject_id: &str,
        expected_version: u64,
        entry_id: Uuid,
        end: NaiveDateTime,
    ) -> EngineResult<TimeEntry> {
        let mut guard = self.write()?;
        let records = guard.entry(subject_id.to_string()).or_default();
        records.check_and_bump(subject_id, IntervalKind::TimeEntry, expected_version)?;
        let entry = records
            .time_entries
            .iter_mut()
            .find(|e| e.id == entry_id && e.is_open())
            .ok_or_else(|| EngineError::WriteConflict {
                subject_id: subject_id.to_string(),
                message: format!("open time entry {entry_id} no longer present"),
            })?;
        entry.end = Some(end);
        Ok(entry.clone())
    }

    fn shifts_in(
        &self,
        subject_id: &str,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> EngineResult<Vec<ScheduledShift>> {
        let guard = self.read()?;
        let mut shifts: Vec<ScheduledShift> = guard
            .get(subject_id)
            .map(|r| {
                r.shifts
                    .iter()
                    .filter(|s| s.start < to && s.end > from)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        shifts.sort_by_key(|s| s.start);
        Ok(shifts)
    }

    fn insert_shift(&self, expected_version: u64, shift: ScheduledShift) -> EngineResult<()> {
        let mut guard = self.write()?;
        let subject_id = shift.subject_id.clone();
        let records = guard.entry(subject_id.clone()).or_default();
        records.check_and_bump(&subject_id, IntervalKind::ScheduledShift, expected_version)?;
        records.shifts.push(shift);
        Ok(())
    }

    fn update_shift_status(
        &self,
        subject_id: &str,
        expected_version: u64,
        shift_id: Uuid,
        status: ShiftStatus,
    ) -> EngineResult<ScheduledShift> {
        let mut guard = self.write()?;
        let records = guard.entry(subject_id.to_string()).or_default();
        records.check_and_bump(subject_id, IntervalKind::ScheduledShift, expected_version)?;
        let shift = records
            .shifts
            .iter_mut()
            .find(|s| s.id == shift_id)
            .ok_or_else(|| EngineError::InvalidInterval {
                message: format!("no scheduled shift {shift_id} for subject '{subject_id}'"),
            })?;
        shift.status = status;
        Ok(shift.clone())
    }

    fn spans_near(
        &self,
        subject_id: &str,
        kind: IntervalKind,
        from: NaiveDateTime,
        to: Option<NaiveDateTime>,
    ) -> EngineResult<Vec<StoredSpan>> {
        let guard = self.read()?;
        let Some(records) = guard.get(subject_id) else {
            return Ok(Vec::new());
        };

        let starts_before_to = |start: NaiveDateTime| to.is_none_or(|t| start < t);
        let ends_at_or_after_from =
            |end: Option<NaiveDateTime>| end.is_none_or(|e| e >= from);

        let spans = match kind {
            IntervalKind::TimeEntry => records
                .time_entries
                .iter()
                .filter(|e| starts_before_to(e.start) && ends_at_or_after_from(e.end))
                .map(|e| StoredSpan {
                    id: e.id,
                    start: e.start,
                    end: e.end,
                })
                .collect(),
            IntervalKind::ScheduledShift => records
                .shifts
                .iter()
                .filter(|s| s.blocks_calendar())
                .filter(|s| starts_before_to(s.start) && ends_at_or_after_from(Some(s.end)))
                .map(|s| StoredSpan {
                    id: s.id,
                    start: s.start,
                    end: Some(s.end),
                })
                .collect(),
            IntervalKind::AvailabilityMark => records
                .availability
                .iter()
                .map(|m| day_span(m.id, m.date, m.date))
                .filter(|s| starts_before_to(s.start) && ends_at_or_after_from(s.end))
                .collect(),
            IntervalKind::LeavePeriod => records
                .leave
                .iter()
                .map(|p| day_span(p.id, p.start_date, p.end_date))
                .filter(|s| starts_before_to(s.start) && ends_at_or_after_from(s.end))
                .collect(),
        };
        Ok(spans)
    }

    fn availability_on(
        &self,
        subject_id: &str,
        date: NaiveDate,
    ) -> EngineResult<Option<AvailabilityMark>> {
        let guard = self.read()?;
        Ok(guard
            .get(subject_id)
            .and_then(|r| r.availability.iter().find(|m| m.date == date).cloned()))
    }

    fn put_availability(&self, expected_version: u64, mark: AvailabilityMark) -> EngineResult<()> {
        let mut guard = self.write()?;
        let subject_id = mark.subject_id.clone();
        let records = guard.entry(subject_id.clone()).or_default();
        records.check_and_bump(&subject_id, IntervalKind::AvailabilityMark, expected_version)?;
        // One mark per calendar day; a resubmission replaces the old mark.
        records.availability.retain(|m| m.date != mark.date);
        records.availability.push(mark);
        Ok(())
    }

    fn leave_periods_in(
        &self,
        subject_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<LeavePeriod>> {
        let guard = self.read()?;
        Ok(guard
            .get(subject_id)
            .map(|r| {
                r.leave
                    .iter()
                    .filter(|p| p.start_date <= to && p.end_date >= from)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn insert_leave_period(&self, expected_version: u64, period: LeavePeriod) -> EngineResult<()> {
        let mut guard = self.write()?;
        let subject_id = period.subject_id.clone();
        let records = guard.entry(subject_id.clone()).or_default();
        records.check_and_bump(&subject_id, IntervalKind::LeavePeriod, expected_version)?;
        records.leave.push(period);
        Ok(())
    }

    fn leave_period(
        &self,
        subject_id: &str,
        period_id: Uuid,
    ) -> EngineResult<Option<LeavePeriod>> {
        let guard = self.read()?;
        Ok(guard
            .get(subject_id)
            .and_then(|r| r.leave.iter().find(|p| p.id == period_id).cloned()))
    }

    fn set_leave_status(
        &self,
        subject_id: &str,
        expected_version: u64,
        period_id: Uuid,
        status: LeaveStatus,
    ) -> EngineResult<LeavePeriod> {
        let mut guard = self.write()?;
        let records = guard.entry(subject_id.to_string()).or_default();
        records.check_and_bump(subject_id, IntervalKind::LeavePeriod, expected_version)?;
        let period = records
            .leave
            .iter_mut()
            .find(|p| p.id == period_id)
            .ok_or_else(|| EngineError::InvalidInterval {
                message: format!("no leave period {period_id} for subject '{subject_id}'"),
            })?;
        period.status = status;
        Ok(period.clone())
    }

    fn leave_balance(
        &self,
        subject_id: &str,
        year: i32,
    ) -> EngineResult<(Option<LeaveBalance>, u64)> {
        let guard = self.balances.read().map_err(|_| EngineError::StoreUnavailable {
            message: "balance store lock poisoned".to_string(),
        })?;
        Ok(guard
            .get(&(subject_id.to_string(), year))
            .map(|(balance, version)| (Some(balance.clone()), *version))
            .unwrap_or((None, 0)))
    }

    fn put_leave_balance(&self, expected_version: u64, balance: LeaveBalance) -> EngineResult<()> {
        let mut guard = self.balances.write().map_err(|_| EngineError::StoreUnavailable {
            message: "balance store lock poisoned".to_string(),
        })?;
        let key = (balance.subject_id.clone(), balance.year);
        let current = guard.get(&key).map(|(_, v)| *v).unwrap_or(0);
        if current != expected_version {
            return Err(EngineError::WriteConflict {
                subject_id: balance.subject_id,
                message: format!(
                    "leave balance version for {} is {current}, caller read {expected_version}",
                    balance.year
                ),
            });
        }
        guard.insert(key, (balance, current + 1));
        Ok(())
    }
}

fn day_span(id: Uuid, start_date: NaiveDate, end_date: NaiveDate) -> StoredSpan {
    StoredSpan {
        id,
        start: start_date.and_hms_opt(0, 0, 0).expect("valid midnight"),
        end: (end_date + chrono::Duration::days(1)).and_hms_opt(0, 0, 0),
    }
}

/// In-memory [`SubjectDirectory`] implementation.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    subjects: RwLock<HashMap<String, Subject>>,
}

impl MemoryDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces a subject record.
    pub fn insert(&self, subject: Subject) {
        let mut guard = self.subjects.write().expect("directory lock poisoned");
        guard.insert(subject.id.clone(), subject);
    }
}

impl SubjectDirectory for MemoryDirectory {
    fn subject(&self, subject_id: &str) -> EngineResult<Subject> {
        let guard = self.subjects.read().map_err(|_| EngineError::StoreUnavailable {
            message: "directory lock poisoned".to_string(),
        })?;
        guard
            .get(subject_id)
            .cloned()
            .ok_or_else(|| EngineError::SubjectNotFound {
                subject_id: subject_id.to_string(),
            })
    }

    fn company_roster(&self, company_id: &str) -> EngineResult<Vec<Subject>> {
        let guard = self.subjects.read().map_err(|_| EngineError::StoreUnavailable {
            message: "directory lock poisoned".to_string(),
        })?;
        let mut roster: Vec<Subject> = guard
            .values()
            .filter(|s| s.company_id == company_id && s.active)
            .cloned()
            .collect();
        roster.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(roster)
    }
}

/// Presence sink that records transitions to the log and nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingPresenceSink;

impl PresenceSink for LoggingPresenceSink {
    fn presence_changed(&self, subject_id: &str, state: PresenceState) -> EngineResult<()> {
        info!(subject_id, ?state, "presence changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmploymentCategory, SubjectRole};
    use rust_decimal::Decimal;

    fn make_datetime(date_str: &str, time_str: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{} {}", date_str, time_str), "%Y-%m-%d %H:%M:%S")
            .unwrap()
    }

    fn make_entry(subject_id: &str, start: NaiveDateTime, end: Option<NaiveDateTime>) -> TimeEntry {
        TimeEntry {
            id: Uuid::new_v4(),
            subject_id: subject_id.to_string(),
            start,
            end,
            assignment_id: None,
            approved: false,
            notes: None,
        }
    }

    #[test]
    fn test_version_starts_at_zero() {
        let store = MemoryStore::new();
        assert_eq!(store.version("worker_001", IntervalKind::TimeEntry).unwrap(), 0);
    }

    #[test]
    fn test_insert_bumps_version() {
        let store = MemoryStore::new();
        let entry = make_entry("worker_001", make_datetime("2025-03-10", "09:00:00"), None);
        store.insert_time_entry(0, entry).unwrap();
        assert_eq!(store.version("worker_001", IntervalKind::TimeEntry).unwrap(), 1);
        // Other kinds are unaffected.
        assert_eq!(
            store.version("worker_001", IntervalKind::ScheduledShift).unwrap(),
            0
        );
    }

    #[test]
    fn test_stale_version_is_rejected() {
        let store = MemoryStore::new();
        let first = make_entry(
            "worker_001",
            make_datetime("2025-03-10", "09:00:00"),
            Some(make_datetime("2025-03-10", "12:00:00")),
        );
        store.insert_time_entry(0, first).unwrap();

        let second = make_entry("worker_001", make_datetime("2025-03-10", "13:00:00"), None);
        let result = store.insert_time_entry(0, second);
        assert!(matches!(result, Err(EngineError::WriteConflict { .. })));
    }

    #[test]
    fn test_open_entry_lookup() {
        let store = MemoryStore::new();
        let open = make_entry("worker_001", make_datetime("2025-03-10", "09:00:00"), None);
        let open_id = open.id;
        store.insert_time_entry(0, open).unwrap();

        let found = store.open_time_entry("worker_001").unwrap().unwrap();
        assert_eq!(found.id, open_id);
        assert_eq!(store.open_time_entry("worker_002").unwrap(), None);
    }

    #[test]
    fn test_close_time_entry_sets_end() {
        let store = MemoryStore::new();
        let open = make_entry("worker_001", make_datetime("2025-03-10", "09:00:00"), None);
        let open_id = open.id;
        store.insert_time_entry(0, open).unwrap();

        let closed = store
            .close_time_entry(
                "worker_001",
                1,
                open_id,
                make_datetime("2025-03-10", "17:00:00"),
            )
            .unwrap();
        assert_eq!(closed.end, Some(make_datetime("2025-03-10", "17:00:00")));
        assert_eq!(store.open_time_entry("worker_001").unwrap(), None);
    }

    #[test]
    fn test_spans_near_excludes_cancelled_shifts() {
        let store = MemoryStore::new();
        let mut shift = ScheduledShift {
            id: Uuid::new_v4(),
            subject_id: "worker_001".to_string(),
            start: make_datetime("2025-03-10", "09:00:00"),
            end: make_datetime("2025-03-10", "17:00:00"),
            role_label: "host".to_string(),
            status: ShiftStatus::Scheduled,
            assignment_id: None,
        };
        store.insert_shift(0, shift.clone()).unwrap();
        shift.id = Uuid::new_v4();
        shift.status = ShiftStatus::Cancelled;
        store.insert_shift(1, shift).unwrap();

        let spans = store
            .spans_near(
                "worker_001",
                IntervalKind::ScheduledShift,
                make_datetime("2025-03-10", "00:00:00"),
                Some(make_datetime("2025-03-11", "00:00:00")),
            )
            .unwrap();
        assert_eq!(spans.len(), 1);
    }

    #[test]
    fn test_availability_upsert_replaces_mark_for_day() {
        let store = MemoryStore::new();
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let mark = AvailabilityMark {
            id: Uuid::new_v4(),
            subject_id: "worker_001".to_string(),
            date,
            status: crate::models::AvailabilityStatus::Available,
            partial_hours: None,
        };
        store.put_availability(0, mark).unwrap();

        let replacement = AvailabilityMark {
            id: Uuid::new_v4(),
            subject_id: "worker_001".to_string(),
            date,
            status: crate::models::AvailabilityStatus::Partial,
            partial_hours: Some(Decimal::new(4, 0)),
        };
        store.put_availability(1, replacement).unwrap();

        let found = store.availability_on("worker_001", date).unwrap().unwrap();
        assert_eq!(found.status, crate::models::AvailabilityStatus::Partial);
    }

    #[test]
    fn test_leave_balance_upsert_and_versioning() {
        let store = MemoryStore::new();
        let (none, version) = store.leave_balance("worker_001", 2025).unwrap();
        assert!(none.is_none());
        assert_eq!(version, 0);

        let balance = LeaveBalance::fresh("worker_001", 2025, Decimal::new(25, 0), Decimal::ZERO);
        store.put_leave_balance(0, balance.clone()).unwrap();

        let (found, version) = store.leave_balance("worker_001", 2025).unwrap();
        assert_eq!(found.unwrap().days_total, Decimal::new(25, 0));
        assert_eq!(version, 1);

        // A stale writer loses.
        let stale = store.put_leave_balance(0, balance);
        assert!(matches!(stale, Err(EngineError::WriteConflict { .. })));
    }

    #[test]
    fn test_directory_roster_filters_company_and_active() {
        let directory = MemoryDirectory::new();
        directory.insert(Subject {
            id: "worker_001".to_string(),
            employment_category: EmploymentCategory::Permanent,
            role: SubjectRole::Employee,
            company_id: "acme".to_string(),
            active: true,
        });
        directory.insert(Subject {
            id: "worker_002".to_string(),
            employment_category: EmploymentCategory::FlexWorker,
            role: SubjectRole::Employee,
            company_id: "acme".to_string(),
            active: false,
        });
        directory.insert(Subject {
            id: "worker_003".to_string(),
            employment_category: EmploymentCategory::Permanent,
            role: SubjectRole::Employee,
            company_id: "other".to_string(),
            active: true,
        });

        let roster = directory.company_roster("acme").unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].id, "worker_001");
    }

    #[test]
    fn test_directory_unknown_subject() {
        let directory = MemoryDirectory::new();
        let result = directory.subject("ghost");
        assert!(matches!(result, Err(EngineError::SubjectNotFound { .. })));
    }
}

//! Core data models for the workforce engine.
//!
//! This module contains all the domain models used throughout the engine.

mod interval;
mod leave_balance;
mod subject;

pub use interval::{
    AvailabilityMark, AvailabilityStatus, IntervalKind, LeavePeriod, LeaveStatus, LeaveType,
    ScheduledShift, ShiftStatus, TimeEntry, overlaps,
};
pub use leave_balance::LeaveBalance;
pub use subject::{EmploymentCategory, PresenceState, Subject, SubjectRole};

//! Request types for the roster engine API.
//!
//! This module defines the JSON request structures for all mutating
//! endpoints and their conversions into engine-side types.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::{ClockContext, LeaveDraft, ShiftDraft, SyncAction, SyncActionKind};
use crate::models::{AvailabilityStatus, LeaveType, ShiftStatus};

/// Request body for the `/clock-in` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockInRequest {
    /// The subject opening a session.
    pub subject_id: String,
    /// The device-recorded timestamp of the event.
    pub timestamp: NaiveDateTime,
    /// Optional linked work assignment.
    #[serde(default)]
    pub assignment_id: Option<Uuid>,
    /// Optional free-text notes.
    #[serde(default)]
    pub notes: Option<String>,
}

impl ClockInRequest {
    /// Extracts the work context of the clock-in.
    pub fn context(&self) -> ClockContext {
        ClockContext {
            assignment_id: self.assignment_id,
            notes: self.notes.clone(),
        }
    }
}

/// Request body for the `/clock-out` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockOutRequest {
    /// The subject closing its session.
    pub subject_id: String,
    /// The device-recorded timestamp of the event.
    pub timestamp: NaiveDateTime,
}

/// Request body for the `/shifts` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftRequest {
    /// The subject to book.
    pub subject_id: String,
    /// Planned start.
    pub start: NaiveDateTime,
    /// Planned end.
    pub end: NaiveDateTime,
    /// Role label for the shift.
    pub role_label: String,
    /// Optional linked work assignment.
    #[serde(default)]
    pub assignment_id: Option<Uuid>,
}

impl From<ShiftRequest> for ShiftDraft {
    fn from(req: ShiftRequest) -> Self {
        ShiftDraft {
            subject_id: req.subject_id,
            start: req.start,
            end: req.end,
            role_label: req.role_label,
            assignment_id: req.assignment_id,
        }
    }
}

/// Request body for the `/shifts/:id/status` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftStatusRequest {
    /// The subject owning the shift.
    pub subject_id: String,
    /// The status to set.
    pub status: ShiftStatus,
}

/// Request body for the `/time-entries` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeEntryRequest {
    /// The subject the entry belongs to.
    pub subject_id: String,
    /// Entry start.
    pub start: NaiveDateTime,
    /// Entry end.
    pub end: NaiveDateTime,
    /// Optional linked work assignment.
    #[serde(default)]
    pub assignment_id: Option<Uuid>,
    /// Optional free-text notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// One item in a `/sync` batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncActionRequest {
    /// Whether to open or close a session.
    pub action: SyncActionKind,
    /// The subject the action belongs to.
    pub subject_id: String,
    /// The device-recorded timestamp of the event.
    pub timestamp: NaiveDateTime,
    /// Optional linked work assignment, for start actions.
    #[serde(default)]
    pub assignment_id: Option<Uuid>,
    /// Optional free-text notes, for start actions.
    #[serde(default)]
    pub notes: Option<String>,
}

impl From<SyncActionRequest> for SyncAction {
    fn from(req: SyncActionRequest) -> Self {
        SyncAction {
            action: req.action,
            subject_id: req.subject_id,
            timestamp: req.timestamp,
            context: ClockContext {
                assignment_id: req.assignment_id,
                notes: req.notes,
            },
        }
    }
}

/// Request body for the `/sync` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRequest {
    /// The batched actions, in device order.
    pub actions: Vec<SyncActionRequest>,
}

/// Request body for the `/availability` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityRequest {
    /// The subject submitting availability.
    pub subject_id: String,
    /// The calendar day being marked.
    pub date: NaiveDate,
    /// The availability status for the day.
    pub status: AvailabilityStatus,
    /// Available hours for a partial day.
    #[serde(default)]
    pub partial_hours: Option<Decimal>,
}

/// Request body for the `/leave/request` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveRequest {
    /// The subject requesting leave.
    pub subject_id: String,
    /// First day of leave (inclusive).
    pub start_date: NaiveDate,
    /// Last day of leave (inclusive).
    pub end_date: NaiveDate,
    /// Whether the period covers whole days.
    #[serde(default = "default_full_day")]
    pub full_day: bool,
    /// Start time of day for a partial-day request.
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    /// End time of day for a partial-day request.
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    /// The tagged leave type.
    pub leave_type: LeaveType,
    /// Days the period consumes.
    pub day_count: Decimal,
}

fn default_full_day() -> bool {
    true
}

impl From<LeaveRequest> for LeaveDraft {
    fn from(req: LeaveRequest) -> Self {
        LeaveDraft {
            subject_id: req.subject_id,
            start_date: req.start_date,
            end_date: req.end_date,
            full_day: req.full_day,
            start_time: req.start_time,
            end_time: req.end_time,
            leave_type: req.leave_type,
            day_count: req.day_count,
        }
    }
}

/// Request body for the `/leave/allocate` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationRequest {
    /// The company whose roster to allocate.
    pub company_id: String,
    /// The entitlement year.
    pub year: i32,
    /// Override for the default vacation days; the policy default applies
    /// when absent.
    #[serde(default)]
    pub days_total: Option<Decimal>,
    /// Override for the default compensation hours; the policy default
    /// applies when absent.
    #[serde(default)]
    pub compensation_hours: Option<Decimal>,
}

/// Request body for the `/leave/approve` and `/leave/reject` endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveDecisionRequest {
    /// The subject owning the period.
    pub subject_id: String,
    /// The period being decided.
    pub period_id: Uuid,
}

/// Request body for the `/reports/roster` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterReportRequest {
    /// The subjects to roll up.
    pub subject_ids: Vec<String>,
    /// Any date inside the week to report on.
    pub date: NaiveDate,
}

/// Query parameters for the `/subjects/:id/summary` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SummaryQuery {
    /// Any date inside the week to summarize.
    pub date: NaiveDate,
}

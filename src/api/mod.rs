//! HTTP API module for the roster engine.
//!
//! This module provides the REST API endpoints for clock sessions,
//! shift booking, offline sync, summaries, and leave management.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{
    AllocationRequest, AvailabilityRequest, ClockInRequest, ClockOutRequest, LeaveDecisionRequest,
    LeaveRequest, RosterReportRequest, ShiftRequest, ShiftStatusRequest, SyncActionRequest,
    SyncRequest, TimeEntryRequest,
};
pub use response::{ApiError, SummaryResponse, SyncItemResponse, SyncResponse};
pub use state::AppState;

//! HTTP request handlers for the roster engine API.
//!
//! This module contains the handler functions for all API endpoints.
//! Every mutating route is a thin adapter: parse the request, call one
//! engine operation, map the result. All temporal rules live in the
//! engine, never here.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::{week_window, AllocationDefaults, SyncAction};

use super::request::{
    AllocationRequest, AvailabilityRequest, ClockInRequest, ClockOutRequest, LeaveDecisionRequest,
    LeaveRequest, RosterReportRequest, ShiftRequest, ShiftStatusRequest, SummaryQuery, SyncRequest,
    TimeEntryRequest,
};
use super::response::{ApiError, ApiErrorResponse, SummaryResponse, SyncItemResponse, SyncResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/clock-in", post(clock_in_handler))
        .route("/clock-out", post(clock_out_handler))
        .route("/sync", post(sync_handler))
        .route("/shifts", post(create_shift_handler))
        .route("/shifts/:id/status", patch(shift_status_handler))
        .route("/time-entries", post(time_entry_handler))
        .route("/availability", post(availability_handler))
        .route("/subjects/:id/summary", get(summary_handler))
        .route("/reports/roster", post(roster_report_handler))
        .route("/leave/request", post(leave_request_handler))
        .route("/leave/approve", post(leave_approve_handler))
        .route("/leave/reject", post(leave_reject_handler))
        .route("/leave/allocate", post(allocation_handler))
        .with_state(state)
}

/// Turns an axum JSON rejection into the API error body.
fn rejection_error(correlation_id: Uuid, rejection: JsonRejection) -> ApiError {
    match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    }
}

/// Renders a bad-request response for a failed body parse.
fn bad_request(error: ApiError) -> Response {
    (
        StatusCode::BAD_REQUEST,
        [(header::CONTENT_TYPE, "application/json")],
        Json(error),
    )
        .into_response()
}

/// Renders an engine result as JSON with the mapped status code.
fn engine_response<T: Serialize>(
    correlation_id: Uuid,
    result: Result<T, crate::error::EngineError>,
) -> Response {
    match result {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            Json(body),
        )
            .into_response(),
        Err(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "Request rejected");
            let api_error: ApiErrorResponse = err.into();
            (
                api_error.status,
                [(header::CONTENT_TYPE, "application/json")],
                Json(api_error.error),
            )
                .into_response()
        }
    }
}

/// Handler for POST /clock-in.
async fn clock_in_handler(
    State(state): State<AppState>,
    payload: Result<Json<ClockInRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return bad_request(rejection_error(correlation_id, rejection)),
    };

    info!(
        correlation_id = %correlation_id,
        subject_id = %request.subject_id,
        "Processing clock-in"
    );
    let context = request.context();
    let result = state
        .engine()
        .clock_in(&request.subject_id, context, request.timestamp);
    engine_response(correlation_id, result)
}

/// Handler for POST /clock-out.
async fn clock_out_handler(
    State(state): State<AppState>,
    payload: Result<Json<ClockOutRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return bad_request(rejection_error(correlation_id, rejection)),
    };

    info!(
        correlation_id = %correlation_id,
        subject_id = %request.subject_id,
        "Processing clock-out"
    );
    let result = state
        .engine()
        .clock_out(&request.subject_id, request.timestamp);
    engine_response(correlation_id, result)
}

/// Handler for POST /sync.
///
/// Always answers 200: per-item rejections live in the response body,
/// never in the HTTP status.
async fn sync_handler(
    State(state): State<AppState>,
    payload: Result<Json<SyncRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return bad_request(rejection_error(correlation_id, rejection)),
    };

    info!(
        correlation_id = %correlation_id,
        actions = request.actions.len(),
        "Processing offline-sync batch"
    );
    let actions: Vec<SyncAction> = request.actions.into_iter().map(Into::into).collect();
    let results: Vec<SyncItemResponse> = state
        .engine()
        .process_sync_batch(actions)
        .into_iter()
        .map(Into::into)
        .collect();
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        Json(SyncResponse { results }),
    )
        .into_response()
}

/// Handler for POST /shifts.
async fn create_shift_handler(
    State(state): State<AppState>,
    payload: Result<Json<ShiftRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return bad_request(rejection_error(correlation_id, rejection)),
    };

    info!(
        correlation_id = %correlation_id,
        subject_id = %request.subject_id,
        "Booking shift"
    );
    let now = Utc::now().naive_utc();
    let result = state.engine().create_shift(request.into(), now);
    engine_response(correlation_id, result)
}

/// Handler for PATCH /shifts/:id/status.
async fn shift_status_handler(
    State(state): State<AppState>,
    Path(shift_id): Path<Uuid>,
    payload: Result<Json<ShiftStatusRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return bad_request(rejection_error(correlation_id, rejection)),
    };

    info!(
        correlation_id = %correlation_id,
        subject_id = %request.subject_id,
        shift_id = %shift_id,
        status = ?request.status,
        "Updating shift status"
    );
    let result = state
        .engine()
        .set_shift_status(&request.subject_id, shift_id, request.status);
    engine_response(correlation_id, result)
}

/// Handler for POST /time-entries.
async fn time_entry_handler(
    State(state): State<AppState>,
    payload: Result<Json<TimeEntryRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return bad_request(rejection_error(correlation_id, rejection)),
    };

    info!(
        correlation_id = %correlation_id,
        subject_id = %request.subject_id,
        "Recording manual time entry"
    );
    let now = Utc::now().naive_utc();
    let result = state.engine().record_time_entry(
        &request.subject_id,
        request.start,
        request.end,
        request.assignment_id,
        request.notes,
        now,
    );
    engine_response(correlation_id, result)
}

/// Handler for POST /availability.
async fn availability_handler(
    State(state): State<AppState>,
    payload: Result<Json<AvailabilityRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return bad_request(rejection_error(correlation_id, rejection)),
    };

    let result = state.engine().submit_availability(
        &request.subject_id,
        request.date,
        request.status,
        request.partial_hours,
    );
    engine_response(correlation_id, result)
}

/// Handler for GET /subjects/:id/summary.
///
/// Reports the weekly window containing the `date` query parameter:
/// the rollup, the per-day breakdown, and the open session if any.
async fn summary_handler(
    State(state): State<AppState>,
    Path(subject_id): Path<String>,
    Query(query): Query<SummaryQuery>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let policy = state.policy().policy();
    let (window_start, window_end) = week_window(query.date);

    let result = state
        .engine()
        .aggregate(&subject_id, window_start, window_end, policy)
        .and_then(|summary| {
            let days = state.engine().day_summaries(
                &subject_id,
                window_start.date(),
                window_end.date() - chrono::Duration::days(1),
                policy,
            )?;
            let now = Utc::now().naive_utc();
            let current_session = state.engine().current_session(&subject_id, now, policy)?;
            Ok(SummaryResponse {
                summary,
                days,
                current_session,
            })
        });
    engine_response(correlation_id, result)
}

/// Handler for POST /reports/roster.
async fn roster_report_handler(
    State(state): State<AppState>,
    payload: Result<Json<RosterReportRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return bad_request(rejection_error(correlation_id, rejection)),
    };

    info!(
        correlation_id = %correlation_id,
        subjects = request.subject_ids.len(),
        "Building roster report"
    );
    let (window_start, window_end) = week_window(request.date);
    let result = state.engine().roster_rollup(
        &request.subject_ids,
        window_start,
        window_end,
        state.policy().policy(),
    );
    engine_response(correlation_id, result)
}

/// Handler for POST /leave/request.
async fn leave_request_handler(
    State(state): State<AppState>,
    payload: Result<Json<LeaveRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return bad_request(rejection_error(correlation_id, rejection)),
    };

    info!(
        correlation_id = %correlation_id,
        subject_id = %request.subject_id,
        "Submitting leave request"
    );
    let result = state.engine().request_leave(request.into());
    engine_response(correlation_id, result)
}

/// Handler for POST /leave/approve.
async fn leave_approve_handler(
    State(state): State<AppState>,
    payload: Result<Json<LeaveDecisionRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return bad_request(rejection_error(correlation_id, rejection)),
    };

    info!(
        correlation_id = %correlation_id,
        subject_id = %request.subject_id,
        period_id = %request.period_id,
        "Approving leave"
    );
    let result = state.engine().approve_leave(
        &request.subject_id,
        request.period_id,
        state.policy().policy(),
    );
    engine_response(correlation_id, result)
}

/// Handler for POST /leave/reject.
async fn leave_reject_handler(
    State(state): State<AppState>,
    payload: Result<Json<LeaveDecisionRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return bad_request(rejection_error(correlation_id, rejection)),
    };

    info!(
        correlation_id = %correlation_id,
        subject_id = %request.subject_id,
        period_id = %request.period_id,
        "Rejecting leave"
    );
    let result = state
        .engine()
        .reject_leave(&request.subject_id, request.period_id);
    engine_response(correlation_id, result)
}

/// Handler for POST /leave/allocate.
async fn allocation_handler(
    State(state): State<AppState>,
    payload: Result<Json<AllocationRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return bad_request(rejection_error(correlation_id, rejection)),
    };

    info!(
        correlation_id = %correlation_id,
        company_id = %request.company_id,
        year = request.year,
        "Running bulk allocation"
    );
    let policy = state.policy().policy();
    let mut defaults = AllocationDefaults::from_policy(policy);
    if let Some(days) = request.days_total {
        defaults.days_total = days;
    }
    if let Some(hours) = request.compensation_hours {
        defaults.compensation_hours = hours;
    }
    let result = state
        .engine()
        .bulk_allocate(&request.company_id, request.year, defaults, policy);
    engine_response(correlation_id, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EnginePolicy, PolicyLoader};
    use crate::engine::Engine;
    use crate::models::{EmploymentCategory, Subject, SubjectRole, TimeEntry};
    use crate::store::{LoggingPresenceSink, MemoryDirectory, MemoryStore};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    fn create_test_state() -> AppState {
        let store = Arc::new(MemoryStore::new());
        let directory = Arc::new(MemoryDirectory::new());
        directory.insert(Subject {
            id: "worker_001".to_string(),
            employment_category: EmploymentCategory::Permanent,
            role: SubjectRole::Employee,
            company_id: "acme".to_string(),
            active: true,
        });
        let engine = Engine::new(store, directory, Arc::new(LoggingPresenceSink));
        AppState::new(engine, PolicyLoader::from_policy(EnginePolicy::default()))
    }

    async fn post_json(router: Router, uri: &str, body: &str) -> (StatusCode, Vec<u8>) {
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("Content-Type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn test_clock_in_returns_200_with_open_entry() {
        let router = create_router(create_test_state());

        let (status, body) = post_json(
            router,
            "/clock-in",
            r#"{"subject_id": "worker_001", "timestamp": "2025-03-10T09:00:00"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let entry: TimeEntry = serde_json::from_slice(&body).unwrap();
        assert_eq!(entry.subject_id, "worker_001");
        assert!(entry.is_open());
    }

    #[tokio::test]
    async fn test_double_clock_in_returns_409() {
        let router = create_router(create_test_state());

        let body = r#"{"subject_id": "worker_001", "timestamp": "2025-03-10T09:00:00"}"#;
        let (first, _) = post_json(router.clone(), "/clock-in", body).await;
        assert_eq!(first, StatusCode::OK);

        let (second, bytes) = post_json(router, "/clock-in", body).await;
        assert_eq!(second, StatusCode::CONFLICT);
        let error: ApiError = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(error.code, "ALREADY_CLOCKED_IN");
    }

    #[tokio::test]
    async fn test_clock_out_without_session_returns_409() {
        let router = create_router(create_test_state());

        let (status, bytes) = post_json(
            router,
            "/clock-out",
            r#"{"subject_id": "worker_001", "timestamp": "2025-03-10T17:00:00"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        let error: ApiError = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(error.code, "NO_OPEN_SESSION");
    }

    #[tokio::test]
    async fn test_unknown_subject_returns_404() {
        let router = create_router(create_test_state());

        let (status, bytes) = post_json(
            router,
            "/clock-in",
            r#"{"subject_id": "ghost", "timestamp": "2025-03-10T09:00:00"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        let error: ApiError = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(error.code, "SUBJECT_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_malformed_json_returns_400() {
        let router = create_router(create_test_state());

        let (status, bytes) = post_json(router, "/clock-in", "{invalid json").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: ApiError = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(error.code, "MALFORMED_JSON");
    }

    #[tokio::test]
    async fn test_missing_field_returns_validation_error() {
        let router = create_router(create_test_state());

        let (status, bytes) = post_json(
            router,
            "/clock-in",
            r#"{"timestamp": "2025-03-10T09:00:00"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: ApiError = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(error.code, "VALIDATION_ERROR");
        assert!(error.message.contains("subject_id"));
    }

    #[tokio::test]
    async fn test_overlapping_shift_returns_409() {
        let router = create_router(create_test_state());

        let first = r#"{
            "subject_id": "worker_001",
            "start": "2030-03-10T09:00:00",
            "end": "2030-03-10T17:00:00",
            "role_label": "bar"
        }"#;
        let (status, _) = post_json(router.clone(), "/shifts", first).await;
        assert_eq!(status, StatusCode::OK);

        let second = r#"{
            "subject_id": "worker_001",
            "start": "2030-03-10T16:00:00",
            "end": "2030-03-10T20:00:00",
            "role_label": "floor"
        }"#;
        let (status, bytes) = post_json(router, "/shifts", second).await;
        assert_eq!(status, StatusCode::CONFLICT);
        let error: ApiError = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(error.code, "OVERLAP_CONFLICT");
    }

    #[tokio::test]
    async fn test_sync_batch_reports_per_item_outcomes() {
        let router = create_router(create_test_state());

        let body = r#"{
            "actions": [
                {"action": "start", "subject_id": "worker_001", "timestamp": "2025-03-10T09:00:00"},
                {"action": "start", "subject_id": "worker_001", "timestamp": "2025-03-10T09:05:00"},
                {"action": "end", "subject_id": "worker_001", "timestamp": "2025-03-10T17:00:00"}
            ]
        }"#;
        let (status, bytes) = post_json(router, "/sync", body).await;

        assert_eq!(status, StatusCode::OK);
        let response: SyncResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(response.results.len(), 3);
        assert!(response.results[0].committed.is_some());
        assert_eq!(
            response.results[1].error.as_ref().unwrap().code,
            "ALREADY_CLOCKED_IN"
        );
        assert!(response.results[2].committed.is_some());
    }

    #[tokio::test]
    async fn test_summary_reports_worked_hours() {
        let router = create_router(create_test_state());

        post_json(
            router.clone(),
            "/clock-in",
            r#"{"subject_id": "worker_001", "timestamp": "2025-03-10T09:00:00"}"#,
        )
        .await;
        post_json(
            router.clone(),
            "/clock-out",
            r#"{"subject_id": "worker_001", "timestamp": "2025-03-10T12:30:00"}"#,
        )
        .await;

        let response = router
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/subjects/worker_001/summary?date=2025-03-12")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let summary: SummaryResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(summary.summary.worked_hours.to_string(), "3.50");
        assert!(summary.current_session.is_none());
    }

    #[tokio::test]
    async fn test_allocation_then_approval_flow() {
        let router = create_router(create_test_state());

        let (status, bytes) = post_json(
            router.clone(),
            "/leave/allocate",
            r#"{"company_id": "acme", "year": 2025}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let report: crate::engine::BulkAllocationReport = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(report.processed.len(), 1);
        assert!(report.errors.is_empty());

        let (status, bytes) = post_json(
            router.clone(),
            "/leave/request",
            r#"{
                "subject_id": "worker_001",
                "start_date": "2025-07-01",
                "end_date": "2025-07-05",
                "leave_type": "vacation",
                "day_count": "5"
            }"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let period: crate::models::LeavePeriod = serde_json::from_slice(&bytes).unwrap();

        let decision = format!(
            r#"{{"subject_id": "worker_001", "period_id": "{}"}}"#,
            period.id
        );
        let (status, bytes) = post_json(router, "/leave/approve", &decision).await;
        assert_eq!(status, StatusCode::OK);
        let approved: crate::models::LeavePeriod = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(approved.status, crate::models::LeaveStatus::Approved);
    }
}

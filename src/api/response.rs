//! Response types for the roster engine API.
//!
//! This module defines the error response structures, the HTTP status
//! mapping for engine errors, and the composite response bodies that
//! have no single engine-side counterpart.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::engine::{CurrentSession, DaySummary, SyncOutcome, WindowSummary};
use crate::error::EngineError;
use crate::models::TimeEntry;

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let message = error.to_string();
        match error {
            EngineError::AlreadyOpenSession { .. } => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::new("ALREADY_CLOCKED_IN", message),
            },
            EngineError::NoOpenSession { .. } => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::new("NO_OPEN_SESSION", message),
            },
            EngineError::InvalidInterval { .. } => ApiErrorResponse {
                status: StatusCode::BAD_REQUEST,
                error: ApiError::new("INVALID_INTERVAL", message),
            },
            EngineError::OverlapConflict { .. } => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::with_details(
                    "OVERLAP_CONFLICT",
                    message,
                    "The candidate interval intersects an existing interval of the same kind",
                ),
            },
            EngineError::InsufficientBalance { .. } => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::with_details(
                    "INSUFFICIENT_BALANCE",
                    message,
                    "Approving this period would drive the remaining balance negative",
                ),
            },
            EngineError::SubjectNotFound { .. } => ApiErrorResponse {
                status: StatusCode::NOT_FOUND,
                error: ApiError::new("SUBJECT_NOT_FOUND", message),
            },
            EngineError::WriteConflict { .. } => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::with_details(
                    "WRITE_CONFLICT",
                    message,
                    "A concurrent write won the race; retry the request",
                ),
            },
            EngineError::StoreUnavailable { .. } => ApiErrorResponse {
                status: StatusCode::SERVICE_UNAVAILABLE,
                error: ApiError::new("STORE_UNAVAILABLE", message),
            },
            EngineError::PolicyNotFound { .. } | EngineError::PolicyParseError { .. } => {
                ApiErrorResponse {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    error: ApiError::new("POLICY_ERROR", message),
                }
            }
        }
    }
}

/// Response body for `GET /subjects/:id/summary`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResponse {
    /// The weekly rollup for the window containing the requested date.
    pub summary: WindowSummary,
    /// The per-day breakdown of the same window.
    pub days: Vec<DaySummary>,
    /// The open clock session, if one exists right now.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_session: Option<CurrentSession>,
}

/// One item in the response to `POST /sync`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncItemResponse {
    /// Position of the item in the submitted batch.
    pub index: usize,
    /// The subject the item belonged to.
    pub subject_id: String,
    /// The committed entry, when the item was accepted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub committed: Option<TimeEntry>,
    /// The per-item rejection, when it was not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl From<SyncOutcome> for SyncItemResponse {
    fn from(outcome: SyncOutcome) -> Self {
        match outcome.result {
            Ok(entry) => Self {
                index: outcome.index,
                subject_id: outcome.subject_id,
                committed: Some(entry),
                error: None,
            },
            Err(err) => {
                let response: ApiErrorResponse = err.into();
                Self {
                    index: outcome.index,
                    subject_id: outcome.subject_id,
                    committed: None,
                    error: Some(response.error),
                }
            }
        }
    }
}

/// Response body for `POST /sync`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncResponse {
    /// Per-item outcomes, in submission order.
    pub results: Vec<SyncItemResponse>,
}

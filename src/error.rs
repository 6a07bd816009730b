//! Error types for the workforce engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur during engine operations.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::IntervalKind;

/// The main error type for the workforce engine.
///
/// Every rejected mutation carries a specific variant so the calling layer
/// can render an actionable message ("already clocked in" rather than
/// "server error"). All variants are recoverable from the engine's point
/// of view; none is ever silently swallowed.
///
/// # Example
///
/// ```
/// use roster_engine::error::EngineError;
///
/// let error = EngineError::NoOpenSession {
///     subject_id: "worker_001".to_string(),
/// };
/// assert_eq!(error.to_string(), "No open clock session for subject 'worker_001'");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// A clock-in was attempted while a session is already open.
    #[error("Subject '{subject_id}' already has an open clock session")]
    AlreadyOpenSession {
        /// The subject that already has an open session.
        subject_id: String,
    },

    /// A clock-out was attempted with no open session.
    #[error("No open clock session for subject '{subject_id}'")]
    NoOpenSession {
        /// The subject with no open session.
        subject_id: String,
    },

    /// An interval was malformed (end before start, zero duration, or a
    /// close timestamp earlier than the session start).
    #[error("Invalid interval: {message}")]
    InvalidInterval {
        /// A description of what made the interval invalid.
        message: String,
    },

    /// Committing the candidate interval would overlap an existing interval
    /// of the same kind for the same subject.
    #[error("Overlap conflict for subject '{subject_id}': {kind} intervals at {candidate_start} would intersect an existing interval")]
    OverlapConflict {
        /// The subject whose calendar would be violated.
        subject_id: String,
        /// The kind of interval that conflicted.
        kind: IntervalKind,
        /// The start of the rejected candidate.
        candidate_start: NaiveDateTime,
    },

    /// Approving a leave period would drive the remaining balance negative.
    #[error("Insufficient leave balance for subject '{subject_id}' in {year}: requested {requested} days, {remaining} remaining")]
    InsufficientBalance {
        /// The subject whose balance was insufficient.
        subject_id: String,
        /// The entitlement year.
        year: i32,
        /// The days the leave period would consume.
        requested: Decimal,
        /// The days remaining before the attempt.
        remaining: Decimal,
    },

    /// The subject is unknown to the identity directory.
    #[error("Subject not found: {subject_id}")]
    SubjectNotFound {
        /// The subject id that was not found.
        subject_id: String,
    },

    /// A read-check-write sequence lost a race under per-subject
    /// serialization. Retried once internally before being surfaced.
    #[error("Write conflict for subject '{subject_id}': {message}")]
    WriteConflict {
        /// The subject whose record version moved.
        subject_id: String,
        /// A description of the conflicting write.
        message: String,
    },

    /// The interval store could not be reached. Never retried by the
    /// engine; backoff policy belongs to the caller.
    #[error("Interval store unavailable: {message}")]
    StoreUnavailable {
        /// A description of the store failure.
        message: String,
    },

    /// Policy configuration file was not found at the specified path.
    #[error("Policy file not found: {path}")]
    PolicyNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Policy configuration file could not be parsed.
    #[error("Failed to parse policy file '{path}': {message}")]
    PolicyParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Returns true if the error is a lost-race conflict that the engine
    /// may retry once with fresh reads.
    pub fn is_write_conflict(&self) -> bool {
        matches!(self, EngineError::WriteConflict { .. })
    }
}

//! Clock session state machine.
//!
//! Per subject the machine cycles CLOSED → OPEN → CLOSED indefinitely,
//! where OPEN means exactly one time entry without an end instant exists.
//! The store's version check closes the race window between observing
//! CLOSED and committing the open entry: of two concurrent clock-ins,
//! exactly one wins and the other fails with `AlreadyOpenSession`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{IntervalKind, PresenceState, TimeEntry};

use super::{Engine, with_conflict_retry};

/// Optional work context attached to a clock-in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClockContext {
    /// Linked work assignment.
    pub assignment_id: Option<Uuid>,
    /// Free-text notes.
    pub notes: Option<String>,
}

/// The action kind of one item in an offline-sync batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncActionKind {
    /// Open a session.
    Start,
    /// Close the open session.
    End,
}

/// One item of an offline-sync batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncAction {
    /// Whether to open or close a session.
    pub action: SyncActionKind,
    /// The subject the action belongs to.
    pub subject_id: String,
    /// The recorded device timestamp.
    pub timestamp: NaiveDateTime,
    /// Work context for start actions.
    #[serde(default)]
    pub context: ClockContext,
}

/// Per-item result of processing an offline-sync batch.
///
/// Batches report success or failure item by item; a rejected item never
/// aborts the rest of the batch.
#[derive(Debug)]
pub struct SyncOutcome {
    /// Position of the item in the submitted batch.
    pub index: usize,
    /// The subject the item belonged to.
    pub subject_id: String,
    /// The committed entry, or the per-item rejection.
    pub result: EngineResult<TimeEntry>,
}

impl Engine {
    /// Opens a clock session for a subject.
    ///
    /// Fails with `AlreadyOpenSession` if the subject's state is OPEN,
    /// with `OverlapConflict` when the start would cut into an entry
    /// already on record (offline replays carry past timestamps), and
    /// with `SubjectNotFound` for unknown subjects. On success the
    /// subject's live status transitions to working; presence delivery is
    /// best-effort and never fails the clock-in.
    pub fn clock_in(
        &self,
        subject_id: &str,
        context: ClockContext,
        timestamp: NaiveDateTime,
    ) -> EngineResult<TimeEntry> {
        self.directory().subject(subject_id)?;

        let entry = with_conflict_retry(|| {
            let version = self.store().version(subject_id, IntervalKind::TimeEntry)?;
            if self.store().open_time_entry(subject_id)?.is_some() {
                return Err(EngineError::AlreadyOpenSession {
                    subject_id: subject_id.to_string(),
                });
            }
            // The new entry has no end yet and is checked as an unbounded
            // candidate, so a backdated start cannot cut into an entry
            // already on record.
            self.check_no_overlap(
                subject_id,
                IntervalKind::TimeEntry,
                timestamp,
                None,
                None,
                timestamp,
            )?;

            let entry = TimeEntry {
                id: Uuid::new_v4(),
                subject_id: subject_id.to_string(),
                start: timestamp,
                end: None,
                assignment_id: context.assignment_id,
                approved: false,
                notes: context.notes.clone(),
            };
            self.store().insert_time_entry(version, entry.clone())?;
            Ok(entry)
        })?;

        info!(subject_id, start = %entry.start, "clock session opened");
        self.emit_presence(subject_id, PresenceState::Working);
        Ok(entry)
    }

    /// Closes the open clock session of a subject.
    ///
    /// Fails with `NoOpenSession` if no entry is open, and with
    /// `InvalidInterval` if the close timestamp precedes the session
    /// start; a negative-duration entry is never silently produced.
    pub fn clock_out(
        &self,
        subject_id: &str,
        timestamp: NaiveDateTime,
    ) -> EngineResult<TimeEntry> {
        self.directory().subject(subject_id)?;

        let entry = with_conflict_retry(|| {
            let version = self.store().version(subject_id, IntervalKind::TimeEntry)?;
            let open = self.store().open_time_entry(subject_id)?.ok_or_else(|| {
                EngineError::NoOpenSession {
                    subject_id: subject_id.to_string(),
                }
            })?;

            if timestamp < open.start {
                return Err(EngineError::InvalidInterval {
                    message: format!(
                        "clock-out at {timestamp} precedes session start {}",
                        open.start
                    ),
                });
            }

            self.store()
                .close_time_entry(subject_id, version, open.id, timestamp)
        })?;

        info!(subject_id, end = %timestamp, "clock session closed");
        self.emit_presence(subject_id, PresenceState::Off);
        Ok(entry)
    }

    /// Processes an ordered batch of offline-recorded clock actions.
    ///
    /// Duplicates and out-of-order items are rejected per item: a start
    /// while OPEN and an end while CLOSED each fail with their session
    /// error, and processing continues with the next item.
    pub fn process_sync_batch(&self, actions: Vec<SyncAction>) -> Vec<SyncOutcome> {
        actions
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                let result = match item.action {
                    SyncActionKind::Start => {
                        self.clock_in(&item.subject_id, item.context.clone(), item.timestamp)
                    }
                    SyncActionKind::End => self.clock_out(&item.subject_id, item.timestamp),
                };
                if let Err(err) = &result {
                    warn!(index, subject_id = %item.subject_id, error = %err, "sync item rejected");
                }
                SyncOutcome {
                    index,
                    subject_id: item.subject_id,
                    result,
                }
            })
            .collect()
    }

    fn emit_presence(&self, subject_id: &str, state: PresenceState) {
        if let Err(err) = self.presence().presence_changed(subject_id, state) {
            warn!(subject_id, error = %err, "presence delivery failed");
        }
    }
}

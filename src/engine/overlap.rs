//! Overlap detection for same-kind intervals of a single subject.
//!
//! The detector decides whether committing a candidate interval would
//! make two intervals of the same kind intersect for one subject. It is
//! a pure check over a store query; callers must re-run it under the
//! store's per-subject version check, because the detector alone provides
//! no atomicity.

use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{IntervalKind, overlaps};
use crate::store::IntervalStore;

use super::Engine;

/// Returns true iff committing the candidate would violate same-kind
/// exclusivity for the subject.
///
/// The test is half-open: back-to-back intervals where one ends exactly
/// when the next starts never conflict. A candidate without an end is
/// unbounded. A stored interval without an end (an open clock session)
/// has `now` as its effective end, so it blocks the present but not a
/// booking made for next week.
///
/// `exclude_id` skips one stored interval, for checking an in-place
/// update of an existing record against its siblings.
///
/// Zero- and negative-duration candidates are rejected upstream with
/// `InvalidInterval`; the detector assumes a well-formed candidate.
pub fn has_conflict(
    store: &dyn IntervalStore,
    subject_id: &str,
    kind: IntervalKind,
    candidate_start: NaiveDateTime,
    candidate_end: Option<NaiveDateTime>,
    exclude_id: Option<Uuid>,
    now: NaiveDateTime,
) -> EngineResult<bool> {
    let spans = store.spans_near(subject_id, kind, candidate_start, candidate_end)?;

    for span in spans {
        if exclude_id == Some(span.id) {
            continue;
        }
        // Open stored intervals run until now for overlap purposes.
        let effective_end = span.end.or_else(|| Some(now.max(span.start)));
        if overlaps(candidate_start, candidate_end, Some(span.start), effective_end) {
            return Ok(true);
        }
    }
    Ok(false)
}

impl Engine {
    /// Validates a candidate window and fails with `OverlapConflict` if it
    /// would intersect an existing interval of the same kind.
    pub(crate) fn check_no_overlap(
        &self,
        subject_id: &str,
        kind: IntervalKind,
        candidate_start: NaiveDateTime,
        candidate_end: Option<NaiveDateTime>,
        exclude_id: Option<Uuid>,
        now: NaiveDateTime,
    ) -> EngineResult<()> {
        if let Some(end) = candidate_end {
            if end <= candidate_start {
                return Err(EngineError::InvalidInterval {
                    message: format!("end {end} does not follow start {candidate_start}"),
                });
            }
        }
        if has_conflict(
            self.store(),
            subject_id,
            kind,
            candidate_start,
            candidate_end,
            exclude_id,
            now,
        )? {
            return Err(EngineError::OverlapConflict {
                subject_id: subject_id.to_string(),
                kind,
                candidate_start,
            });
        }
        Ok(())
    }
}

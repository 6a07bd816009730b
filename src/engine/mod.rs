//! Core engine components: overlap detection, the clock session state
//! machine, worked-hour aggregation, and leave entitlement allocation.
//!
//! The [`Engine`] ties the components to their collaborators (interval
//! store, identity directory, presence sink). Each mutating operation is
//! a read-check-write sequence serialized per subject by the store's
//! optimistic version check; a lost race surfaces as `WriteConflict` and
//! is retried once with fresh reads before being returned to the caller.

mod aggregation;
mod allocation;
mod booking;
mod overlap;
mod session;

use std::sync::Arc;

use crate::error::EngineResult;
use crate::store::{IntervalStore, PresenceSink, SubjectDirectory};

pub use aggregation::{
    AttendanceStatus, CurrentSession, DaySummary, WindowSummary, week_window,
};
pub use allocation::{
    AllocationDefaults, AllocationError, AllocationOutcome, BulkAllocationReport,
    prorated_entitlement,
};
pub use booking::{LeaveDraft, ShiftDraft};
pub use overlap::has_conflict;
pub use session::{ClockContext, SyncAction, SyncActionKind, SyncOutcome};

/// The workforce engine.
///
/// Holds the external collaborators and exposes every operation defined
/// on the temporal core. All methods execute to completion without
/// internal suspension beyond waiting on the store; there is no
/// background scheduler.
pub struct Engine {
    store: Arc<dyn IntervalStore>,
    directory: Arc<dyn SubjectDirectory>,
    presence: Arc<dyn PresenceSink>,
}

impl Engine {
    /// Creates an engine around its collaborators.
    pub fn new(
        store: Arc<dyn IntervalStore>,
        directory: Arc<dyn SubjectDirectory>,
        presence: Arc<dyn PresenceSink>,
    ) -> Self {
        Self {
            store,
            directory,
            presence,
        }
    }

    /// The interval store the engine reads and writes through.
    pub fn store(&self) -> &dyn IntervalStore {
        self.store.as_ref()
    }

    /// The identity directory supplying subject records.
    pub fn directory(&self) -> &dyn SubjectDirectory {
        self.directory.as_ref()
    }

    pub(crate) fn presence(&self) -> &dyn PresenceSink {
        self.presence.as_ref()
    }
}

/// Runs a read-check-write sequence, retrying exactly once on a lost
/// race. Any other error, including a second conflict, is surfaced.
pub(crate) fn with_conflict_retry<T>(
    mut op: impl FnMut() -> EngineResult<T>,
) -> EngineResult<T> {
    match op() {
        Err(err) if err.is_write_conflict() => op(),
        other => other,
    }
}

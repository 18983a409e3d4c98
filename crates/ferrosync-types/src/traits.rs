//! Core traits for ferrosync operations
//!
//! The sync core prints nothing. Front ends watch a run through a
//! [`SyncObserver`].

use crate::{SyncPhase, SyncStats, TaskOutcome};

/// Receives progress notifications from a sync run
///
/// Callbacks are invoked from the orchestrator's control path, one at a
/// time, so implementations need no internal ordering guarantees.
pub trait SyncObserver: Send + Sync {
    /// A new phase was entered
    fn on_phase(&self, _phase: SyncPhase) {}

    /// `total` tasks were submitted for `phase`
    fn on_planned(&self, _phase: SyncPhase, _total: u64) {}

    /// A task finished
    fn on_outcome(&self, _outcome: &TaskOutcome) {}

    /// The run finished with these statistics
    fn on_complete(&self, _stats: &SyncStats) {}
}

/// Observer that ignores every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SyncObserver for NoopObserver {}

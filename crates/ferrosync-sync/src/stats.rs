//! Outcome aggregation
//!
//! Workers never touch shared counters. Each returns an immutable
//! [`TaskOutcome`] and the orchestrator folds them, one at a time, into a
//! [`StatsAggregator`] it owns.

use ferrosync_types::{Error, TaskKind, TaskOutcome};
use std::time::Duration;

pub use ferrosync_types::SyncStats;

/// Single consumer of task outcomes and warnings
#[derive(Debug, Default)]
pub struct StatsAggregator {
    stats: SyncStats,
}

impl StatsAggregator {
    /// Create an empty aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one task outcome
    pub fn record(&mut self, outcome: &TaskOutcome) {
        if !outcome.success {
            self.stats.errors.push(outcome.message.clone());
            return;
        }

        match outcome.kind {
            TaskKind::Copy => {
                self.stats.files_copied += 1;
                self.stats.bytes_copied += outcome.bytes;
            }
            TaskKind::Delete => self.stats.files_deleted += 1,
        }
    }

    /// Record a traversal warning
    pub fn record_warning(&mut self, warning: &Error) {
        self.stats.errors.push(warning.to_string());
    }

    /// Record files that needed no copy
    pub fn record_skipped(&mut self, count: u64) {
        self.stats.files_skipped += count;
    }

    /// Record skipped files whose content was confirmed identical
    pub fn record_verified_identical(&mut self, count: u64) {
        self.stats.files_verified_identical += count;
        self.stats.files_skipped += count;
    }

    /// Record pairs whose verification was inconclusive
    pub fn record_inconclusive(&mut self, count: u64) {
        self.stats.verify_inconclusive += count;
    }

    /// Statistics accumulated so far
    pub fn current(&self) -> &SyncStats {
        &self.stats
    }

    /// Finalize into the run's statistics
    pub fn finish(mut self, elapsed: Duration) -> SyncStats {
        self.stats.elapsed = elapsed;
        self.stats
    }
}

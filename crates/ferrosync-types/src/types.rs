//! Core data types for ferrosync
//!
//! This module provides the values that flow between the phases of a sync
//! run: scanned entries, planned tasks, task outcomes, phases and the final
//! statistics.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// File size in bytes
pub type FileSize = u64;

/// Transfer rate in bytes per second
pub type TransferRate = f64;

/// A regular file found while scanning a tree
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FileEntry {
    /// Path relative to the scanned root
    pub relative_path: PathBuf,
    /// Absolute (root-joined) path
    pub absolute_path: PathBuf,
    /// Size in bytes
    pub size: FileSize,
    /// Last modification time
    pub modified: SystemTime,
}

impl FileEntry {
    /// Create a new file entry
    pub fn new(
        relative_path: impl Into<PathBuf>,
        absolute_path: impl Into<PathBuf>,
        size: FileSize,
        modified: SystemTime,
    ) -> Self {
        Self {
            relative_path: relative_path.into(),
            absolute_path: absolute_path.into(),
            size,
            modified,
        }
    }
}

/// A file to copy from the source tree into the destination tree
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CopyTask {
    /// File to read
    pub source: PathBuf,
    /// File to write, mirroring `source` under the destination root
    pub destination: PathBuf,
}

impl CopyTask {
    /// Create a new copy task
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }

    /// Build the task for `relative` under both roots
    pub fn mirrored(source_root: &Path, destination_root: &Path, relative: &Path) -> Self {
        Self::new(source_root.join(relative), destination_root.join(relative))
    }
}

/// An orphaned destination file to remove
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeleteTask {
    /// File to remove
    pub destination: PathBuf,
}

impl DeleteTask {
    /// Create a new delete task
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
        }
    }
}

/// Kind of task an outcome belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TaskKind {
    /// A transfer
    Copy,
    /// A deletion
    Delete,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copy => write!(f, "copy"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Result of exactly one executor invocation
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TaskOutcome {
    /// Which executor produced this outcome
    pub kind: TaskKind,
    /// Destination path of the task
    pub path: PathBuf,
    /// Whether the task succeeded
    pub success: bool,
    /// Human readable description, the failure reason when unsuccessful
    pub message: String,
    /// Bytes written by a successful copy
    pub bytes: u64,
}

impl TaskOutcome {
    /// Create a successful outcome
    pub fn succeeded(kind: TaskKind, path: impl Into<PathBuf>, bytes: u64) -> Self {
        let path = path.into();
        let message = match kind {
            TaskKind::Copy => format!("Copied {}", path.display()),
            TaskKind::Delete => format!("Deleted {}", path.display()),
        };
        Self {
            kind,
            path,
            success: true,
            message,
            bytes,
        }
    }

    /// Create a failed outcome
    pub fn failed(kind: TaskKind, path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            success: false,
            message: message.into(),
            bytes: 0,
        }
    }
}

/// Phases of a sync run, in the order they are entered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SyncPhase {
    /// Nothing has happened yet
    Idle,
    /// Walking the source and destination trees
    Scanning,
    /// Partitioning entries into new, stale, candidate and current
    Classifying,
    /// Hashing candidate pairs
    Verifying,
    /// Running transfers
    Copying,
    /// Detecting and removing orphans
    Deleting,
    /// Folding outcomes into the final statistics
    Reporting,
    /// The run completed
    Done,
    /// The run was aborted by a fatal error
    Aborted,
}

impl SyncPhase {
    /// Check if no further phase follows
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Scanning => "scanning",
            Self::Classifying => "classifying",
            Self::Verifying => "verifying",
            Self::Copying => "copying",
            Self::Deleting => "deleting",
            Self::Reporting => "reporting",
            Self::Done => "done",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Statistics of a completed sync run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SyncStats {
    /// Number of successful copies
    pub files_copied: u64,
    /// Number of successful deletions
    pub files_deleted: u64,
    /// Files present on both sides that needed no copy
    pub files_skipped: u64,
    /// Skipped files whose content was confirmed identical by hashing
    pub files_verified_identical: u64,
    /// Pairs that could not be hashed and were copied anyway
    pub verify_inconclusive: u64,
    /// Total bytes written by successful copies
    pub bytes_copied: u64,
    /// Failed tasks and traversal warnings, in completion order
    pub errors: Vec<String>,
    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl SyncStats {
    /// Create a new empty statistics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded errors
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Check if any error was recorded
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Calculate the overall transfer rate
    pub fn transfer_rate(&self) -> TransferRate {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.bytes_copied as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

impl fmt::Display for SyncStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} copied, {} deleted, {} skipped, {} errors in {:.2}s",
            self.files_copied,
            self.files_deleted,
            self.files_skipped,
            self.errors.len(),
            self.elapsed.as_secs_f64()
        )
    }
}

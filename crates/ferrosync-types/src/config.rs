//! Configuration types for ferrosync
//!
//! This module provides the finished, validated configuration a sync run
//! consumes. How it is obtained (files, environment, command line) is the
//! business of `ferrosync-config` and the CLI.

use std::path::PathBuf;

/// Thread count configuration with validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "usize", into = "usize"))]
pub struct ThreadCount(usize);

impl ThreadCount {
    /// Minimum thread count
    pub const MIN: usize = 1;
    /// Maximum thread count
    pub const MAX: usize = 256;
    /// Default I/O worker count
    pub const DEFAULT: usize = 4;

    /// Create a new thread count with validation
    pub fn new(count: usize) -> Result<Self, String> {
        if count < Self::MIN {
            Err(format!("Thread count {} is below minimum {}", count, Self::MIN))
        } else if count > Self::MAX {
            Err(format!("Thread count {} exceeds maximum {}", count, Self::MAX))
        } else {
            Ok(Self(count))
        }
    }

    /// Create a thread count, clamping out-of-range values into bounds
    pub fn clamped(count: usize) -> Self {
        Self(count.clamp(Self::MIN, Self::MAX))
    }

    /// Get the thread count value
    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for ThreadCount {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl TryFrom<usize> for ThreadCount {
    type Error = String;

    fn try_from(count: usize) -> Result<Self, Self::Error> {
        Self::new(count)
    }
}

impl From<ThreadCount> for usize {
    fn from(count: ThreadCount) -> Self {
        count.0
    }
}

impl std::fmt::Display for ThreadCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How files present on both sides are judged stale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompareStrategy {
    /// Metadata only: source mtime strictly newer, optionally a size mismatch
    Fast {
        /// Also treat a size mismatch as stale
        compare_size: bool,
    },
    /// Every pair present on both sides is content-hashed
    Verified,
}

impl Default for CompareStrategy {
    fn default() -> Self {
        Self::Fast {
            compare_size: false,
        }
    }
}

/// Configuration for one sync run
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SyncConfig {
    /// Source root, read only
    pub source: PathBuf,
    /// Destination root, mutated to mirror the source
    pub destination: PathBuf,
    /// Size of the I/O pool used for transfers and deletions
    pub workers: ThreadCount,
    /// Confirm candidate pairs by content hash
    pub verify: bool,
    /// In fast mode, also treat a size mismatch as stale
    pub compare_size: bool,
    /// Stage copies in a temporary file and rename into place
    pub atomic_copy: bool,
    /// Descend into symlinked directories and copy symlink targets
    pub follow_symlinks: bool,
    /// Size of the hashing pool; `None` means one thread per processor
    pub hash_workers: Option<ThreadCount>,
}

impl SyncConfig {
    /// Create a new configuration with default tuning
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            workers: ThreadCount::default(),
            verify: false,
            compare_size: false,
            atomic_copy: true,
            follow_symlinks: false,
            hash_workers: None,
        }
    }

    /// Set the I/O worker count
    pub fn with_workers(mut self, workers: ThreadCount) -> Self {
        self.workers = workers;
        self
    }

    /// Enable or disable content verification
    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Enable or disable the fast-mode size check
    pub fn with_compare_size(mut self, compare_size: bool) -> Self {
        self.compare_size = compare_size;
        self
    }

    /// Enable or disable staged copies
    pub fn with_atomic_copy(mut self, atomic_copy: bool) -> Self {
        self.atomic_copy = atomic_copy;
        self
    }

    /// Enable or disable following symlinks
    pub fn with_follow_symlinks(mut self, follow_symlinks: bool) -> Self {
        self.follow_symlinks = follow_symlinks;
        self
    }

    /// Set the hashing pool size
    pub fn with_hash_workers(mut self, hash_workers: Option<ThreadCount>) -> Self {
        self.hash_workers = hash_workers;
        self
    }

    /// Classification strategy selected by this configuration
    pub fn strategy(&self) -> CompareStrategy {
        if self.verify {
            CompareStrategy::Verified
        } else {
            CompareStrategy::Fast {
                compare_size: self.compare_size,
            }
        }
    }
}

//! Error types and handling for ferrosync
//!
//! This module provides the error taxonomy shared by every ferrosync crate.
//! Only [`Error::Config`] aborts a run; every other variant is captured into
//! the run's statistics while sibling work continues.

use std::path::{Path, PathBuf};

/// Error severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Low severity - the run continues and nothing is lost
    Low,
    /// Medium severity - a single task failed, siblings continue
    Medium,
    /// High severity - a path could not be accessed at all
    High,
    /// Critical severity - the run must abort
    Critical,
}

/// Main error type for ferrosync operations
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        /// Error message from the I/O operation
        message: String,
    },

    /// File not found
    #[error("File not found: {path}")]
    FileNotFound {
        /// Path to the file that was not found
        path: PathBuf,
    },

    /// Permission denied
    #[error("Permission denied: {path}")]
    PermissionDenied {
        /// Path to the file with permission issues
        path: PathBuf,
    },

    /// Configuration error, including a missing or unreadable source root
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration issue
        message: String,
    },

    /// A directory could not be traversed; the branch was skipped
    #[error("Traversal warning at {path}: {message}")]
    Traversal {
        /// Directory or entry that could not be read
        path: PathBuf,
        /// Underlying failure
        message: String,
    },

    /// A single copy or delete task failed
    #[error("Task failed for {path}: {message}")]
    Task {
        /// Destination path the task targeted
        path: PathBuf,
        /// Underlying failure
        message: String,
    },

    /// Hashing failed on one or both sides of a comparison
    #[error("Verification inconclusive for {path}: {message}")]
    VerificationInconclusive {
        /// Path that could not be hashed
        path: PathBuf,
        /// Underlying failure
        message: String,
    },

    /// Synchronization error
    #[error("Synchronization error: {message}")]
    Sync {
        /// Error message describing the synchronization issue
        message: String,
    },

    /// Generic error with custom message
    #[error("{message}")]
    Other {
        /// Custom error message
        message: String,
    },
}

/// Error kind for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// I/O related errors
    Io,
    /// Configuration errors
    Config,
    /// Traversal warnings
    Traversal,
    /// Per-task failures
    Task,
    /// Inconclusive content verification
    Verification,
    /// Synchronization errors
    Sync,
    /// Other errors
    Other,
}

impl Error {
    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } => ErrorKind::Io,
            Self::FileNotFound { .. } | Self::PermissionDenied { .. } => ErrorKind::Io,
            Self::Config { .. } => ErrorKind::Config,
            Self::Traversal { .. } => ErrorKind::Traversal,
            Self::Task { .. } => ErrorKind::Task,
            Self::VerificationInconclusive { .. } => ErrorKind::Verification,
            Self::Sync { .. } => ErrorKind::Sync,
            Self::Other { .. } => ErrorKind::Other,
        }
    }

    /// Get the error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Io { .. } => ErrorSeverity::Medium,
            Self::FileNotFound { .. } | Self::PermissionDenied { .. } => ErrorSeverity::High,
            Self::Config { .. } => ErrorSeverity::Critical,
            Self::Traversal { .. } => ErrorSeverity::Low,
            Self::Task { .. } => ErrorSeverity::Medium,
            Self::VerificationInconclusive { .. } => ErrorSeverity::Low,
            Self::Sync { .. } => ErrorSeverity::Medium,
            Self::Other { .. } => ErrorSeverity::Medium,
        }
    }

    /// Check if this error aborts the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new traversal warning
    pub fn traversal<P: Into<PathBuf>, S: Into<String>>(path: P, message: S) -> Self {
        Self::Traversal {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new task error
    pub fn task<P: Into<PathBuf>, S: Into<String>>(path: P, message: S) -> Self {
        Self::Task {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new inconclusive verification error
    pub fn verification_inconclusive<P: Into<PathBuf>, S: Into<String>>(
        path: P,
        message: S,
    ) -> Self {
        Self::VerificationInconclusive {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new sync error
    pub fn sync<S: Into<String>>(message: S) -> Self {
        Self::Sync {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Convert an I/O error raised while touching `path`, keeping the path
    pub fn from_io_at(error: &std::io::Error, path: &Path) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::FileNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => Self::Io {
                message: format!("{}: {}", path.display(), error),
            },
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: error.to_string(),
        }
    }
}

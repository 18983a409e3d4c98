//! Core data model and error handling for ferrosync
//!
//! This crate provides the foundational types shared by every ferrosync
//! crate. It includes:
//!
//! - **Error handling**: A small error taxonomy with severity levels
//! - **Core types**: Scanned entries, planned tasks, outcomes and statistics
//! - **Traits**: The observer hook front ends use to follow a run
//! - **Configuration**: Validated run configuration
//!
//! # Features
//!
//! - `serde`: Enable serialization support
//!
//! # Examples
//!
//! ```rust
//! use ferrosync_types::{Result, SyncConfig, SyncStats, ThreadCount};
//!
//! fn example_operation() -> Result<SyncStats> {
//!     let config = SyncConfig::new("/data/src", "/data/mirror")
//!         .with_workers(ThreadCount::new(8).unwrap());
//!     assert_eq!(config.workers.get(), 8);
//!
//!     let mut stats = SyncStats::new();
//!     stats.files_copied = 10;
//!     Ok(stats)
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{CompareStrategy, SyncConfig, ThreadCount};
pub use error::{Error, ErrorKind, ErrorSeverity};
pub use result::Result;
pub use traits::*;
pub use types::*;

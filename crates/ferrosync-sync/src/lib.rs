//! One-way directory mirroring for ferrosync
//!
//! This crate makes a destination tree mirror a source tree:
//!
//! - **Scanning**: Walk both trees, recreating source directories on the way
//! - **Classification**: Decide copies by modification time, or hand pairs to
//!   content verification
//! - **Verification**: BLAKE3 hashing on a dedicated CPU pool
//! - **Transfer**: Metadata-preserving, optionally atomic copies on a bounded
//!   I/O pool
//! - **Pruning**: Removal of destination files with no source counterpart
//! - **Statistics**: One [`SyncStats`] per run
//!
//! # Examples
//!
//! ```rust,no_run
//! use ferrosync_sync::{SyncConfig, SyncEngine};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = SyncEngine::new(SyncConfig::new("source_dir", "dest_dir").with_verify(true));
//! let stats = engine.run().await?;
//! println!("{}", stats);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod classify;
pub mod engine;
pub mod pool;
pub mod scanner;
pub mod stats;
pub mod transfer;
pub mod verify;

pub use classify::{Classifier, CopyClassification, CopyPlan, DeleteClassification, DeletePlan};
pub use engine::SyncEngine;
pub use pool::{CpuPool, IoPool, TaskExecutor};
pub use scanner::{FileScanner, ScanItem, ScanSnapshot};
pub use stats::StatsAggregator;
pub use transfer::{DeletionExecutor, TransferExecutor, STAGING_SUFFIX};
pub use verify::{digest_file, Digest, HashVerifier, VerifyReport};

// Re-export the shared data model
pub use ferrosync_types::{
    CompareStrategy, Error, ErrorKind, NoopObserver, Result, SyncConfig, SyncObserver, SyncPhase,
    SyncStats, TaskKind, TaskOutcome, ThreadCount,
};

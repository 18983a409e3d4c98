//! Configuration management for ferrosync
//!
//! This crate turns configuration files, environment variables and
//! defaults into the [`SyncConfig`] a sync run consumes.
//!
//! # Features
//!
//! - **Multiple formats**: YAML, TOML and JSON configuration files
//! - **Validation**: Worker counts and log levels are checked on load
//! - **Environment overrides**: `FERROSYNC__SYNC__WORKERS=8` and friends
//! - **Defaults**: Sensible default values for all configuration options
//!
//! # Examples
//!
//! ```rust
//! use ferrosync_config::ConfigBuilder;
//!
//! let config = ConfigBuilder::new()
//!     .add_defaults()
//!     .add_source_file("ferrosync.yaml")
//!     .add_env_prefix("FERROSYNC")
//!     .build()
//!     .expect("Failed to load configuration");
//!
//! println!("Workers: {}", config.sync.workers.get());
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use ferrosync_types::{SyncConfig, ThreadCount};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod builder;
pub mod error;
pub mod loader;

pub use builder::ConfigBuilder;
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

/// Log levels accepted by `logging.level`
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main configuration structure for ferrosync
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Synchronization settings
    #[serde(default)]
    pub sync: SyncSettings,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Convert into the configuration of a single run
    ///
    /// Fails if either root has not been supplied by any source.
    pub fn into_sync_config(self) -> ConfigResult<SyncConfig> {
        let sync = self.sync;
        let source = sync
            .source
            .ok_or_else(|| ConfigError::missing_required("sync.source"))?;
        let destination = sync
            .destination
            .ok_or_else(|| ConfigError::missing_required("sync.destination"))?;

        Ok(SyncConfig::new(source, destination)
            .with_workers(sync.workers)
            .with_verify(sync.verify)
            .with_compare_size(sync.compare_size)
            .with_atomic_copy(sync.atomic_copy)
            .with_follow_symlinks(sync.follow_symlinks)
            .with_hash_workers(sync.hash_workers))
    }
}

/// Synchronization settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Source root
    #[serde(default)]
    pub source: Option<PathBuf>,
    /// Destination root
    #[serde(default)]
    pub destination: Option<PathBuf>,
    /// Number of transfer and deletion workers
    #[serde(default)]
    pub workers: ThreadCount,
    /// Confirm changes by content hash
    #[serde(default)]
    pub verify: bool,
    /// Treat a size mismatch as stale in fast mode
    #[serde(default)]
    pub compare_size: bool,
    /// Stage copies and rename them into place
    #[serde(default = "default_atomic_copy")]
    pub atomic_copy: bool,
    /// Follow symbolic links while scanning
    #[serde(default)]
    pub follow_symlinks: bool,
    /// Number of hashing threads (defaults to the processor count)
    #[serde(default)]
    pub hash_workers: Option<ThreadCount>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            source: None,
            destination: None,
            workers: ThreadCount::default(),
            verify: false,
            compare_size: false,
            atomic_copy: default_atomic_copy(),
            follow_symlinks: false,
            hash_workers: None,
        }
    }
}

fn default_atomic_copy() -> bool {
    true
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

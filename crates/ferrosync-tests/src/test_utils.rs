//! Shared fixtures for ferrosync tests and benchmarks
//!
//! Helpers panic on I/O failure: they only ever run inside tests.

use ferrosync_sync::{
    Result, SyncConfig, SyncEngine, SyncObserver, SyncPhase, SyncStats, TaskKind, TaskOutcome,
};
use filetime::FileTime;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use walkdir::WalkDir;

/// A file tree as relative path (with `/` separators) to content
pub type Tree = BTreeMap<String, Vec<u8>>;

/// Write `content` to `root/relative`, creating parent directories
pub fn write_file(root: &Path, relative: &str, content: impl AsRef<[u8]>) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Write every `(relative, content)` pair under `root`
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    fs::create_dir_all(root).expect("Failed to create tree root");
    for (relative, content) in files {
        write_file(root, relative, content);
    }
}

/// Set the modification time of `path` to `age` before now
pub fn set_mtime_ago(path: &Path, age: Duration) {
    set_mtime(path, SystemTime::now() - age);
}

/// Set the modification time of `path`
pub fn set_mtime(path: &Path, when: SystemTime) {
    filetime::set_file_mtime(path, FileTime::from_system_time(when))
        .expect("Failed to set modification time");
}

/// Give `to` exactly the modification time of `from`
pub fn copy_mtime(from: &Path, to: &Path) {
    let metadata = fs::metadata(from).expect("Failed to read metadata");
    filetime::set_file_mtime(to, FileTime::from_last_modification_time(&metadata))
        .expect("Failed to set modification time");
}

/// Read every regular file under `root`
pub fn read_tree(root: &Path) -> Tree {
    WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let relative = entry
                .path()
                .strip_prefix(root)
                .expect("Entry outside of root")
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            let content = fs::read(entry.path()).expect("Failed to read tree file");
            (relative, content)
        })
        .collect()
}

/// Build a [`Tree`] from string literals
pub fn tree(files: &[(&str, &str)]) -> Tree {
    files
        .iter()
        .map(|(relative, content)| ((*relative).to_string(), content.as_bytes().to_vec()))
        .collect()
}

/// A temporary source and destination pair
pub struct SyncFixture {
    /// Owns the temporary directory
    pub temp_dir: TempDir,
    /// Source root
    pub source: PathBuf,
    /// Destination root
    pub destination: PathBuf,
}

impl SyncFixture {
    /// Create a fixture with an empty source and no destination yet
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let source = temp_dir.path().join("source");
        let destination = temp_dir.path().join("destination");
        fs::create_dir_all(&source).expect("Failed to create source root");
        Self {
            temp_dir,
            source,
            destination,
        }
    }

    /// Default configuration for this fixture
    pub fn config(&self) -> SyncConfig {
        SyncConfig::new(&self.source, &self.destination)
    }

    /// Run one sync with `config`
    pub async fn run(&self, config: SyncConfig) -> Result<SyncStats> {
        SyncEngine::new(config).run().await
    }

    /// Run one sync with `config`, recording every notification
    pub async fn run_recorded(&self, config: SyncConfig) -> (Result<SyncStats>, Arc<RecordingObserver>) {
        let observer = Arc::new(RecordingObserver::default());
        let result = SyncEngine::new(config)
            .with_observer(observer.clone())
            .run()
            .await;
        (result, observer)
    }
}

impl Default for SyncFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer keeping every notification it receives
#[derive(Debug, Default)]
pub struct RecordingObserver {
    phases: Mutex<Vec<SyncPhase>>,
    outcomes: Mutex<Vec<TaskOutcome>>,
    completed: Mutex<Option<SyncStats>>,
}

impl RecordingObserver {
    /// Phases in the order they were entered
    pub fn phases(&self) -> Vec<SyncPhase> {
        self.phases.lock().expect("observer lock poisoned").clone()
    }

    /// Every task outcome, in completion order
    pub fn outcomes(&self) -> Vec<TaskOutcome> {
        self.outcomes.lock().expect("observer lock poisoned").clone()
    }

    /// Number of outcomes of `kind` with the given success flag
    pub fn count(&self, kind: TaskKind, success: bool) -> usize {
        self.outcomes()
            .iter()
            .filter(|o| o.kind == kind && o.success == success)
            .count()
    }

    /// Statistics handed to `on_complete`, if the run completed
    pub fn completed(&self) -> Option<SyncStats> {
        self.completed.lock().expect("observer lock poisoned").clone()
    }
}

impl SyncObserver for RecordingObserver {
    fn on_phase(&self, phase: SyncPhase) {
        self.phases.lock().expect("observer lock poisoned").push(phase);
    }

    fn on_outcome(&self, outcome: &TaskOutcome) {
        self.outcomes
            .lock()
            .expect("observer lock poisoned")
            .push(outcome.clone());
    }

    fn on_complete(&self, stats: &SyncStats) {
        *self.completed.lock().expect("observer lock poisoned") = Some(stats.clone());
    }
}

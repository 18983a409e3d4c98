//! Main synchronization engine
//!
//! [`SyncEngine`] sequences the phases of a run. Phases never overlap: each
//! one finishes every task it submitted before the next begins.

use crate::classify::{Classifier, DeleteClassification};
use crate::pool::{CpuPool, IoPool};
use crate::scanner::{FileScanner, ScanSnapshot};
use crate::stats::StatsAggregator;
use crate::transfer::{DeletionExecutor, TransferExecutor};
use crate::verify::{HashVerifier, VerifyReport};
use ferrosync_types::{
    CopyTask, Error, NoopObserver, Result, SyncConfig, SyncObserver, SyncPhase, SyncStats,
    TaskOutcome,
};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, info_span, warn, Instrument};

/// Main synchronization engine
pub struct SyncEngine {
    config: SyncConfig,
    observer: Arc<dyn SyncObserver>,
}

impl fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SyncEngine {
    /// Create a new sync engine
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Report progress to `observer`
    pub fn with_observer(mut self, observer: Arc<dyn SyncObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Configuration of this engine
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Perform one synchronization run
    ///
    /// Only a fatal error, such as a missing source root, is returned as
    /// `Err`. Every other failure is recorded in the returned statistics.
    pub async fn run(&self) -> Result<SyncStats> {
        let span = info_span!(
            "sync",
            source = %self.config.source.display(),
            destination = %self.config.destination.display()
        );
        self.run_phases().instrument(span).await
    }

    async fn run_phases(&self) -> Result<SyncStats> {
        let started = Instant::now();
        let mut aggregator = StatsAggregator::new();
        self.enter(SyncPhase::Idle);

        info!(
            "Starting sync: {} -> {}",
            self.config.source.display(),
            self.config.destination.display()
        );

        // Phase 1: Scan both trees
        self.enter(SyncPhase::Scanning);
        let (source, destination) = match self.scan().await {
            Ok(snapshots) => snapshots,
            Err(e) => return Err(self.abort(e)),
        };
        info!(
            source_files = source.len(),
            destination_files = destination.len(),
            "Scan finished"
        );
        // Destination warnings resurface in the deletion walk and count there
        for warning in &source.warnings {
            aggregator.record_warning(warning);
        }

        // Phase 2: Classify
        self.enter(SyncPhase::Classifying);
        let classifier = Classifier::new(self.config.strategy())
            .follow_symlinks(self.config.follow_symlinks);
        let mut classification = classifier.classify_copies(
            &self.config.source,
            &self.config.destination,
            &source,
            &destination,
        );
        aggregator.record_skipped(classification.up_to_date);

        // Phase 3: Verify candidates
        let candidates = std::mem::take(&mut classification.candidates);
        let differing = if candidates.is_empty() {
            Vec::new()
        } else {
            self.enter(SyncPhase::Verifying);
            self.observer
                .on_planned(SyncPhase::Verifying, candidates.len() as u64);
            let report = self.verify(candidates).await;
            aggregator.record_verified_identical(report.identical.len() as u64);
            aggregator.record_inconclusive(report.inconclusive.len() as u64);
            report.differing
        };

        let io_pool = IoPool::new(self.config.workers);

        // Phase 4: Copy
        self.enter(SyncPhase::Copying);
        let plan = classification.into_plan(differing);
        self.observer
            .on_planned(SyncPhase::Copying, plan.len() as u64);
        info!(files = plan.len(), workers = io_pool.workers(), "Copying files");
        let transfer = Arc::new(TransferExecutor::new(self.config.atomic_copy));
        io_pool
            .execute_all(plan, transfer, |outcome| {
                self.consume(&mut aggregator, &outcome);
            })
            .await;

        // Phase 5: Delete orphans, detected only after every copy finished
        self.enter(SyncPhase::Deleting);
        let deletions = self.classify_deletions(classifier).await;
        for warning in &deletions.warnings {
            aggregator.record_warning(warning);
        }
        self.observer
            .on_planned(SyncPhase::Deleting, deletions.plan.len() as u64);
        info!(files = deletions.plan.len(), "Deleting orphaned files");
        io_pool
            .execute_all(deletions.plan, Arc::new(DeletionExecutor::new()), |outcome| {
                self.consume(&mut aggregator, &outcome);
            })
            .await;

        // Phase 6: Report
        self.enter(SyncPhase::Reporting);
        let stats = aggregator.finish(started.elapsed());
        info!(
            copied = stats.files_copied,
            deleted = stats.files_deleted,
            skipped = stats.files_skipped,
            errors = stats.error_count(),
            "Sync completed in {:?}",
            stats.elapsed
        );

        self.enter(SyncPhase::Done);
        self.observer.on_complete(&stats);
        Ok(stats)
    }

    fn enter(&self, phase: SyncPhase) {
        info!(%phase, "Entering phase");
        self.observer.on_phase(phase);
    }

    fn abort(&self, error: Error) -> Error {
        error!("Sync aborted: {}", error);
        self.enter(SyncPhase::Aborted);
        error
    }

    fn consume(&self, aggregator: &mut StatsAggregator, outcome: &TaskOutcome) {
        aggregator.record(outcome);
        self.observer.on_outcome(outcome);
    }

    async fn scan(&self) -> Result<(ScanSnapshot, ScanSnapshot)> {
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || scan_trees(&config))
            .await
            .map_err(|e| Error::sync(format!("Scan task failed: {}", e)))?
    }

    async fn verify(&self, candidates: Vec<CopyTask>) -> VerifyReport {
        match CpuPool::new(self.config.hash_workers) {
            Ok(pool) => HashVerifier::new(pool).verify(candidates).await,
            Err(e) => {
                warn!("{}", e);
                VerifyReport::all_inconclusive(candidates, &e.to_string())
            }
        }
    }

    async fn classify_deletions(&self, classifier: Classifier) -> DeleteClassification {
        let source = self.config.source.clone();
        let destination = self.config.destination.clone();

        match tokio::task::spawn_blocking(move || {
            classifier.classify_deletions(&source, &destination)
        })
        .await
        {
            Ok(result) => result,
            Err(e) => {
                let warning = Error::traversal(
                    &self.config.destination,
                    format!("deletion scan failed: {}", e),
                );
                warn!("{}", warning);
                DeleteClassification {
                    plan: Vec::new(),
                    warnings: vec![warning],
                }
            }
        }
    }
}

/// Scan the source (mirroring its directories) and then the destination
///
/// The source root is validated before anything is created.
fn scan_trees(config: &SyncConfig) -> Result<(ScanSnapshot, ScanSnapshot)> {
    let source_items = FileScanner::new(&config.source)
        .mirror_into(&config.destination)
        .follow_symlinks(config.follow_symlinks)
        .scan()?;

    check_roots(&config.source, &config.destination)?;
    fs::create_dir_all(&config.destination).map_err(|e| {
        Error::config(format!(
            "Cannot create destination root '{}': {}",
            config.destination.display(),
            e
        ))
    })?;

    let source = ScanSnapshot::gather(source_items);
    let destination = FileScanner::new(&config.destination)
        .follow_symlinks(config.follow_symlinks)
        .collect()?;

    Ok((source, destination))
}

/// Reject roots that are equal or nested in either direction
fn check_roots(source: &Path, destination: &Path) -> Result<()> {
    let source = fs::canonicalize(source).map_err(|e| {
        Error::config(format!("Cannot resolve source '{}': {}", source.display(), e))
    })?;
    let destination = resolve_lexically(destination);

    if destination.starts_with(&source) {
        return Err(Error::config(format!(
            "Destination '{}' lies inside source '{}'",
            destination.display(),
            source.display()
        )));
    }
    if source.starts_with(&destination) {
        return Err(Error::config(format!(
            "Source '{}' lies inside destination '{}'",
            source.display(),
            destination.display()
        )));
    }
    Ok(())
}

/// Canonicalize the deepest existing ancestor and append the rest
fn resolve_lexically(path: &Path) -> PathBuf {
    let mut existing = path;
    let mut rest = Vec::new();

    loop {
        if let Ok(resolved) = fs::canonicalize(existing) {
            return rest
                .iter()
                .rev()
                .fold(resolved, |acc: PathBuf, part| acc.join(part));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name.to_os_string());
                existing = if parent.as_os_str().is_empty() {
                    Path::new(".")
                } else {
                    parent
                };
            }
            _ => return path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrosync_types::{ErrorKind, ThreadCount};
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recorder {
        phases: Mutex<Vec<SyncPhase>>,
        planned: Mutex<Vec<(SyncPhase, u64)>>,
        outcomes: Mutex<Vec<TaskOutcome>>,
        completed: Mutex<Option<SyncStats>>,
    }

    impl SyncObserver for Recorder {
        fn on_phase(&self, phase: SyncPhase) {
            self.phases.lock().unwrap().push(phase);
        }

        fn on_planned(&self, phase: SyncPhase, total: u64) {
            self.planned.lock().unwrap().push((phase, total));
        }

        fn on_outcome(&self, outcome: &TaskOutcome) {
            self.outcomes.lock().unwrap().push(outcome.clone());
        }

        fn on_complete(&self, stats: &SyncStats) {
            *self.completed.lock().unwrap() = Some(stats.clone());
        }
    }

    fn setup() -> (TempDir, PathBuf, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("src");
        let destination = temp_dir.path().join("dst");
        fs::create_dir_all(source.join("sub")).unwrap();
        fs::write(source.join("a.txt"), "hello").unwrap();
        fs::write(source.join("sub/b.txt"), "world").unwrap();
        (temp_dir, source, destination)
    }

    #[tokio::test]
    async fn test_fast_run_phases_in_order() {
        let (_temp_dir, source, destination) = setup();
        let recorder = Arc::new(Recorder::default());

        let stats = SyncEngine::new(SyncConfig::new(&source, &destination))
            .with_observer(recorder.clone())
            .run()
            .await
            .unwrap();

        assert_eq!(
            *recorder.phases.lock().unwrap(),
            vec![
                SyncPhase::Idle,
                SyncPhase::Scanning,
                SyncPhase::Classifying,
                SyncPhase::Copying,
                SyncPhase::Deleting,
                SyncPhase::Reporting,
                SyncPhase::Done,
            ]
        );
        assert_eq!(stats.files_copied, 2);
        assert_eq!(recorder.outcomes.lock().unwrap().len(), 2);
        assert_eq!(
            *recorder.planned.lock().unwrap(),
            vec![(SyncPhase::Copying, 2), (SyncPhase::Deleting, 0)]
        );
        assert_eq!(recorder.completed.lock().unwrap().as_ref(), Some(&stats));
    }

    #[tokio::test]
    async fn test_verify_phase_only_with_candidates() {
        let (_temp_dir, source, destination) = setup();
        let config = SyncConfig::new(&source, &destination)
            .with_verify(true)
            .with_hash_workers(Some(ThreadCount::new(2).unwrap()));

        // First run: nothing on the destination side yet
        let first = Arc::new(Recorder::default());
        SyncEngine::new(config.clone())
            .with_observer(first.clone())
            .run()
            .await
            .unwrap();
        assert!(!first.phases.lock().unwrap().contains(&SyncPhase::Verifying));

        // Second run: both files are candidates and identical
        let second = Arc::new(Recorder::default());
        let stats = SyncEngine::new(config)
            .with_observer(second.clone())
            .run()
            .await
            .unwrap();
        assert!(second.phases.lock().unwrap().contains(&SyncPhase::Verifying));
        assert_eq!(stats.files_copied, 0);
        assert_eq!(stats.files_verified_identical, 2);
        assert_eq!(stats.files_skipped, 2);
    }

    #[tokio::test]
    async fn test_missing_source_aborts_without_mutation() {
        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("dst");
        let recorder = Arc::new(Recorder::default());

        let err = SyncEngine::new(SyncConfig::new(temp_dir.path().join("nope"), &destination))
            .with_observer(recorder.clone())
            .run()
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(!destination.exists());
        assert_eq!(
            *recorder.phases.lock().unwrap(),
            vec![SyncPhase::Idle, SyncPhase::Scanning, SyncPhase::Aborted]
        );
        assert!(recorder.completed.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_destination_inside_source_is_fatal() {
        let (_temp_dir, source, _) = setup();
        let nested = source.join("mirror");

        let err = SyncEngine::new(SyncConfig::new(&source, &nested))
            .run()
            .await
            .unwrap_err();

        assert!(err.is_fatal());
        assert!(!nested.exists());
    }

    #[tokio::test]
    async fn test_source_inside_destination_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("dst");
        let source = destination.join("src");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("f.txt"), "precious").unwrap();
        let recorder = Arc::new(Recorder::default());

        let err = SyncEngine::new(SyncConfig::new(&source, &destination))
            .with_observer(recorder.clone())
            .run()
            .await
            .unwrap_err();

        assert!(err.is_fatal());
        assert_eq!(err.kind(), ErrorKind::Config);
        assert_eq!(fs::read_to_string(source.join("f.txt")).unwrap(), "precious");
        assert!(recorder.outcomes.lock().unwrap().is_empty());
        assert_eq!(
            recorder.phases.lock().unwrap().last(),
            Some(&SyncPhase::Aborted)
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_destination_warning_counted_once() {
        let (_temp_dir, source, destination) = setup();
        fs::create_dir_all(&destination).unwrap();
        std::os::unix::fs::symlink(destination.join("missing"), destination.join("dangling"))
            .unwrap();
        let config = SyncConfig::new(&source, &destination).with_follow_symlinks(true);

        let stats = SyncEngine::new(config)
            .run()
            .await
            .unwrap();

        assert_eq!(stats.files_copied, 2);
        assert_eq!(stats.error_count(), 1);
        assert!(stats.errors[0].contains("dangling"));
    }

    #[test]
    fn test_resolve_lexically_appends_missing_tail() {
        let temp_dir = TempDir::new().unwrap();
        let resolved = resolve_lexically(&temp_dir.path().join("x/y"));
        let base = fs::canonicalize(temp_dir.path()).unwrap();
        assert_eq!(resolved, base.join("x").join("y"));
    }
}

//! Change classification
//!
//! Copy classification compares two scan snapshots. Deletion classification
//! is a separate walk of the destination, run after every transfer has
//! finished.

use crate::scanner::{FileScanner, ScanItem, ScanSnapshot};
use ferrosync_types::{CompareStrategy, CopyTask, DeleteTask, Error, FileEntry};
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

/// Transfers to perform, each destination appears at most once
pub type CopyPlan = Vec<CopyTask>;

/// Deletions to perform, each destination appears at most once
pub type DeletePlan = Vec<DeleteTask>;

/// Check whether `source` should replace `destination` in fast mode
///
/// The source must be strictly newer; with `compare_size` a size mismatch
/// also counts.
pub fn is_stale(source: &FileEntry, destination: &FileEntry, compare_size: bool) -> bool {
    source.modified > destination.modified || (compare_size && source.size != destination.size)
}

/// Source entries partitioned against the destination
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyClassification {
    /// Files missing from the destination
    pub new_files: Vec<CopyTask>,
    /// Files judged stale by metadata
    pub stale: Vec<CopyTask>,
    /// Pairs awaiting a content comparison
    pub candidates: Vec<CopyTask>,
    /// Files judged current without reading content
    pub up_to_date: u64,
}

impl CopyClassification {
    /// Merge the confirmed-different candidates into the final copy plan
    pub fn into_plan(self, differing: Vec<CopyTask>) -> CopyPlan {
        let mut plan = self.new_files;
        plan.extend(self.stale);
        plan.extend(differing);
        plan
    }
}

/// Orphans found in the destination
#[derive(Debug, Clone, Default)]
pub struct DeleteClassification {
    /// Files to remove
    pub plan: DeletePlan,
    /// Traversal warnings met on the way
    pub warnings: Vec<Error>,
}

/// Decides which files to copy and which to delete
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    strategy: CompareStrategy,
    follow_symlinks: bool,
}

impl Classifier {
    /// Create a classifier for `strategy`
    pub fn new(strategy: CompareStrategy) -> Self {
        Self {
            strategy,
            follow_symlinks: false,
        }
    }

    /// Follow symbolic links during the deletion walk
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Active strategy
    pub fn strategy(&self) -> CompareStrategy {
        self.strategy
    }

    /// Partition every source entry against the destination snapshot
    pub fn classify_copies(
        &self,
        source_root: &Path,
        destination_root: &Path,
        source: &ScanSnapshot,
        destination: &ScanSnapshot,
    ) -> CopyClassification {
        let mut result = CopyClassification::default();

        for (relative, source_entry) in &source.entries {
            let task = CopyTask::mirrored(source_root, destination_root, relative);

            let Some(destination_entry) = destination.entries.get(relative) else {
                debug!("New file: {}", relative.display());
                result.new_files.push(task);
                continue;
            };

            match self.strategy {
                CompareStrategy::Fast { compare_size } => {
                    if is_stale(source_entry, destination_entry, compare_size) {
                        debug!("Stale file: {}", relative.display());
                        result.stale.push(task);
                    } else {
                        result.up_to_date += 1;
                    }
                }
                CompareStrategy::Verified => result.candidates.push(task),
            }
        }

        info!(
            new = result.new_files.len(),
            stale = result.stale.len(),
            candidates = result.candidates.len(),
            up_to_date = result.up_to_date,
            "Classified source files"
        );
        result
    }

    /// Walk the destination and plan removal of every orphan
    ///
    /// A destination file is orphaned when nothing at all exists at the
    /// mirrored source path.
    pub fn classify_deletions(
        &self,
        source_root: &Path,
        destination_root: &Path,
    ) -> DeleteClassification {
        let mut result = DeleteClassification::default();

        let items = match FileScanner::new(destination_root)
            .follow_symlinks(self.follow_symlinks)
            .scan()
        {
            Ok(items) => items,
            Err(e) => {
                let warning = Error::traversal(destination_root, e.to_string());
                warn!("{}", warning);
                result.warnings.push(warning);
                return result;
            }
        };

        for item in items {
            match item {
                ScanItem::File(entry) => {
                    let mirrored = source_root.join(&entry.relative_path);
                    match mirrored.symlink_metadata() {
                        Ok(_) => {}
                        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                            let warning = Error::traversal(&mirrored, e.to_string());
                            warn!("{}", warning);
                            result.warnings.push(warning);
                        }
                        Err(_) => {
                            debug!("Orphaned file: {}", entry.relative_path.display());
                            result.plan.push(DeleteTask::new(entry.absolute_path));
                        }
                    }
                }
                ScanItem::Warning(warning) => result.warnings.push(warning),
            }
        }

        info!(orphans = result.plan.len(), "Classified destination files");
        result
    }
}

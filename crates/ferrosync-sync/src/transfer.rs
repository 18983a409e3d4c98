//! Transfer and deletion executors
//!
//! Both run on blocking threads of the I/O pool and turn every failure into
//! a failed [`TaskOutcome`].

use crate::pool::TaskExecutor;
use ferrosync_types::{CopyTask, DeleteTask, Error, Result, TaskKind, TaskOutcome};
use filetime::FileTime;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// Suffix of in-flight staging files
///
/// Each staging file gets a fresh random name in the destination's own
/// directory, so it never collides with a mirrored file and the final rename
/// never crosses a filesystem.
pub const STAGING_SUFFIX: &str = ".ferrosync-tmp";

/// Copies one file with its permissions and timestamps
#[derive(Debug, Clone, Copy)]
pub struct TransferExecutor {
    atomic: bool,
}

impl TransferExecutor {
    /// Create an executor; `atomic` stages copies and renames them into place
    pub fn new(atomic: bool) -> Self {
        Self { atomic }
    }

    fn copy(&self, task: &CopyTask) -> Result<u64> {
        let source = &task.source;
        let destination = &task.destination;
        let fail = |context: &str, e: io::Error| {
            Error::task(destination, format!("{}: {}", context, e))
        };

        if let Some(parent) = destination.parent() {
            ensure_dir(parent).map_err(|e| {
                fail(&format!("cannot create directory '{}'", parent.display()), e)
            })?;
        }

        let metadata = fs::metadata(source)
            .map_err(|e| fail(&format!("cannot read source '{}'", source.display()), e))?;

        if !self.atomic {
            let bytes = fs::copy(source, destination)
                .map_err(|e| fail(&format!("cannot copy from '{}'", source.display()), e))?;
            apply_metadata(destination, &metadata)
                .map_err(|e| fail("cannot apply metadata", e))?;
            return Ok(bytes);
        }

        let name = destination
            .file_name()
            .ok_or_else(|| Error::task(destination, "destination has no file name"))?;
        let dir = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        // Dropped on any failure below, which removes the staging file
        let mut staged = tempfile::Builder::new()
            .prefix(&format!(".{}.", name.to_string_lossy()))
            .suffix(STAGING_SUFFIX)
            .tempfile_in(dir)
            .map_err(|e| fail("cannot create staging file", e))?;

        let bytes = fs::File::open(source)
            .and_then(|mut reader| io::copy(&mut reader, staged.as_file_mut()))
            .and_then(|bytes| apply_metadata(staged.path(), &metadata).map(|()| bytes))
            .map_err(|e| fail(&format!("cannot copy from '{}'", source.display()), e))?;

        staged
            .persist(destination)
            .map_err(|e| fail("cannot move staged copy into place", e.error))?;
        Ok(bytes)
    }
}

impl TaskExecutor for TransferExecutor {
    type Task = CopyTask;
    const KIND: TaskKind = TaskKind::Copy;

    fn target(task: &CopyTask) -> &Path {
        &task.destination
    }

    fn execute(&self, task: CopyTask) -> TaskOutcome {
        match self.copy(&task) {
            Ok(bytes) => {
                debug!(
                    "Copied: {} -> {} ({} bytes)",
                    task.source.display(),
                    task.destination.display(),
                    bytes
                );
                TaskOutcome::succeeded(TaskKind::Copy, task.destination, bytes)
            }
            Err(e) => {
                warn!("{}", e);
                TaskOutcome::failed(TaskKind::Copy, task.destination, e.to_string())
            }
        }
    }
}

/// Removes one orphaned file
#[derive(Debug, Clone, Copy, Default)]
pub struct DeletionExecutor;

impl DeletionExecutor {
    /// Create a new deletion executor
    pub fn new() -> Self {
        Self
    }
}

impl TaskExecutor for DeletionExecutor {
    type Task = DeleteTask;
    const KIND: TaskKind = TaskKind::Delete;

    fn target(task: &DeleteTask) -> &Path {
        &task.destination
    }

    fn execute(&self, task: DeleteTask) -> TaskOutcome {
        match fs::remove_file(&task.destination) {
            Ok(()) => {
                debug!("Deleted: {}", task.destination.display());
                TaskOutcome::succeeded(TaskKind::Delete, task.destination, 0)
            }
            Err(e) => {
                let reason = if e.kind() == io::ErrorKind::NotFound {
                    "file was already absent".to_string()
                } else {
                    format!("cannot remove file: {}", e)
                };
                let error = Error::task(&task.destination, reason);
                warn!("{}", error);
                TaskOutcome::failed(TaskKind::Delete, task.destination, error.to_string())
            }
        }
    }
}

/// Create `dir` and its parents, tolerating a concurrent creator
fn ensure_dir(dir: &Path) -> io::Result<()> {
    match fs::create_dir_all(dir) {
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        other => other,
    }
}

/// Replicate access/modification times and permission bits
///
/// Times go first so a read-only permission set last cannot block them.
fn apply_metadata(path: &Path, metadata: &fs::Metadata) -> io::Result<()> {
    filetime::set_file_times(
        path,
        FileTime::from_last_access_time(metadata),
        FileTime::from_last_modification_time(metadata),
    )?;
    fs::set_permissions(path, metadata.permissions())
}

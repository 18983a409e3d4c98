//! Directory tree scanning
//!
//! [`FileScanner`] walks a tree lazily and yields every regular file below
//! the root. Unreadable branches are skipped and reported as warnings. When
//! a mirror root is set, every directory found is recreated under it as the
//! walk proceeds, so later copies only ever need the file's own parent.

use ferrosync_types::{Error, FileEntry, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// One item produced by a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanItem {
    /// A regular file
    File(FileEntry),
    /// A branch or entry that could not be read, always [`Error::Traversal`]
    Warning(Error),
}

/// Walks a directory tree
#[derive(Debug, Clone)]
pub struct FileScanner {
    root: PathBuf,
    mirror: Option<PathBuf>,
    follow_symlinks: bool,
}

impl FileScanner {
    /// Create a scanner for `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            mirror: None,
            follow_symlinks: false,
        }
    }

    /// Recreate every directory found under `mirror_root`
    pub fn mirror_into(mut self, mirror_root: impl Into<PathBuf>) -> Self {
        self.mirror = Some(mirror_root.into());
        self
    }

    /// Follow symbolic links instead of skipping them
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Start a lazy scan
    ///
    /// Fails with [`Error::Config`] when the root is missing, is not a
    /// directory or cannot be listed. Nothing is created before this check.
    pub fn scan(&self) -> Result<ScanIter> {
        let metadata = fs::metadata(&self.root).map_err(|e| {
            Error::config(format!(
                "Cannot access root '{}': {}",
                self.root.display(),
                e
            ))
        })?;

        if !metadata.is_dir() {
            return Err(Error::config(format!(
                "Root is not a directory: {}",
                self.root.display()
            )));
        }

        fs::read_dir(&self.root).map_err(|e| {
            Error::config(format!(
                "Cannot read root '{}': {}",
                self.root.display(),
                e
            ))
        })?;

        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(self.follow_symlinks)
            .into_iter();

        Ok(ScanIter {
            root: self.root.clone(),
            mirror: self.mirror.clone(),
            walker,
        })
    }

    /// Scan the whole tree into a snapshot
    pub fn collect(&self) -> Result<ScanSnapshot> {
        Ok(ScanSnapshot::gather(self.scan()?))
    }
}

/// Lazy iterator over a scan
#[derive(Debug)]
pub struct ScanIter {
    root: PathBuf,
    mirror: Option<PathBuf>,
    walker: walkdir::IntoIter,
}

impl ScanIter {
    fn visit(&self, entry: &walkdir::DirEntry) -> Option<ScanItem> {
        let path = entry.path();
        let Ok(relative) = path.strip_prefix(&self.root) else {
            return Some(ScanItem::Warning(Error::traversal(
                path,
                "entry lies outside the scanned root",
            )));
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            return self.mirror_dir(relative);
        }

        if !file_type.is_file() {
            debug!("Skipping non-regular entry: {}", path.display());
            return None;
        }

        match entry.metadata() {
            Ok(metadata) => Some(ScanItem::File(FileEntry::new(
                relative,
                path,
                metadata.len(),
                metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            ))),
            Err(e) => Some(ScanItem::Warning(Error::traversal(path, e.to_string()))),
        }
    }

    fn mirror_dir(&self, relative: &Path) -> Option<ScanItem> {
        let mirror = self.mirror.as_ref()?.join(relative);
        match fs::create_dir_all(&mirror) {
            Ok(()) => None,
            Err(e) => Some(ScanItem::Warning(Error::traversal(
                &mirror,
                format!("cannot create mirrored directory: {}", e),
            ))),
        }
    }
}

impl Iterator for ScanIter {
    type Item = ScanItem;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let item = match self.walker.next()? {
                Ok(entry) => self.visit(&entry),
                Err(e) => {
                    let path = e.path().map_or_else(|| self.root.clone(), Path::to_path_buf);
                    Some(ScanItem::Warning(Error::traversal(path, e.to_string())))
                }
            };

            if let Some(item) = item {
                if let ScanItem::Warning(warning) = &item {
                    warn!("{}", warning);
                }
                return Some(item);
            }
        }
    }
}

/// Every file of a completed scan, keyed by relative path
#[derive(Debug, Clone, Default)]
pub struct ScanSnapshot {
    /// Files by path relative to the scanned root
    pub entries: BTreeMap<PathBuf, FileEntry>,
    /// Traversal warnings, in the order they were met
    pub warnings: Vec<Error>,
}

impl ScanSnapshot {
    /// Drain a scan into a snapshot
    pub fn gather(items: impl IntoIterator<Item = ScanItem>) -> Self {
        let mut snapshot = Self::default();
        for item in items {
            match item {
                ScanItem::File(entry) => {
                    snapshot.entries.insert(entry.relative_path.clone(), entry);
                }
                ScanItem::Warning(warning) => snapshot.warnings.push(warning),
            }
        }
        snapshot
    }

    /// Number of files
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no file was found
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

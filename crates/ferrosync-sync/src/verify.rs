//! Content verification by hashing
//!
//! Candidate pairs are hashed on the CPU pool. A pair is skipped only when
//! both sides hashed and the digests match; anything else is copied.

use crate::pool::CpuPool;
use ferrosync_types::{CopyTask, Error, Result};
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Content digest of a file
pub type Digest = blake3::Hash;

/// Files are hashed in blocks of this many bytes
pub const HASH_BLOCK_SIZE: usize = 1024 * 1024;

/// Hash a file, reading it in [`HASH_BLOCK_SIZE`] blocks
pub fn digest_file(path: &Path) -> Result<Digest> {
    let mut file = File::open(path).map_err(|e| Error::from_io_at(&e, path))?;
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; HASH_BLOCK_SIZE];

    loop {
        let read = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::from_io_at(&e, path)),
        };
        hasher.update(&buffer[..read]);
    }

    Ok(hasher.finalize())
}

/// Result of verifying a set of candidate pairs
#[derive(Debug, Clone, Default)]
pub struct VerifyReport {
    /// Pairs that must be copied, inconclusive ones included
    pub differing: Vec<CopyTask>,
    /// Pairs confirmed identical
    pub identical: Vec<CopyTask>,
    /// One entry per pair that could not be compared
    pub inconclusive: Vec<Error>,
}

impl VerifyReport {
    /// Report for pairs that could not be hashed at all
    pub fn all_inconclusive(pairs: Vec<CopyTask>, reason: &str) -> Self {
        let inconclusive = pairs
            .iter()
            .map(|pair| Error::verification_inconclusive(&pair.destination, reason))
            .collect();
        Self {
            differing: pairs,
            identical: Vec::new(),
            inconclusive,
        }
    }
}

/// Confirms candidate pairs by content hash
#[derive(Debug)]
pub struct HashVerifier {
    pool: CpuPool,
}

impl HashVerifier {
    /// Create a verifier hashing on `pool`
    pub fn new(pool: CpuPool) -> Self {
        Self { pool }
    }

    /// Compare every pair by content
    ///
    /// Each distinct path is hashed once, whatever the number of pairs it
    /// appears in.
    pub async fn verify(&self, pairs: Vec<CopyTask>) -> VerifyReport {
        if pairs.is_empty() {
            return VerifyReport::default();
        }

        let paths: BTreeSet<PathBuf> = pairs
            .iter()
            .flat_map(|pair| [pair.source.clone(), pair.destination.clone()])
            .collect();
        info!(
            pairs = pairs.len(),
            files = paths.len(),
            threads = self.pool.threads(),
            "Hashing candidate files"
        );

        let digests: HashMap<PathBuf, Result<Digest>> = self
            .pool
            .map(paths.into_iter().collect(), |path: &PathBuf| digest_file(path))
            .await
            .into_iter()
            .collect();

        let mut report = VerifyReport::default();
        for pair in pairs {
            match compare(&digests, &pair) {
                Ok(true) => {
                    debug!("Identical content: {}", pair.destination.display());
                    report.identical.push(pair);
                }
                Ok(false) => {
                    debug!("Content differs: {}", pair.destination.display());
                    report.differing.push(pair);
                }
                Err(reason) => {
                    warn!("{}", reason);
                    report.inconclusive.push(reason);
                    report.differing.push(pair);
                }
            }
        }

        info!(
            differing = report.differing.len(),
            identical = report.identical.len(),
            inconclusive = report.inconclusive.len(),
            "Verification finished"
        );
        report
    }
}

/// `Ok(true)` when both digests exist and match
fn compare(
    digests: &HashMap<PathBuf, Result<Digest>>,
    pair: &CopyTask,
) -> std::result::Result<bool, Error> {
    let lookup = |path: &Path| match digests.get(path) {
        Some(Ok(digest)) => Ok(*digest),
        Some(Err(e)) => Err(Error::verification_inconclusive(path, e.to_string())),
        None => Err(Error::verification_inconclusive(path, "no digest produced")),
    };

    let source = lookup(pair.source.as_path())?;
    let destination = lookup(pair.destination.as_path())?;
    Ok(source == destination)
}

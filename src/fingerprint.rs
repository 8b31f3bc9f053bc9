//! Content fingerprints and run-scoped duplicate detection.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Error)]
#[error("Failed to fingerprint {}: {source}", .path.display())]
pub struct FingerprintError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Hex-encoded SHA-256 digest of a file's full content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Computes the fingerprint of a file, reading it in fixed-size chunks.
pub fn fingerprint_file(path: &Path) -> Result<Fingerprint, FingerprintError> {
    let wrap = |source| FingerprintError {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(wrap)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let n = file.read(&mut buffer).map_err(wrap)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(Fingerprint(format!("{:x}", hasher.finalize())))
}

/// Outcome of a duplicate check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuplicateCheck {
    /// First file seen with this content; it is now the canonical copy.
    Unique(Fingerprint),
    /// Content already seen at `original`.
    Duplicate { original: PathBuf },
}

/// Maps fingerprints to the first path observed with them during one run.
///
/// Owned by the driver and dropped when the run ends; nothing is persisted.
#[derive(Debug, Default)]
pub struct FingerprintIndex {
    seen: HashMap<Fingerprint, PathBuf>,
}

impl FingerprintIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fingerprints `path` and records it unless the content was seen before.
    ///
    /// The index is never updated for duplicates, so the first path wins.
    pub fn check(&mut self, path: &Path) -> Result<DuplicateCheck, FingerprintError> {
        let fingerprint = fingerprint_file(path)?;
        Ok(self.record(fingerprint, path))
    }

    /// Records an already computed fingerprint.
    pub fn record(&mut self, fingerprint: Fingerprint, path: &Path) -> DuplicateCheck {
        if let Some(original) = self.seen.get(&fingerprint) {
            return DuplicateCheck::Duplicate {
                original: original.clone(),
            };
        }
        self.seen.insert(fingerprint.clone(), path.to_path_buf());
        DuplicateCheck::Unique(fingerprint)
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Option<&Path> {
        self.seen.get(fingerprint).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Moving files into their dated category directories.
///
/// This module decides the final destination of a file, appending `_1`,
/// `_2`, ... to the name when the destination is taken, and then moves the
/// file or only records the decision in dry-run mode.
use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::archiver::ArchiveError;
use crate::date_partition::PartitionError;
use crate::fingerprint::FingerprintError;

/// Errors that can occur while organizing files.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// Failed to create a category directory.
    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Failed to move a file to its destination.
    #[error("Failed to move {} to {}: {source}", .path.display(), .destination.display())]
    FileMoveFailure {
        path: PathBuf,
        destination: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Failed to read one entry of a directory listing.
    #[error("Failed to read directory entry {}: {source}", .path.display())]
    EntryReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Failed to list a directory that exists.
    #[error("Failed to read directory {}: {source}", .path.display())]
    DirectoryReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Fingerprint(#[from] FingerprintError),
    #[error(transparent)]
    Partition(#[from] PartitionError),
    #[error(transparent)]
    Backup(#[from] ArchiveError),
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// A single relocation decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    /// Where the file was found.
    pub source: PathBuf,
    /// Where the file was (or would be) moved to.
    pub destination: PathBuf,
    /// True when the move was only simulated.
    pub simulated: bool,
}

/// Resolves collision-free destinations and moves files.
///
/// In dry-run mode nothing is moved, so the relocator remembers the
/// destinations it already handed out; a second file with the same name is
/// then reported with a suffix, just as a real run would place it.
#[derive(Debug, Default)]
pub struct Relocator {
    dry_run: bool,
    claimed: HashSet<PathBuf>,
}

impl Relocator {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            claimed: HashSet::new(),
        }
    }

    fn is_taken(&self, candidate: &Path) -> bool {
        candidate.exists() || self.claimed.contains(candidate)
    }

    /// Returns the first free path for `file_name` inside `destination_dir`.
    ///
    /// Tries `<dir>/<name>` first, then `<stem>_1<.ext>`, `<stem>_2<.ext>`, ...
    /// Only the presence of an entry is checked, never its content. The name
    /// is kept byte for byte, whether or not it is valid UTF-8.
    pub fn resolve_destination(&self, destination_dir: &Path, file_name: &OsStr) -> PathBuf {
        let candidate = destination_dir.join(file_name);
        if !self.is_taken(&candidate) {
            return candidate;
        }

        let (stem, ext) = split_file_name(file_name);
        let mut counter: u64 = 1;
        loop {
            let candidate = destination_dir.join(suffixed_name(stem, ext, counter));
            if !self.is_taken(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }

    /// Moves `file_path` into `destination_dir`, or simulates it in dry-run mode.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use file_arranger::relocator::Relocator;
    /// use std::path::Path;
    ///
    /// let mut relocator = Relocator::new(false);
    /// let result = relocator.relocate(
    ///     Path::new("/path/to/base/report.pdf"),
    ///     Path::new("/path/to/base/Documents/2024-10"),
    /// );
    ///
    /// match result {
    ///     Ok(r) => println!("Moved {} to {}", r.source.display(), r.destination.display()),
    ///     Err(e) => eprintln!("Organization failed: {}", e),
    /// }
    /// ```
    pub fn relocate(
        &mut self,
        file_path: &Path,
        destination_dir: &Path,
    ) -> OrganizeResult<Relocation> {
        let file_name = file_path
            .file_name()
            .ok_or_else(|| OrganizeError::FileMoveFailure {
                path: file_path.to_path_buf(),
                destination: destination_dir.to_path_buf(),
                source: std::io::Error::new(
                    ErrorKind::InvalidInput,
                    "file has no name component",
                ),
            })?;

        let destination = self.resolve_destination(destination_dir, file_name);

        if self.dry_run {
            self.claimed.insert(destination.clone());
        } else {
            move_file(file_path, &destination)?;
        }

        Ok(Relocation {
            source: file_path.to_path_buf(),
            destination,
            simulated: self.dry_run,
        })
    }
}

/// Splits a file name into its stem and its extension without the dot.
///
/// `report.final.pdf` gives `("report.final", Some("pdf"))`, `README` and
/// `.bashrc` have no extension.
fn split_file_name(file_name: &OsStr) -> (&OsStr, Option<&OsStr>) {
    let path = Path::new(file_name);
    match path.file_stem() {
        Some(stem) => (stem, path.extension()),
        None => (file_name, None),
    }
}

/// `<stem>_<counter>.<ext>`, or `<stem>_<counter>` without an extension.
fn suffixed_name(stem: &OsStr, ext: Option<&OsStr>, counter: u64) -> OsString {
    let mut name = stem.to_os_string();
    name.push(format!("_{counter}"));
    if let Some(ext) = ext {
        name.push(".");
        name.push(ext);
    }
    name
}

/// Renames `source` to `destination`, copying and deleting instead when they
/// live on different filesystems.
pub fn move_file(source: &Path, destination: &Path) -> OrganizeResult<()> {
    let failure = |e| OrganizeError::FileMoveFailure {
        path: source.to_path_buf(),
        destination: destination.to_path_buf(),
        source: e,
    };

    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices => {
            fs::copy(source, destination).map_err(failure)?;
            fs::remove_file(source).map_err(failure)
        }
        Err(e) => Err(failure(e)),
    }
}

//! Pre-organization backups.
//!
//! Snapshots a whole directory tree into `<dir>/Backup/backup.tar.gz` before
//! any file in it is moved.

use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

pub const BACKUP_DIR_NAME: &str = "Backup";
pub const BACKUP_FILE_NAME: &str = "backup.tar.gz";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Failed to create backup directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to walk {}: {source}", .root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("Failed to write backup {}: {source}", .archive.display())]
    Write {
        archive: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Returns the path of the backup archive for `directory`.
pub fn backup_path(directory: &Path) -> PathBuf {
    directory.join(BACKUP_DIR_NAME).join(BACKUP_FILE_NAME)
}

/// Writes a gzip-compressed tar of every regular file under `directory`.
///
/// Entry names are relative to `directory`. The archive being written is
/// skipped; an archive left by an earlier run is overwritten. Returns the
/// archive path.
pub fn create_backup(directory: &Path) -> Result<PathBuf, ArchiveError> {
    let backup_dir = directory.join(BACKUP_DIR_NAME);
    fs::create_dir_all(&backup_dir).map_err(|source| ArchiveError::CreateDir {
        path: backup_dir.clone(),
        source,
    })?;

    let archive_path = backup_dir.join(BACKUP_FILE_NAME);
    let write_err = |source| ArchiveError::Write {
        archive: archive_path.clone(),
        source,
    };

    let file = File::create(&archive_path).map_err(write_err)?;
    let mut builder = tar::Builder::new(GzEncoder::new(
        BufWriter::new(file),
        Compression::default(),
    ));
    builder.follow_symlinks(false);

    for entry in WalkDir::new(directory).sort_by_file_name() {
        let entry = entry.map_err(|source| ArchiveError::Walk {
            root: directory.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() || entry.path() == archive_path.as_path() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(directory) else {
            continue;
        };
        builder
            .append_path_with_name(entry.path(), relative)
            .map_err(write_err)?;
    }

    let encoder = builder.into_inner().map_err(write_err)?;
    let mut writer = encoder.finish().map_err(write_err)?;
    std::io::Write::flush(&mut writer).map_err(write_err)?;

    Ok(archive_path)
}

//! Year-month partitioning of destination directories.
//!
//! A file created in October 2024 goes under `<root>/2024-10`.

use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PartitionError {
    #[error("Failed to read timestamp of {}: {source}", .path.display())]
    Timestamp {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Returns the creation time of a file, or its modification time on
/// platforms and filesystems that do not record creation.
pub fn creation_time(path: &Path) -> Result<DateTime<Local>, PartitionError> {
    let wrap = |source| PartitionError::Timestamp {
        path: path.to_path_buf(),
        source,
    };
    let metadata = fs::metadata(path).map_err(wrap)?;
    let time: SystemTime = match metadata.created() {
        Ok(created) => created,
        Err(_) => metadata.modified().map_err(wrap)?,
    };
    Ok(DateTime::<Local>::from(time))
}

/// Formats a timestamp as a `YYYY-MM` bucket name.
pub fn bucket_name(time: &DateTime<Local>) -> String {
    time.format("%Y-%m").to_string()
}

/// Returns the `YYYY-MM` bucket for a file.
pub fn month_bucket(path: &Path) -> Result<String, PartitionError> {
    creation_time(path).map(|time| bucket_name(&time))
}

/// Returns `<root>/<YYYY-MM>` for a timestamp.
pub fn partition_for(root: &Path, time: &DateTime<Local>) -> PathBuf {
    root.join(bucket_name(time))
}

/// Creates `<root>/<YYYY-MM>` for a timestamp along with any missing parents.
/// Calling it again for the same month is a no-op.
pub fn ensure_partition(root: &Path, time: &DateTime<Local>) -> Result<PathBuf, PartitionError> {
    let dated = partition_for(root, time);
    fs::create_dir_all(&dated).map_err(|source| PartitionError::CreateDir {
        path: dated.clone(),
        source,
    })?;
    Ok(dated)
}

/// Computes `<root>/<YYYY-MM>` for a file without touching the filesystem.
pub fn resolve(file_path: &Path, root: &Path) -> Result<PathBuf, PartitionError> {
    Ok(partition_for(root, &creation_time(file_path)?))
}

/// Computes `<root>/<YYYY-MM>` for a file and creates it.
pub fn ensure(file_path: &Path, root: &Path) -> Result<PathBuf, PartitionError> {
    ensure_partition(root, &creation_time(file_path)?)
}

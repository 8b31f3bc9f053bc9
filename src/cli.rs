//! Command-line interface and run driver.
//!
//! This module handles:
//! - Command-line parsing
//! - Resolving the set of directories to organize
//! - Scanning each directory and filtering its files
//! - Driving classification, partitioning, duplicate detection and relocation
//! - Collecting a summary of the run

use chrono::{DateTime, Local};
use clap::Parser;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::archiver;
use crate::config::{CompiledFilters, RunConfig};
use crate::date_partition;
use crate::file_category::{Classifier, extension_of};
use crate::fingerprint::{DuplicateCheck, FingerprintIndex};
use crate::relocator::{OrganizeError, OrganizeResult, Relocation, Relocator};

/// Home subdirectories organized when no `--dir` is given.
pub const DEFAULT_DIRECTORY_NAMES: [&str; 5] =
    ["Desktop", "Downloads", "Music", "Pictures", "Videos"];

/// Organize files by extension and date, and detect duplicates.
#[derive(Debug, Parser)]
#[command(name = "file-arranger", version)]
#[command(about = "Organize files by extension, date, and detect duplicates.", long_about = None)]
pub struct Args {
    /// Directory to scan (default: Desktop, Downloads, Music, Pictures and Videos in your home directory)
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// File types to organize (e.g. txt mp3 jpg)
    #[arg(long, num_args = 1..)]
    pub types: Option<Vec<String>>,

    /// Create a backup archive before organizing each directory
    #[arg(long)]
    pub backup: bool,

    /// Show what would be done without touching any file
    #[arg(long)]
    pub dry_run: bool,

    /// Stop at the first file that cannot be organized
    #[arg(long)]
    pub fail_fast: bool,

    /// Configuration file (default: .file-arranger.toml, then ~/.config/file-arranger/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Action log file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Args {
    /// Turns parsed arguments into the immutable settings for one run.
    pub fn into_run_config(self) -> RunConfig {
        let directories = match self.dir {
            Some(dir) => vec![dir],
            None => default_directories(),
        };

        let mut config = RunConfig::new(directories)
            .with_backup(self.backup)
            .with_dry_run(self.dry_run)
            .with_fail_fast(self.fail_fast)
            .with_log_file(self.log_file);
        if let Some(types) = self.types {
            config = config.with_types(types);
        }
        config
    }
}

/// Desktop, Downloads, Music, Pictures and Videos under the home directory.
pub fn default_directories() -> Vec<PathBuf> {
    match dirs::home_dir() {
        Some(home) => DEFAULT_DIRECTORY_NAMES
            .iter()
            .map(|name| home.join(name))
            .collect(),
        None => {
            warn!("No home directory found; there are no default directories to scan");
            Vec::new()
        }
    }
}

/// A scanned file on its way through the pipeline.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// The full path to the file.
    pub path: PathBuf,
    /// The file name.
    pub name: String,
    /// Lowercase extension, empty when the file has none.
    pub extension: String,
    /// Creation time (modification time where creation is not recorded).
    pub created: DateTime<Local>,
}

impl FileEntry {
    pub fn from_path(path: &Path) -> OrganizeResult<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            extension: extension_of(path),
            created: date_partition::creation_time(path)?,
        })
    }
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Moved, or would be moved in dry-run mode.
    Relocated {
        category: String,
        relocation: Relocation,
    },
    /// Same content as `original`; left in place.
    Duplicate { path: PathBuf, original: PathBuf },
}

/// Totals for a whole run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Every move performed or simulated, in processing order.
    pub relocations: Vec<Relocation>,
    /// Files per destination category.
    pub categories: BTreeMap<String, usize>,
    /// `(duplicate, original)` pairs.
    pub duplicates: Vec<(PathBuf, PathBuf)>,
    /// Files skipped by the type filter or exclusion rules.
    pub filtered: usize,
    pub missing_directories: Vec<PathBuf>,
    pub backups: Vec<PathBuf>,
    /// Files or directories that could not be handled, with the reason.
    pub failures: Vec<(PathBuf, String)>,
}

impl RunSummary {
    fn record(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Relocated {
                category,
                relocation,
            } => {
                *self.categories.entry(category).or_insert(0) += 1;
                self.relocations.push(relocation);
            }
            FileOutcome::Duplicate { path, original } => {
                self.duplicates.push((path, original));
            }
        }
    }

    /// Number of files moved (or that would be moved in a dry run).
    pub fn relocated(&self) -> usize {
        self.relocations.len()
    }

    /// True when no file or directory failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// State of one run: the duplicate index and relocator live exactly as long
/// as the run does.
struct Driver<'a> {
    config: &'a RunConfig,
    classifier: &'a Classifier,
    filters: &'a CompiledFilters,
    index: FingerprintIndex,
    relocator: Relocator,
    log_file: Option<PathBuf>,
    summary: RunSummary,
}

/// Organizes every configured directory in order and returns the run summary.
///
/// A missing directory is logged and skipped. A file that cannot be handled
/// is logged and recorded in the summary, and the run moves on, unless
/// `fail_fast` is set, in which case its error is returned.
///
/// # Examples
///
/// ```no_run
/// use file_arranger::cli::run_cli;
/// use file_arranger::config::{CompiledFilters, RunConfig};
/// use file_arranger::file_category::Classifier;
/// use std::path::PathBuf;
///
/// let config = RunConfig::new(vec![PathBuf::from("/path/to/Downloads")]).with_dry_run(true);
/// let summary = run_cli(&config, &Classifier::default(), &CompiledFilters::default())
///     .expect("run failed");
/// println!("{} files would be moved", summary.relocated());
/// ```
pub fn run_cli(
    config: &RunConfig,
    classifier: &Classifier,
    filters: &CompiledFilters,
) -> OrganizeResult<RunSummary> {
    let mut driver = Driver::new(config, classifier, filters);

    for directory in &config.directories {
        if let Err(e) = driver.organize_directory(directory) {
            if config.fail_fast {
                return Err(e);
            }
            error!("Failed to organize directory '{}': {}", directory.display(), e);
            driver
                .summary
                .failures
                .push((directory.clone(), e.to_string()));
        }
    }

    Ok(driver.summary)
}

impl<'a> Driver<'a> {
    fn new(
        config: &'a RunConfig,
        classifier: &'a Classifier,
        filters: &'a CompiledFilters,
    ) -> Self {
        Self {
            config,
            classifier,
            filters,
            index: FingerprintIndex::new(),
            relocator: Relocator::new(config.dry_run),
            log_file: config
                .log_file
                .as_deref()
                .and_then(|p| fs::canonicalize(p).ok()),
            summary: RunSummary::default(),
        }
    }

    fn organize_directory(&mut self, directory: &Path) -> OrganizeResult<()> {
        if !directory.is_dir() {
            warn!("Directory not found: {}", directory.display());
            self.summary.missing_directories.push(directory.to_path_buf());
            return Ok(());
        }

        info!("Scanning directory: {}", directory.display());

        if self.config.writes_backup() {
            let archive = archiver::create_backup(directory)?;
            info!("Backup created at {}", archive.display());
            self.summary.backups.push(archive);
        }

        let scan = scan_directory(directory)?;
        self.record_unreadable(directory, scan.unreadable)?;

        for path in scan.files {
            if !self.should_process(&path) {
                self.summary.filtered += 1;
                continue;
            }

            match self.process_file(directory, &path) {
                Ok(outcome) => self.summary.record(outcome),
                Err(e) => {
                    error!("Failed to organize '{}': {}", path.display(), e);
                    if self.config.fail_fast {
                        return Err(e);
                    }
                    self.summary.failures.push((path, e.to_string()));
                }
            }
        }

        Ok(())
    }

    /// Logs every entry the listing could not read and records it as a failure.
    fn record_unreadable(
        &mut self,
        directory: &Path,
        unreadable: Vec<(PathBuf, io::Error)>,
    ) -> OrganizeResult<()> {
        for (path, source) in unreadable {
            let e = OrganizeError::EntryReadFailed {
                path: path.clone(),
                source,
            };
            error!("Failed to scan '{}': {}", directory.display(), e);
            if self.config.fail_fast {
                return Err(e);
            }
            self.summary.failures.push((path, e.to_string()));
        }
        Ok(())
    }

    /// Applies the exclusion rules and the `--types` filter.
    fn should_process(&self, path: &Path) -> bool {
        if self.is_log_file(path) {
            return false;
        }
        self.filters.should_include(path) && self.config.accepts_type(&extension_of(path))
    }

    fn is_log_file(&self, path: &Path) -> bool {
        let Some(log_file) = &self.log_file else {
            return false;
        };
        path.file_name() == log_file.file_name()
            && fs::canonicalize(path).is_ok_and(|p| &p == log_file)
    }

    /// Classify, partition, deduplicate, relocate.
    fn process_file(&mut self, directory: &Path, path: &Path) -> OrganizeResult<FileOutcome> {
        let entry = FileEntry::from_path(path)?;

        let category = self.classifier.classify(&entry.extension).to_string();
        let category_dir = directory.join(&category);

        let dated_dir = if self.config.dry_run {
            date_partition::partition_for(&category_dir, &entry.created)
        } else {
            fs::create_dir_all(&category_dir).map_err(|source| {
                OrganizeError::DirectoryCreationFailed {
                    path: category_dir.clone(),
                    source,
                }
            })?;
            date_partition::ensure_partition(&category_dir, &entry.created)?
        };

        match self.index.check(&entry.path)? {
            DuplicateCheck::Duplicate { original } => {
                info!(
                    "Duplicate file detected: '{}' already exists as '{}'",
                    entry.name,
                    original.display()
                );
                return Ok(FileOutcome::Duplicate {
                    path: entry.path,
                    original,
                });
            }
            DuplicateCheck::Unique(_) => {}
        }

        let relocation = self.relocator.relocate(&entry.path, &dated_dir)?;

        if relocation.simulated {
            info!(
                "DRY RUN: Would move '{}' to '{}'",
                relocation.source.display(),
                relocation.destination.display()
            );
        } else {
            info!(
                "Moved '{}' to '{}'",
                relocation.source.display(),
                relocation.destination.display()
            );
        }

        Ok(FileOutcome::Relocated {
            category,
            relocation,
        })
    }
}

/// Result of listing one directory.
#[derive(Debug, Default)]
pub struct DirectoryScan {
    /// Regular files directly inside the directory, sorted by name.
    pub files: Vec<PathBuf>,
    /// Entries that could not be read. When the listing itself fails
    /// part-way, the path is the directory.
    pub unreadable: Vec<(PathBuf, io::Error)>,
}

/// Lists the regular files directly inside `directory`.
///
/// Subdirectories (including earlier category folders) and symlinks are skipped.
pub fn scan_directory(directory: &Path) -> OrganizeResult<DirectoryScan> {
    let entries = fs::read_dir(directory).map_err(|source| OrganizeError::DirectoryReadFailed {
        path: directory.to_path_buf(),
        source,
    })?;

    Ok(collect_entries(
        directory,
        entries.map(|entry| entry.map(|entry| (entry.path(), entry.file_type()))),
    ))
}

fn collect_entries<I>(directory: &Path, entries: I) -> DirectoryScan
where
    I: IntoIterator<Item = io::Result<(PathBuf, io::Result<fs::FileType>)>>,
{
    let mut scan = DirectoryScan::default();
    for entry in entries {
        match entry {
            Ok((path, Ok(file_type))) => {
                if file_type.is_file() {
                    scan.files.push(path);
                }
            }
            Ok((path, Err(e))) => scan.unreadable.push((path, e)),
            Err(e) => scan.unreadable.push((directory.to_path_buf(), e)),
        }
    }
    scan.files.sort();
    scan
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["file-arranger"]).unwrap();
        assert!(args.dir.is_none());
        assert!(args.types.is_none());
        assert!(!args.backup);
        assert!(!args.dry_run);
        assert!(!args.fail_fast);
    }

    #[test]
    fn test_args_all_flags() {
        let args = Args::try_parse_from([
            "file-arranger",
            "--dir",
            "/tmp/in",
            "--types",
            "TXT",
            "jpg",
            "--backup",
            "--dry-run",
            "--fail-fast",
        ])
        .unwrap();

        let config = args.into_run_config();
        assert_eq!(config.directories, vec![PathBuf::from("/tmp/in")]);
        assert!(config.accepts_type("txt"));
        assert!(config.accepts_type("jpg"));
        assert!(!config.accepts_type("pdf"));
        assert!(config.backup);
        assert!(config.dry_run);
        assert!(config.fail_fast);
        assert!(!config.writes_backup());
    }

    #[test]
    fn test_types_requires_a_value() {
        assert!(Args::try_parse_from(["file-arranger", "--types"]).is_err());
    }

    #[test]
    fn test_default_directories_are_under_home() {
        let dirs = default_directories();
        if let Some(home) = dirs::home_dir() {
            assert_eq!(dirs.len(), DEFAULT_DIRECTORY_NAMES.len());
            assert!(dirs.iter().all(|d| d.starts_with(&home)));
            assert!(dirs[1].ends_with("Downloads"));
        }
    }

    #[test]
    fn test_scan_directory_lists_sorted_files_only() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        fs::write(base.join("b.txt"), "b").unwrap();
        fs::write(base.join("a.txt"), "a").unwrap();
        fs::create_dir(base.join("Documents")).unwrap();

        let scan = scan_directory(base).unwrap();
        assert_eq!(scan.files, vec![base.join("a.txt"), base.join("b.txt")]);
        assert!(scan.unreadable.is_empty());
    }

    #[test]
    fn test_collect_entries_keeps_unreadable_entries() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        fs::write(base.join("a.txt"), "a").unwrap();
        let file_type = fs::metadata(base.join("a.txt")).unwrap().file_type();
        let dir_type = fs::metadata(base).unwrap().file_type();
        let locked = base.join("locked");

        let scan = collect_entries(
            base,
            vec![
                Ok((base.join("b.txt"), Ok(file_type))),
                Ok((
                    locked.clone(),
                    Err(io::Error::from(io::ErrorKind::PermissionDenied)),
                )),
                Err(io::Error::from(io::ErrorKind::Other)),
                Ok((base.join("Documents"), Ok(dir_type))),
                Ok((base.join("a.txt"), Ok(file_type))),
            ],
        );

        assert_eq!(scan.files, vec![base.join("a.txt"), base.join("b.txt")]);
        let unreadable: Vec<&Path> = scan.unreadable.iter().map(|(p, _)| p.as_path()).collect();
        assert_eq!(unreadable, vec![locked.as_path(), base]);
    }

    #[test]
    fn test_unreadable_entries_are_recorded_as_failures() {
        let config = RunConfig::new(vec![PathBuf::from("/d")]);
        let classifier = Classifier::default();
        let filters = CompiledFilters::default();
        let mut driver = Driver::new(&config, &classifier, &filters);

        driver
            .record_unreadable(
                Path::new("/d"),
                vec![(
                    PathBuf::from("/d/locked"),
                    io::Error::from(io::ErrorKind::PermissionDenied),
                )],
            )
            .unwrap();

        assert_eq!(driver.summary.failures.len(), 1);
        assert_eq!(driver.summary.failures[0].0, PathBuf::from("/d/locked"));
        assert!(!driver.summary.is_success());
    }

    #[test]
    fn test_unreadable_entry_aborts_with_fail_fast() {
        let config = RunConfig::new(vec![PathBuf::from("/d")]).with_fail_fast(true);
        let classifier = Classifier::default();
        let filters = CompiledFilters::default();
        let mut driver = Driver::new(&config, &classifier, &filters);

        let result = driver.record_unreadable(
            Path::new("/d"),
            vec![(
                PathBuf::from("/d/locked"),
                io::Error::from(io::ErrorKind::PermissionDenied),
            )],
        );

        assert!(matches!(result, Err(OrganizeError::EntryReadFailed { .. })));
        assert!(driver.summary.failures.is_empty());
    }

    #[test]
    fn test_file_entry_from_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("Photo.JPG");
        fs::write(&path, "x").unwrap();

        let entry = FileEntry::from_path(&path).unwrap();
        assert_eq!(entry.name, "Photo.JPG");
        assert_eq!(entry.extension, "jpg");
    }

    #[test]
    fn test_summary_records_outcomes() {
        let mut summary = RunSummary::default();
        summary.record(FileOutcome::Relocated {
            category: "Images".to_string(),
            relocation: Relocation {
                source: PathBuf::from("/d/a.png"),
                destination: PathBuf::from("/d/Images/2024-10/a.png"),
                simulated: false,
            },
        });
        summary.record(FileOutcome::Duplicate {
            path: PathBuf::from("/d/b.png"),
            original: PathBuf::from("/d/a.png"),
        });

        assert_eq!(summary.relocated(), 1);
        assert_eq!(summary.categories.get("Images"), Some(&1));
        assert_eq!(summary.duplicates.len(), 1);
        assert!(summary.is_success());
    }

    #[test]
    fn test_log_file_is_never_processed() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        let log = base.join("file_organizer.log");
        fs::write(&log, "log line").unwrap();
        fs::write(base.join("a.txt"), "a").unwrap();

        let config = RunConfig::new(vec![base.to_path_buf()]).with_log_file(Some(log.clone()));
        let summary =
            run_cli(&config, &Classifier::default(), &CompiledFilters::default()).unwrap();

        assert!(log.exists());
        assert_eq!(summary.relocated(), 1);
        assert_eq!(summary.filtered, 1);
    }
}

//! file-arranger - organize cluttered directories
//!
//! This library classifies files by extension, detects byte-identical
//! duplicates within a run, and moves files into `<Category>/<YYYY-MM>`
//! subdirectories, optionally after writing a backup archive. Every decision
//! can be simulated with a dry run.

pub mod archiver;
pub mod cli;
pub mod config;
pub mod date_partition;
pub mod file_category;
pub mod fingerprint;
pub mod logging;
pub mod output;
pub mod relocator;

pub use config::{AppConfig, CompiledFilters, ConfigError, RunConfig};
pub use file_category::{CategoryTable, Classifier};
pub use fingerprint::{DuplicateCheck, FingerprintIndex};
pub use relocator::{OrganizeError, Relocation, Relocator};

pub use cli::{Args, RunSummary, run_cli};

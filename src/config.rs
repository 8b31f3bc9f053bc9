//! Configuration: the optional TOML file and the per-run settings.
//!
//! The TOML file extends the built-in category table and adds exclusion
//! rules applied while scanning:
//!
//! ```toml
//! [categories]
//! fallback = "Others"
//!
//! [categories.extensions]
//! heic = "Images"
//! md = "Documents"
//!
//! [filters]
//! enable_hidden_files = true
//!
//! [filters.exclude]
//! filenames = [".DS_Store", "Thumbs.db"]
//! patterns = ["*.tmp"]
//! extensions = ["part", "crdownload"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//! ```

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::file_category::{CategoryTable, DEFAULT_FALLBACK, normalize_extension};

/// Name of the configuration file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = ".file-arranger.toml";

/// Errors that can occur during configuration loading and filtering.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    #[error("Invalid glob pattern '{0}': expected *.ext or dir/**")]
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided with the actual error reason.
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },
    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    IoError(#[from] std::io::Error),
}

/// Contents of the configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub categories: CategoryRules,
    #[serde(default)]
    pub filters: FilterRules,
}

/// Additions to the built-in category table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRules {
    /// Category for extensions not found in the table.
    #[serde(default = "default_fallback")]
    pub fallback: String,

    /// Extension → category entries merged over the built-in table.
    #[serde(default)]
    pub extensions: BTreeMap<String, String>,
}

fn default_fallback() -> String {
    DEFAULT_FALLBACK.to_string()
}

impl Default for CategoryRules {
    fn default() -> Self {
        Self {
            fallback: default_fallback(),
            extensions: BTreeMap::new(),
        }
    }
}

/// Root-level filter rules configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether to include hidden files (starting with "."). Defaults to true.
    #[serde(default = "default_enable_hidden_files")]
    pub enable_hidden_files: bool,

    /// Rules for excluding files.
    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Rules for including files (whitelist, overrides exclude rules).
    #[serde(default)]
    pub include: IncludeRules,
}

fn default_enable_hidden_files() -> bool {
    true
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            enable_hidden_files: default_enable_hidden_files(),
            exclude: ExcludeRules::default(),
            include: IncludeRules::default(),
        }
    }
}

/// Rules for excluding files from organization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g., ".DS_Store", "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns to exclude (e.g., "*.tmp").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// File extensions to exclude (e.g., "part", "crdownload").
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

/// Rules for including files, overriding exclude rules (whitelist).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    /// Glob patterns that override exclude rules.
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl AppConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.file-arranger.toml` in the current directory
    /// 3. Look for `~/.config/file-arranger/config.toml`
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read,
    /// or if any discovered file is malformed.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Some(home) = dirs::home_dir() {
            let home_config = home
                .join(".config")
                .join("file-arranger")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parses configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Builds the category table: built-in entries overlaid with the configured ones.
    pub fn category_table(&self) -> CategoryTable {
        let mut table = CategoryTable::standard();
        table.set_fallback(&self.categories.fallback);
        for (ext, category) in &self.categories.extensions {
            table.insert(ext, category);
        }
        table
    }

    /// Compile the filter rules into matchers.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob patterns are invalid.
    pub fn compile_filters(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(&self.filters)
    }
}

/// Filter rules with patterns compiled once up front.
#[derive(Debug)]
pub struct CompiledFilters {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl Default for CompiledFilters {
    fn default() -> Self {
        Self {
            enable_hidden_files: true,
            exclude_filenames: HashSet::new(),
            exclude_extensions: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
            include_patterns: Vec::new(),
        }
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
        })
        .collect()
}

impl CompiledFilters {
    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = compile_globs(&rules.exclude.patterns)?;
        let include_patterns = compile_globs(&rules.include.patterns)?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| normalize_extension(ext))
                .collect(),
            exclude_patterns,
            exclude_regexes,
            include_patterns,
        })
    }

    /// Check if a file should be organized (not excluded).
    ///
    /// Checks are performed in this order, with early termination:
    /// 1. Include patterns (whitelist) - if matched, always include
    /// 2. Hidden file filter - if hidden and disabled, exclude
    /// 3. Exact filename match - if matched, exclude
    /// 4. File extension match - if matched, exclude
    /// 5. Glob pattern match - if matched, exclude
    /// 6. Regex pattern match - if matched, exclude
    /// 7. Default: include
    pub fn should_include(&self, file_path: &Path) -> bool {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self.matches_any(&self.include_patterns, file_path) {
            return true;
        }

        if !self.enable_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = file_path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext_lower) {
                return false;
            }
        }

        if self.matches_any(&self.exclude_patterns, file_path) {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
    }

    /// Glob patterns are tried against the full path and the bare file name,
    /// so `*.tmp` works for absolute paths too.
    fn matches_any(&self, patterns: &[Pattern], file_path: &Path) -> bool {
        let file_name = file_path.file_name().map(Path::new);
        patterns.iter().any(|pattern| {
            pattern.matches_path(file_path) || file_name.is_some_and(|n| pattern.matches_path(n))
        })
    }
}

/// Settings for one run, fixed once the command line is parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunConfig {
    /// Directories to organize, in order.
    pub directories: Vec<PathBuf>,
    /// Lowercase extensions to restrict processing to. `None` processes everything.
    pub types: Option<HashSet<String>>,
    /// Write a backup archive before organizing each directory.
    pub backup: bool,
    /// Decide and log everything but leave the filesystem untouched.
    pub dry_run: bool,
    /// Abort the run on the first per-file failure instead of continuing.
    pub fail_fast: bool,
    /// The action log, which is never moved even if it sits in a scanned directory.
    pub log_file: Option<PathBuf>,
}

impl RunConfig {
    pub fn new(directories: Vec<PathBuf>) -> Self {
        Self {
            directories,
            ..Self::default()
        }
    }

    /// Sets the type filter, normalizing each entry to a lowercase extension
    /// without a leading dot.
    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.types = Some(
            types
                .into_iter()
                .map(|t| normalize_extension(t.as_ref()))
                .collect(),
        );
        self
    }

    pub fn with_backup(mut self, backup: bool) -> Self {
        self.backup = backup;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn with_log_file(mut self, log_file: Option<PathBuf>) -> Self {
        self.log_file = log_file;
        self
    }

    /// True when the type filter admits `ext` (already lowercase).
    pub fn accepts_type(&self, ext: &str) -> bool {
        self.types.as_ref().is_none_or(|types| types.contains(ext))
    }

    /// True when a backup should actually be written. Dry runs never write one.
    pub fn writes_backup(&self) -> bool {
        self.backup && !self.dry_run
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters(rules: FilterRules) -> CompiledFilters {
        CompiledFilters::new(&rules).unwrap()
    }

    #[test]
    fn test_default_config_includes_hidden_files() {
        let config = AppConfig::default();
        assert!(config.filters.enable_hidden_files);
        let compiled = config.compile_filters().unwrap();
        assert!(compiled.should_include(Path::new(".bashrc")));
    }

    #[test]
    fn test_hidden_file_excluded_when_disabled() {
        let compiled = filters(FilterRules {
            enable_hidden_files: false,
            ..Default::default()
        });

        assert!(!compiled.should_include(Path::new(".DS_Store")));
        assert!(compiled.should_include(Path::new("visible.txt")));
    }

    #[test]
    fn test_exclude_exact_filename() {
        let compiled = filters(FilterRules {
            exclude: ExcludeRules {
                filenames: vec!["Thumbs.db".to_string(), ".DS_Store".to_string()],
                ..Default::default()
            },
            ..Default::default()
        });

        assert!(!compiled.should_include(Path::new("/home/u/Downloads/Thumbs.db")));
        assert!(compiled.should_include(Path::new("image.jpg")));
    }

    #[test]
    fn test_exclude_extensions() {
        let compiled = filters(FilterRules {
            exclude: ExcludeRules {
                extensions: vec!["part".to_string(), ".TMP".to_string()],
                ..Default::default()
            },
            ..Default::default()
        });

        assert!(!compiled.should_include(Path::new("movie.part")));
        assert!(!compiled.should_include(Path::new("file.tmp")));
        assert!(!compiled.should_include(Path::new("file.PART")));
        assert!(compiled.should_include(Path::new("file.txt")));
    }

    #[test]
    fn test_exclude_glob_matches_file_name_of_absolute_path() {
        let compiled = filters(FilterRules {
            exclude: ExcludeRules {
                patterns: vec!["*.cache".to_string(), "[0-9]*.log".to_string()],
                ..Default::default()
            },
            ..Default::default()
        });

        assert!(!compiled.should_include(Path::new("/data/file.cache")));
        assert!(!compiled.should_include(Path::new("/data/1run.log")));
        assert!(compiled.should_include(Path::new("/data/run.log")));
        assert!(compiled.should_include(Path::new("/data/file.txt")));
    }

    #[test]
    fn test_include_overrides_exclude() {
        let compiled = filters(FilterRules {
            enable_hidden_files: false,
            exclude: ExcludeRules {
                extensions: vec!["tmp".to_string()],
                ..Default::default()
            },
            include: IncludeRules {
                patterns: vec![".important".to_string(), "keep.tmp".to_string()],
            },
        });

        assert!(compiled.should_include(Path::new(".important")));
        assert!(compiled.should_include(Path::new("/x/keep.tmp")));
        assert!(!compiled.should_include(Path::new(".other")));
        assert!(!compiled.should_include(Path::new("drop.tmp")));
    }

    #[test]
    fn test_exclude_regex() {
        let compiled = filters(FilterRules {
            exclude: ExcludeRules {
                regex: vec![r"^test_.*\.txt$".to_string()],
                ..Default::default()
            },
            ..Default::default()
        });

        assert!(!compiled.should_include(Path::new("test_file.txt")));
        assert!(compiled.should_include(Path::new("file.txt")));
    }

    #[test]
    fn test_invalid_patterns_return_error() {
        let bad_regex = FilterRules {
            exclude: ExcludeRules {
                regex: vec!["[invalid(".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            CompiledFilters::new(&bad_regex),
            Err(ConfigError::InvalidRegexPattern { .. })
        ));

        let bad_glob = FilterRules {
            exclude: ExcludeRules {
                patterns: vec!["[invalid".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            CompiledFilters::new(&bad_glob),
            Err(ConfigError::InvalidGlobPattern(_))
        ));
    }

    #[test]
    fn test_parse_categories_and_filters() {
        let config = AppConfig::parse(
            r#"
            [categories]
            fallback = "Misc"

            [categories.extensions]
            HEIC = "Images"
            txt = "Notes"

            [filters]
            enable_hidden_files = false

            [filters.exclude]
            extensions = ["part"]
            "#,
        )
        .unwrap();

        let table = config.category_table();
        assert_eq!(table.get("heic"), Some("Images"));
        assert_eq!(table.get("txt"), Some("Notes"));
        assert_eq!(table.get("pdf"), Some("Documents"));
        assert_eq!(table.fallback(), "Misc");

        let compiled = config.compile_filters().unwrap();
        assert!(!compiled.should_include(Path::new("a.part")));
        assert!(!compiled.should_include(Path::new(".hidden")));
    }

    #[test]
    fn test_parse_empty_uses_defaults() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config.categories.fallback, "Others");
        assert_eq!(config.category_table(), CategoryTable::standard());
    }

    #[test]
    fn test_parse_invalid_toml() {
        assert!(matches!(
            AppConfig::parse("[categories\nbroken"),
            Err(ConfigError::ConfigInvalid(_))
        ));
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let result = AppConfig::load(Some(Path::new("/non/existent/config.toml")));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }

    #[test]
    fn test_run_config_types_are_normalized() {
        let config = RunConfig::new(vec![]).with_types(["TXT", ".jpg"]);

        assert!(config.accepts_type("txt"));
        assert!(config.accepts_type("jpg"));
        assert!(!config.accepts_type("pdf"));
        assert!(RunConfig::new(vec![]).accepts_type("anything"));
    }

    #[test]
    fn test_dry_run_never_writes_backup() {
        let config = RunConfig::new(vec![]).with_backup(true);
        assert!(config.writes_backup());
        assert!(!config.with_dry_run(true).writes_backup());
    }
}

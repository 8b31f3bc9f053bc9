/// File categorization by extension.
///
/// This module maps lowercase file extensions to category names
/// (e.g. "pdf" → "Documents"). Extensions missing from the table fall back
/// to a catch-all category, so every file gets a category.
///
/// # Examples
///
/// ```
/// use file_arranger::file_category::Classifier;
///
/// let classifier = Classifier::default();
/// assert_eq!(classifier.classify("pdf"), "Documents");
/// assert_eq!(classifier.classify("JPG"), "Images");
/// assert_eq!(classifier.classify("unknown"), "Others");
/// ```
use std::collections::HashMap;
use std::path::Path;

/// Category used when an extension is not in the table.
pub const DEFAULT_FALLBACK: &str = "Others";

/// A fixed mapping from lowercase extension to category name.
///
/// Built once before a run and never mutated while files are processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTable {
    extensions: HashMap<String, String>,
    fallback: String,
}

impl CategoryTable {
    /// Creates an empty table that sends every extension to `fallback`.
    pub fn empty(fallback: &str) -> Self {
        Self {
            extensions: HashMap::new(),
            fallback: fallback.to_string(),
        }
    }

    /// Creates the built-in table.
    pub fn standard() -> Self {
        let mut table = Self::empty(DEFAULT_FALLBACK);

        table.insert("txt", "Documents");
        table.insert("pdf", "Documents");
        table.insert("docx", "Documents");

        table.insert("jpeg", "Images");
        table.insert("jpg", "Images");
        table.insert("png", "Images");

        table.insert("mp3", "Music");
        table.insert("wav", "Music");

        table.insert("mp4", "Videos");
        table.insert("mov", "Videos");

        table.insert("zip", "Archives");
        table.insert("rar", "Archives");

        table.insert("py", "Code");
        table.insert("exe", "Programs");

        table
    }

    /// Adds or replaces the category for an extension.
    ///
    /// A leading dot is ignored, so ".PNG" and "png" name the same key.
    pub fn insert(&mut self, ext: &str, category: &str) {
        self.extensions
            .insert(normalize_extension(ext), category.to_string());
    }

    /// Replaces the fallback category.
    pub fn set_fallback(&mut self, fallback: &str) {
        self.fallback = fallback.to_string();
    }

    /// Returns the fallback category.
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Looks up an extension without applying the fallback.
    pub fn get(&self, ext: &str) -> Option<&str> {
        self.extensions
            .get(&normalize_extension(ext))
            .map(String::as_str)
    }

    /// Number of explicit extension mappings.
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Resolves category names for extensions using an injected [`CategoryTable`].
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    table: CategoryTable,
}

impl Classifier {
    pub fn new(table: CategoryTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &CategoryTable {
        &self.table
    }

    /// Returns the category for `ext`, or the fallback category.
    ///
    /// Comparison is case-insensitive. The empty extension always yields
    /// the fallback.
    ///
    /// # Examples
    ///
    /// ```
    /// use file_arranger::file_category::{CategoryTable, Classifier};
    ///
    /// let mut table = CategoryTable::empty("Misc");
    /// table.insert("log", "Logs");
    /// let classifier = Classifier::new(table);
    /// assert_eq!(classifier.classify("LOG"), "Logs");
    /// assert_eq!(classifier.classify(""), "Misc");
    /// ```
    pub fn classify(&self, ext: &str) -> &str {
        self.table.get(ext).unwrap_or(self.table.fallback())
    }

    /// Classifies a path by its extension.
    pub fn classify_path(&self, path: &Path) -> &str {
        self.classify(&extension_of(path))
    }
}

/// Lowercases an extension and strips a single leading dot.
pub fn normalize_extension(ext: &str) -> String {
    ext.strip_prefix('.').unwrap_or(ext).to_lowercase()
}

/// Returns the lowercase extension of a path, or an empty string if it has none.
///
/// Dot-files such as `.bashrc` have no extension.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

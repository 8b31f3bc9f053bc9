//! End-of-run summary printed to the console.

use colored::*;
use std::collections::BTreeMap;

use crate::cli::RunSummary;

/// Prints the run summary with consistent styling.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a table of file counts by category.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use file_arranger::output::OutputFormatter;
    /// use std::collections::BTreeMap;
    ///
    /// let mut counts = BTreeMap::new();
    /// counts.insert("Documents".to_string(), 15);
    /// counts.insert("Images".to_string(), 8);
    /// OutputFormatter::category_table(&counts, 23);
    /// ```
    pub fn category_table(category_counts: &BTreeMap<String, usize>, total_files: usize) {
        let width = category_counts
            .keys()
            .map(String::len)
            .max()
            .unwrap_or(0)
            .max("Category".len());

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Files".bold(),
            width = width
        );
        println!("{}", "-".repeat(width + 10));

        for (category, count) in category_counts {
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                plural(*count),
                width = width
            );
        }

        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            plural(total_files),
            width = width
        );
    }

    /// Prints everything a run did, or would have done in dry-run mode.
    pub fn summary(summary: &RunSummary, dry_run: bool) {
        if dry_run {
            Self::header("DRY RUN SUMMARY");
        } else {
            Self::header("SUMMARY");
        }

        Self::category_table(&summary.categories, summary.relocated());

        if !summary.duplicates.is_empty() {
            println!(
                "{} {} left in place",
                summary.duplicates.len().to_string().yellow(),
                if summary.duplicates.len() == 1 {
                    "duplicate"
                } else {
                    "duplicates"
                }
            );
        }
        if summary.filtered > 0 {
            println!("{} {} skipped by filters", summary.filtered, plural(summary.filtered));
        }
        for dir in &summary.missing_directories {
            println!("{} Directory not found: {}", "⚠".yellow(), dir.display());
        }
        for backup in &summary.backups {
            println!("{} Backup: {}", "✓".green(), backup.display());
        }

        if summary.failures.is_empty() {
            if dry_run {
                println!("\n{}", "✓ Dry run complete. No files were modified.".yellow());
            }
        } else {
            eprintln!(
                "\n{} {} could not be organized:",
                "✗".red(),
                summary.failures.len()
            );
            for (path, reason) in &summary.failures {
                eprintln!("  - {}: {}", path.display(), reason);
            }
        }
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural() {
        assert_eq!(plural(0), "files");
        assert_eq!(plural(1), "file");
        assert_eq!(plural(2), "files");
    }
}

//! Terminal output: colored status lines, progress bars and summaries.
//!
//! Everything user-facing goes through [`OutputFormatter`]; diagnostics go
//! through `tracing` instead.

use crate::file_category::Category;
use crate::organizer::{Operation, OrganizePlan};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::Path;

/// Consistently styled CLI output.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a green check line.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use filebutler::output::OutputFormatter;
    /// OutputFormatter::success("invoice.pdf organized");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints a red cross line to stderr.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints an aligned `label: value` line.
    pub fn field(label: &str, value: &str) {
        println!("  {:<18} {}", format!("{}:", label).bold(), value);
    }

    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Describes a planned move.
    pub fn plan(plan: &OrganizePlan, base: &Path) {
        let name = plan
            .source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let destination = plan
            .destination
            .strip_prefix(base)
            .unwrap_or(&plan.destination);

        println!(" - {} ({})", name, plan.mime_type.dimmed());
        println!("   → {}", destination.display().to_string().cyan());
    }

    /// Describes a completed move.
    pub fn operation(operation: &Operation) {
        Self::success(&format!(
            "{} → {}",
            operation.original_path.display(),
            operation.new_path.display()
        ));
    }

    /// Creates a progress bar for `total` files.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use filebutler::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(3);
    /// pb.inc(1);
    /// pb.finish_with_message("done");
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        pb
    }

    /// Prints per-category file counts followed by a total.
    pub fn summary_table(category_counts: &BTreeMap<Category, usize>) {
        Self::header("SUMMARY");

        let width = category_counts
            .keys()
            .map(|c| c.dir_name().len())
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
                category.dir_name(),
                count.to_string().green(),
                file_word(*count),
                width = width
            );
        }

        let total: usize = category_counts.values().sum();
        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total.to_string().green().bold(),
            file_word(total),
            width = width
        );
    }
}

fn file_word(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}

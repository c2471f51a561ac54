//! Organized destination paths.
//!
//! A destination is built from fixed-order segments:
//! `base_dir / category / [year / month] / [subcategories…] / [filename]`.

use crate::clock::{Clock, SystemClock};
use chrono::Datelike;
use std::fmt;
use std::path::{Path, PathBuf};

/// An organized destination, kept as its ordered segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizedPath {
    segments: Vec<String>,
}

impl OrganizedPath {
    /// The ordered path segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Joins the segments into a filesystem path.
    pub fn to_path_buf(&self) -> PathBuf {
        self.segments.iter().collect()
    }
}

impl fmt::Display for OrganizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_path_buf().display())
    }
}

impl From<OrganizedPath> for PathBuf {
    fn from(path: OrganizedPath) -> Self {
        path.to_path_buf()
    }
}

/// Builds an organized path using the system clock.
///
/// See [`build_organized_path_with_clock`].
pub fn build_organized_path<S: AsRef<str>>(
    base_dir: &Path,
    category: &str,
    subcategories: &[S],
    filename: Option<&str>,
    date_based: bool,
) -> OrganizedPath {
    build_organized_path_with_clock(
        base_dir,
        category,
        subcategories,
        filename,
        date_based,
        &SystemClock,
    )
}

/// Builds an organized destination path.
///
/// When `date_based` is set, the clock's year and full month name are inserted
/// right after the category. Subcategories follow in the given order, and the
/// filename, if any, is always last. Empty subcategories and an empty
/// filename are left out.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use filebutler::clock::FixedClock;
/// use filebutler::paths::build_organized_path_with_clock;
/// use std::path::Path;
///
/// let clock = FixedClock::from_date(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
/// let path = build_organized_path_with_clock(
///     Path::new("Documents"),
///     "Invoices",
///     &["Amazon"],
///     Some("x.pdf"),
///     true,
///     &clock,
/// );
/// assert_eq!(path.segments(), ["Documents", "Invoices", "2024", "March", "Amazon", "x.pdf"]);
/// ```
pub fn build_organized_path_with_clock<S: AsRef<str>>(
    base_dir: &Path,
    category: &str,
    subcategories: &[S],
    filename: Option<&str>,
    date_based: bool,
    clock: &dyn Clock,
) -> OrganizedPath {
    let mut segments = vec![
        base_dir.to_string_lossy().into_owned(),
        category.to_string(),
    ];

    if date_based {
        let now = clock.now();
        segments.push(now.year().to_string());
        segments.push(now.format("%B").to_string());
    }

    segments.extend(
        subcategories
            .iter()
            .map(|s| s.as_ref())
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    );

    if let Some(filename) = filename.filter(|f| !f.is_empty()) {
        segments.push(filename.to_string());
    }

    OrganizedPath { segments }
}

/// Formats a human-readable folder path such as `Invoices/Amazon/2024/March`.
///
/// The month is capitalized; absent parts are skipped.
pub fn format_folder_path(
    category: &str,
    subcategory: Option<&str>,
    year: Option<i32>,
    month: Option<&str>,
) -> String {
    let mut parts = vec![category.to_string()];

    if let Some(subcategory) = subcategory.filter(|s| !s.is_empty()) {
        parts.push(subcategory.to_string());
    }

    if let Some(year) = year.filter(|y| *y != 0) {
        parts.push(year.to_string());
    }

    if let Some(month) = month.filter(|m| !m.is_empty()) {
        let mut chars = month.chars();
        if let Some(first) = chars.next() {
            let mut capitalized: String = first.to_uppercase().collect();
            capitalized.push_str(&chars.as_str().to_lowercase());
            parts.push(capitalized);
        }
    }

    parts.join("/")
}

//! Filename normalization.
//!
//! Turns an arbitrary, possibly messy filename into a canonical form: a
//! lowercase ASCII base made of `[a-z0-9_-]` followed by the original
//! extension, lowercased.
//!
//! # Examples
//!
//! ```
//! use filebutler::normalize::clean_filename;
//!
//! assert_eq!(
//!     clean_filename("invoice__FINAL_v2 (1) - Copy.pdf", true, Some(100)),
//!     "invoice_v2.pdf"
//! );
//! assert_eq!(clean_filename("", true, Some(100)), "unnamed");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Base name used when cleaning leaves nothing behind.
pub const UNNAMED: &str = "unnamed";

/// Default maximum length of the cleaned base name.
pub const DEFAULT_MAX_LENGTH: usize = 100;

static RE_COPY_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(\d+\)\s*").expect("Invalid regex"));

static RE_DASH_COPY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*-\s*copy\s*").expect("Invalid regex"));

static RE_COPY_OF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*copy\s*of\s*").expect("Invalid regex"));

static RE_UNDERSCORES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_+").expect("Invalid regex"));

static RE_HYPHENS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").expect("Invalid regex"));

static RE_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid regex"));

static RE_FINAL_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"final_(v\d+)").expect("Invalid regex"));

static RE_DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_\-]").expect("Invalid regex"));

/// Options controlling [`clean_filename`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeOptions {
    /// Convert spaces to underscores (`true`) or drop them (`false`).
    #[serde(default = "default_keep_spaces")]
    pub keep_spaces: bool,

    /// Maximum length of the base name. `None` or `Some(0)` disables truncation.
    #[serde(default = "default_max_length")]
    pub max_length: Option<usize>,
}

fn default_keep_spaces() -> bool {
    true
}

fn default_max_length() -> Option<usize> {
    Some(DEFAULT_MAX_LENGTH)
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            keep_spaces: default_keep_spaces(),
            max_length: default_max_length(),
        }
    }
}

impl NormalizeOptions {
    /// Cleans `filename` with these options.
    pub fn clean(&self, filename: &str) -> String {
        clean_filename(filename, self.keep_spaces, self.max_length)
    }
}

/// Cleans a messy filename into a canonical, safe form.
///
/// The extension (everything after the last `.`) is kept and lowercased.
/// The base name is decomposed and stripped of non-ASCII characters,
/// lowercased, and rid of copy markers such as `(1)`, `- Copy` and
/// `Copy of`. Redundant `final_` prefixes before a version token are
/// dropped, separators are collapsed, and anything outside `[a-z0-9_-]`
/// is removed. An empty result becomes [`UNNAMED`].
///
/// This function never fails and is idempotent.
///
/// # Arguments
///
/// * `filename` - The raw filename, with or without an extension
/// * `keep_spaces` - Convert spaces to `_` when true, remove them otherwise
/// * `max_length` - Upper bound on the base name length
pub fn clean_filename(filename: &str, keep_spaces: bool, max_length: Option<usize>) -> String {
    let (name, extension) = split_extension(filename);

    let ascii: String = name.nfkd().filter(char::is_ascii).collect();

    // Dropping characters can expose new runs or markers; clean to a fixpoint.
    let mut base = clean_pass(&ascii, keep_spaces);
    loop {
        let next = clean_pass(&base, keep_spaces);
        if next == base {
            break;
        }
        base = next;
    }

    if base.is_empty() {
        base = UNNAMED.to_string();
    }

    if let Some(max) = max_length
        && max > 0
        && base.len() > max
    {
        base.truncate(max);
        let trimmed_len = base.trim_end_matches(['_', '-']).len();
        base.truncate(trimmed_len);
    }

    base + &extension
}

/// Splits at the last `.`, returning the base and the lowercased extension
/// including its dot. Without a dot the extension is empty.
fn split_extension(filename: &str) -> (&str, String) {
    match filename.rsplit_once('.') {
        Some((name, ext)) => (name, format!(".{}", ext.to_lowercase())),
        None => (filename, String::new()),
    }
}

fn clean_pass(name: &str, keep_spaces: bool) -> String {
    let mut name = name.to_lowercase();

    name = RE_COPY_NUMBER.replace_all(&name, "").into_owned();
    name = RE_DASH_COPY.replace_all(&name, "").into_owned();
    name = RE_COPY_OF.replace_all(&name, "").into_owned();
    name = RE_UNDERSCORES.replace_all(&name, "_").into_owned();
    name = RE_HYPHENS.replace_all(&name, "-").into_owned();
    name = RE_WHITESPACE.replace_all(&name, " ").into_owned();

    name = name.replace("final_final", "final");
    name = RE_FINAL_VERSION.replace_all(&name, "${1}").into_owned();

    name = if keep_spaces {
        name.replace(' ', "_")
    } else {
        name.replace(' ', "")
    };

    name = RE_DISALLOWED.replace_all(&name, "").into_owned();

    name.trim_matches(['_', '-', ' ']).to_string()
}

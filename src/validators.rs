//! Input validation for files, names, directories and batches.
//!
//! Every check either passes or fails with a named [`ValidationError`]; none
//! of them coerce input or retry. Limits and extension sets live in a
//! [`ValidationPolicy`] handed to [`Validator::new`], so tests and callers can
//! override them without touching global state.

use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::warn;

/// Default per-file size ceiling in megabytes.
pub const DEFAULT_MAX_FILE_SIZE_MB: f64 = 100.0;
/// Default maximum filename length in characters.
pub const DEFAULT_MAX_FILENAME_LENGTH: usize = 255;
/// Default maximum category name length in characters.
pub const DEFAULT_MAX_CATEGORY_LENGTH: usize = 50;
/// Default maximum number of files in a batch.
pub const DEFAULT_MAX_BATCH_FILES: usize = 100;
/// Default maximum combined batch size in megabytes.
pub const DEFAULT_MAX_BATCH_SIZE_MB: f64 = 500.0;

/// Marker file created and removed by the directory write probe.
pub const WRITE_PROBE_NAME: &str = ".filebutler_write_test";

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Extensions blocked unless a caller explicitly unblocks them.
pub static DANGEROUS_EXTENSIONS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [".exe", ".bat", ".cmd", ".com", ".scr", ".vbs", ".js", ".jar"]
        .into_iter()
        .collect()
});

/// Windows device names that cannot be used as a file's base name.
pub static RESERVED_NAMES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7",
        "COM8", "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ]
    .into_iter()
    .collect()
});

/// Extensions the organizer knows how to handle.
pub const DEFAULT_SUPPORTED_EXTENSIONS: &[&str] = &[
    // Documents
    ".pdf", ".doc", ".docx", ".txt", ".rtf", ".odt",
    // Spreadsheets
    ".xls", ".xlsx", ".csv", ".ods",
    // Presentations
    ".ppt", ".pptx", ".odp",
    // Images
    ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".svg", ".webp",
    // Data files
    ".json", ".xml", ".yaml", ".yml",
    // Archives
    ".zip",
    // Common formats
    ".md", ".log",
];

const FORBIDDEN_FILENAME_CHARS: &[char] = &['/', '\\', '\0', '\n', '\r', '\t'];

static RE_STRICT_FILENAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w\s\-._()]+$").expect("Invalid regex"));

static RE_CATEGORY_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w\s\-]+$").expect("Invalid regex"));

/// Reasons a validation can fail.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Path traversal detected: {0}")]
    PathTraversal(PathBuf),

    #[error("File does not exist: {0}")]
    NotFound(PathBuf),

    #[error("Path is not a file: {0}")]
    NotAFile(PathBuf),

    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("File too large: {size_mb:.1}MB (max: {max_mb}MB)")]
    FileTooLarge { size_mb: f64, max_mb: f64 },

    #[error("Filename too long: {length} chars (max: {max})")]
    FilenameTooLong { length: usize, max: usize },

    #[error("Filename cannot be empty")]
    EmptyFilename,

    #[error("Filename contains invalid characters")]
    InvalidCharacters,

    #[error("Filename contains special characters (strict mode)")]
    StrictCharacters,

    #[error("Reserved filename: {0}")]
    ReservedName(String),

    #[error("Potentially dangerous file type: {0}")]
    DangerousExtension(String),

    #[error("File type not allowed: {extension}. Allowed types: {}", allowed.join(", "))]
    ExtensionNotAllowed {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("MIME type not allowed: {mime}. Allowed types: {}", allowed.join(", "))]
    MimeNotAllowed { mime: String, allowed: Vec<String> },

    #[error("Directory is not writable: {0}")]
    DirectoryNotWritable(PathBuf),

    #[error("Category name cannot be empty")]
    EmptyCategory,

    #[error("Category name too long: {length} chars (max: {max})")]
    CategoryTooLong { length: usize, max: usize },

    #[error(
        "Category name can only contain letters, numbers, spaces, underscores, and hyphens: {0}"
    )]
    InvalidCategoryName(String),

    #[error("Source and destination are the same: {0}")]
    SameLocation(PathBuf),

    #[error("Cannot move read-only file: {0}")]
    ReadOnlySource(PathBuf),

    #[error("Too many files in batch: {count} (max: {max})")]
    TooManyFiles { count: usize, max: usize },

    #[error("Batch too large: {size_mb:.1}MB (max: {max_mb}MB)")]
    BatchTooLarge { size_mb: f64, max_mb: f64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for validation checks.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Kind of file operation checked by [`Validator::validate_file_operation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOperation {
    Move,
    Copy,
}

/// Limits and extension sets used by a [`Validator`].
///
/// Extensions are stored lowercase with their leading dot.
#[derive(Debug, Clone)]
pub struct ValidationPolicy {
    pub max_file_size_mb: f64,
    pub max_filename_length: usize,
    pub max_category_length: usize,
    pub max_batch_files: usize,
    pub max_batch_size_mb: f64,
    pub dangerous_extensions: HashSet<String>,
    pub supported_extensions: HashSet<String>,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            max_file_size_mb: DEFAULT_MAX_FILE_SIZE_MB,
            max_filename_length: DEFAULT_MAX_FILENAME_LENGTH,
            max_category_length: DEFAULT_MAX_CATEGORY_LENGTH,
            max_batch_files: DEFAULT_MAX_BATCH_FILES,
            max_batch_size_mb: DEFAULT_MAX_BATCH_SIZE_MB,
            dangerous_extensions: DANGEROUS_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            supported_extensions: DEFAULT_SUPPORTED_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
        }
    }
}

/// Runs validation checks against a [`ValidationPolicy`].
///
/// # Examples
///
/// ```
/// use filebutler::validators::Validator;
///
/// let validator = Validator::default();
/// assert!(validator.validate_filename("report.pdf", false).is_ok());
/// assert!(validator.validate_filename("con.txt", false).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Validator {
    policy: ValidationPolicy,
}

impl Validator {
    /// Creates a validator enforcing `policy`.
    pub fn new(policy: ValidationPolicy) -> Self {
        Self { policy }
    }

    /// The policy this validator enforces.
    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    /// Checks that a file path is free of traversal and, optionally, that it
    /// names an existing regular file.
    ///
    /// The traversal guard rejects any path whose text contains `..`, even
    /// harmless ones like `foo..bar.txt`.
    pub fn validate_file_path(&self, path: &Path, must_exist: bool) -> ValidationResult<()> {
        check_traversal(path)?;

        if must_exist {
            if !path.exists() {
                return Err(ValidationError::NotFound(path.to_path_buf()));
            }
            if !path.is_file() {
                return Err(ValidationError::NotAFile(path.to_path_buf()));
            }
        }

        Ok(())
    }

    /// Checks that a file does not exceed the size ceiling.
    ///
    /// `max_size_mb` overrides the policy's ceiling for this call.
    pub fn validate_file_size(&self, path: &Path, max_size_mb: Option<f64>) -> ValidationResult<()> {
        let max_mb = max_size_mb.unwrap_or(self.policy.max_file_size_mb);

        if !path.exists() {
            return Err(ValidationError::NotFound(path.to_path_buf()));
        }

        let size_mb = fs::metadata(path)?.len() as f64 / BYTES_PER_MB;
        if size_mb > max_mb {
            return Err(ValidationError::FileTooLarge { size_mb, max_mb });
        }

        Ok(())
    }

    /// Checks that a filename is safe.
    ///
    /// Rejects names that are too long, empty or whitespace-only, contain
    /// path separators or control characters, or whose base (before the
    /// first `.`) is a reserved device name. In `strict` mode only word
    /// characters, spaces and `-._()` are accepted.
    pub fn validate_filename(&self, filename: &str, strict: bool) -> ValidationResult<()> {
        let length = filename.chars().count();
        if length > self.policy.max_filename_length {
            return Err(ValidationError::FilenameTooLong {
                length,
                max: self.policy.max_filename_length,
            });
        }

        if filename.trim().is_empty() {
            return Err(ValidationError::EmptyFilename);
        }

        if filename.contains(FORBIDDEN_FILENAME_CHARS) {
            return Err(ValidationError::InvalidCharacters);
        }

        if strict && !RE_STRICT_FILENAME.is_match(filename) {
            return Err(ValidationError::StrictCharacters);
        }

        let base = filename.split('.').next().unwrap_or_default().to_uppercase();
        if RESERVED_NAMES.contains(base.as_str()) {
            return Err(ValidationError::ReservedName(filename.to_string()));
        }

        Ok(())
    }

    /// Checks a file's extension against the dangerous set and an optional
    /// allow-list.
    ///
    /// Allow-list entries are compared lowercase and include the leading dot,
    /// e.g. `".pdf"`.
    pub fn validate_file_extension(
        &self,
        path: &Path,
        allowed_extensions: Option<&[&str]>,
        block_dangerous: bool,
    ) -> ValidationResult<()> {
        let extension = dotted_extension(path);

        if block_dangerous && self.policy.dangerous_extensions.contains(&extension) {
            return Err(ValidationError::DangerousExtension(extension));
        }

        if let Some(allowed) = allowed_extensions
            && !allowed.is_empty()
            && !allowed.iter().any(|a| a.to_lowercase() == extension)
        {
            let mut allowed: Vec<String> = allowed.iter().map(|a| a.to_string()).collect();
            allowed.sort();
            return Err(ValidationError::ExtensionNotAllowed { extension, allowed });
        }

        Ok(())
    }

    /// Returns true when the file's extension is in the supported set.
    pub fn is_supported_file_type(&self, path: &Path) -> bool {
        self.policy
            .supported_extensions
            .contains(&dotted_extension(path))
    }

    /// Checks a directory path for traversal, existence and writability.
    ///
    /// Writability is confirmed by creating and deleting a marker file, and is
    /// only probed when the directory exists. A pre-existing marker is left
    /// untouched.
    pub fn validate_directory_path(
        &self,
        dir: &Path,
        must_exist: bool,
        must_be_writable: bool,
    ) -> ValidationResult<()> {
        check_traversal(dir)?;

        if must_exist && !dir.exists() {
            return Err(ValidationError::NotFound(dir.to_path_buf()));
        }

        if dir.exists() && !dir.is_dir() {
            return Err(ValidationError::NotADirectory(dir.to_path_buf()));
        }

        if must_be_writable && dir.exists() && !probe_writable(dir) {
            return Err(ValidationError::DirectoryNotWritable(dir.to_path_buf()));
        }

        Ok(())
    }

    /// Checks the MIME type guessed from the file's extension against an
    /// optional allow-list.
    pub fn validate_mime_type(
        &self,
        path: &Path,
        allowed_types: Option<&[&str]>,
    ) -> ValidationResult<()> {
        let mime = guess_mime_type(path);

        if let Some(allowed) = allowed_types
            && !allowed.is_empty()
            && !allowed.contains(&mime.as_str())
        {
            return Err(ValidationError::MimeNotAllowed {
                mime,
                allowed: allowed.iter().map(|a| a.to_string()).collect(),
            });
        }

        Ok(())
    }

    /// Checks that a category name can be used as a folder name.
    pub fn validate_category_name(&self, category: &str) -> ValidationResult<()> {
        if category.trim().is_empty() {
            return Err(ValidationError::EmptyCategory);
        }

        let length = category.chars().count();
        if length > self.policy.max_category_length {
            return Err(ValidationError::CategoryTooLong {
                length,
                max: self.policy.max_category_length,
            });
        }

        if !RE_CATEGORY_NAME.is_match(category) {
            return Err(ValidationError::InvalidCategoryName(category.to_string()));
        }

        Ok(())
    }

    /// Checks that moving or copying `source` to `destination` is safe.
    ///
    /// The source must be an existing file, the two paths must resolve to
    /// different locations, the destination's directory must be writable (if
    /// it exists), and a moved source must not be read-only.
    pub fn validate_file_operation(
        &self,
        source: &Path,
        destination: &Path,
        operation: FileOperation,
    ) -> ValidationResult<()> {
        self.validate_file_path(source, true)?;

        if resolve_lenient(source) == resolve_lenient(destination) {
            return Err(ValidationError::SameLocation(source.to_path_buf()));
        }

        let parent = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        self.validate_directory_path(parent, false, true)?;

        if operation == FileOperation::Move && fs::metadata(source)?.permissions().readonly() {
            return Err(ValidationError::ReadOnlySource(source.to_path_buf()));
        }

        Ok(())
    }

    /// Checks that a batch stays within the file-count and combined-size limits.
    ///
    /// Missing files count toward the file limit but not the size limit.
    pub fn validate_batch_operation<P: AsRef<Path>>(&self, files: &[P]) -> ValidationResult<()> {
        if files.len() > self.policy.max_batch_files {
            return Err(ValidationError::TooManyFiles {
                count: files.len(),
                max: self.policy.max_batch_files,
            });
        }

        let total_bytes: u64 = files
            .iter()
            .filter_map(|f| fs::metadata(f.as_ref()).ok())
            .map(|m| m.len())
            .sum();

        let size_mb = total_bytes as f64 / BYTES_PER_MB;
        if size_mb > self.policy.max_batch_size_mb {
            return Err(ValidationError::BatchTooLarge {
                size_mb,
                max_mb: self.policy.max_batch_size_mb,
            });
        }

        Ok(())
    }
}

/// Guesses a MIME type from the file extension, defaulting to
/// `application/octet-stream`.
pub fn guess_mime_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or("application/octet-stream")
        .to_string()
}

/// Replaces characters that are unsafe in filenames with `replacement`.
///
/// Unlike the validators this never fails: reserved device names are
/// prefixed, surrounding spaces and dots are trimmed, an empty result
/// becomes `unnamed`, and overlong names are cut to 255 characters while
/// keeping the extension.
///
/// # Examples
///
/// ```
/// use filebutler::validators::sanitize_filename;
///
/// assert_eq!(sanitize_filename("a/b:c?.txt", "_"), "a_b_c_.txt");
/// assert_eq!(sanitize_filename("CON.txt", "_"), "_CON.txt");
/// ```
pub fn sanitize_filename(filename: &str, replacement: &str) -> String {
    const UNSAFE: &[char] = &['/', '\\', '\0', '\n', '\r', '\t', ':', '*', '?', '"', '<', '>', '|'];

    if filename.is_empty() {
        return "unnamed".to_string();
    }

    let mut sanitized = filename.replace(UNSAFE, replacement);

    let mut parts: Vec<String> = sanitized.split('.').map(str::to_string).collect();
    if RESERVED_NAMES.contains(parts[0].to_uppercase().as_str()) {
        parts[0] = format!("{}{}", replacement, parts[0]);
        sanitized = parts.join(".");
    }

    let mut sanitized = sanitized.trim_matches([' ', '.']).to_string();

    if sanitized.is_empty() {
        sanitized = "unnamed".to_string();
    }

    if sanitized.chars().count() > DEFAULT_MAX_FILENAME_LENGTH {
        sanitized = match sanitized.rsplit_once('.') {
            Some((name, ext)) => {
                let keep = DEFAULT_MAX_FILENAME_LENGTH.saturating_sub(ext.chars().count() + 1);
                format!("{}.{}", name.chars().take(keep).collect::<String>(), ext)
            }
            None => sanitized.chars().take(DEFAULT_MAX_FILENAME_LENGTH).collect(),
        };
    }

    sanitized
}

fn check_traversal(path: &Path) -> ValidationResult<()> {
    if path.to_string_lossy().contains("..") {
        return Err(ValidationError::PathTraversal(path.to_path_buf()));
    }
    Ok(())
}

/// Creates and removes a marker file in `dir`.
///
/// The marker is opened with `create_new`, so an existing file of that name
/// is never truncated; its presence already shows the directory takes writes.
fn probe_writable(dir: &Path) -> bool {
    let marker = dir.join(WRITE_PROBE_NAME);

    match fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&marker)
    {
        Ok(file) => {
            drop(file);
            if let Err(e) = fs::remove_file(&marker) {
                warn!("Could not remove write marker {}: {}", marker.display(), e);
            }
            true
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => true,
        Err(_) => false,
    }
}

/// Lowercased extension including its dot, or an empty string.
fn dotted_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Resolves a path without requiring it to exist: canonicalizes it, or its
/// parent joined with the file name, or falls back to an absolute path.
pub(crate) fn resolve_lenient(path: &Path) -> PathBuf {
    if let Ok(resolved) = path.canonicalize() {
        return resolved;
    }

    if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
        let parent = if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        };
        if let Ok(resolved_parent) = parent.canonicalize() {
            return resolved_parent.join(name);
        }
    }

    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

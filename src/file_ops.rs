//! Filesystem helpers: directories, collision-free moves and copies,
//! metadata, hashing, directory listing and JSON files.

use crate::humanize::format_file_size;
use crate::validators::guess_mime_type;
use chrono::{DateTime, Local, NaiveDateTime};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::Digest;
use sha2::digest::Output;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use tracing::{debug, info, warn};

const HASH_CHUNK_SIZE: usize = 4096;

/// Errors raised by filesystem operations.
#[derive(Error, Debug)]
pub enum FileOperationError {
    #[error("Source file does not exist: {0}")]
    SourceNotFound(PathBuf),

    #[error("Failed to create directory {path}: {source}")]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to move {from} to {to}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("JSON file not found: {0}")]
    JsonNotFound(PathBuf),

    #[error("Invalid JSON in file {path}: {source}")]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write JSON file {path}: {source}")]
    JsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid listing pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for filesystem operations.
pub type FileOpResult<T> = Result<T, FileOperationError>;

/// Creates `path` and any missing parents, returning it.
pub fn ensure_directory(path: &Path) -> FileOpResult<PathBuf> {
    fs::create_dir_all(path).map_err(|source| FileOperationError::DirectoryCreation {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(path.to_path_buf())
}

/// Returns `path` if it is free, otherwise the first free `stem_N.ext` for
/// `N = 2, 3, …` in the same directory.
///
/// # Examples
///
/// ```no_run
/// use filebutler::file_ops::get_unique_filepath;
/// use std::path::Path;
///
/// // With invoice.pdf already present, this yields invoice_2.pdf.
/// let free = get_unique_filepath(Path::new("Invoices/invoice.pdf"));
/// ```
pub fn get_unique_filepath(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let parent = path.parent().unwrap_or(Path::new(""));

    let mut counter = 2;
    loop {
        let candidate = parent.join(format!("{}_{}{}", stem, counter, extension));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// Moves `source` to `destination`, creating the destination directory.
///
/// When the destination is taken and `overwrite` is false, a numbered
/// sibling is used instead. A rename that fails (for example across
/// filesystems) falls back to copy and delete. Returns the final path.
///
/// # Arguments
///
/// * `source` - Existing file to move
/// * `destination` - Desired target path
/// * `overwrite` - Replace an existing destination instead of renaming
pub fn safe_move_file(source: &Path, destination: &Path, overwrite: bool) -> FileOpResult<PathBuf> {
    if !source.exists() {
        return Err(FileOperationError::SourceNotFound(source.to_path_buf()));
    }

    let destination = prepare_destination(destination, overwrite)?;

    if let Err(rename_err) = fs::rename(source, &destination) {
        debug!(
            "Rename failed ({}), falling back to copy for {}",
            rename_err,
            source.display()
        );
        fs::copy(source, &destination).map_err(|e| FileOperationError::Move {
            from: source.to_path_buf(),
            to: destination.clone(),
            source: e,
        })?;
        fs::remove_file(source).map_err(|e| FileOperationError::Move {
            from: source.to_path_buf(),
            to: destination.clone(),
            source: e,
        })?;
    }

    info!("Moved {} -> {}", source.display(), destination.display());
    Ok(destination)
}

/// Copies `source` to `destination`, with the same collision handling as
/// [`safe_move_file`]. Returns the final path.
pub fn copy_file_safe(source: &Path, destination: &Path, overwrite: bool) -> FileOpResult<PathBuf> {
    if !source.exists() {
        return Err(FileOperationError::SourceNotFound(source.to_path_buf()));
    }

    let destination = prepare_destination(destination, overwrite)?;

    fs::copy(source, &destination).map_err(|e| FileOperationError::Copy {
        from: source.to_path_buf(),
        to: destination.clone(),
        source: e,
    })?;

    info!("Copied {} -> {}", source.display(), destination.display());
    Ok(destination)
}

fn prepare_destination(destination: &Path, overwrite: bool) -> FileOpResult<PathBuf> {
    if let Some(parent) = destination.parent()
        && !parent.as_os_str().is_empty()
    {
        ensure_directory(parent)?;
    }

    if destination.exists() && !overwrite {
        let unique = get_unique_filepath(destination);
        debug!(
            "{} exists, using {}",
            destination.display(),
            unique.display()
        );
        return Ok(unique);
    }

    Ok(destination.to_path_buf())
}

/// Descriptive metadata about a file on disk.
#[derive(Debug, Clone, Serialize)]
pub struct FileMetadata {
    pub filename: String,
    pub stem: String,
    /// Lowercased, with its dot; empty when there is none.
    pub extension: String,
    pub size_bytes: u64,
    pub size_human: String,
    /// Not every platform records creation time.
    pub created_time: Option<NaiveDateTime>,
    pub modified_time: Option<NaiveDateTime>,
    pub mime_type: String,
    pub absolute_path: PathBuf,
    pub parent_directory: PathBuf,
    /// MD5 of the file content.
    pub file_hash: String,
}

/// Collects [`FileMetadata`] for an existing file.
pub fn get_file_metadata(path: &Path) -> FileOpResult<FileMetadata> {
    if !path.exists() {
        return Err(FileOperationError::SourceNotFound(path.to_path_buf()));
    }

    let stats = fs::metadata(path)?;
    let size_bytes = stats.len();

    Ok(FileMetadata {
        filename: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        stem: path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
        extension: path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default(),
        size_bytes,
        size_human: format_file_size(size_bytes),
        created_time: stats.created().ok().map(to_local_naive),
        modified_time: stats.modified().ok().map(to_local_naive),
        mime_type: guess_mime_type(path),
        absolute_path: std::path::absolute(path)?,
        parent_directory: path.parent().map(Path::to_path_buf).unwrap_or_default(),
        file_hash: calculate_file_hash(path, HashAlgorithm::Md5)?,
    })
}

fn to_local_naive(time: SystemTime) -> NaiveDateTime {
    DateTime::<Local>::from(time).naive_local()
}

/// Digest used by [`calculate_file_hash`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashAlgorithm {
    #[default]
    Md5,
    Sha256,
}

/// Hashes a file's content, returning lowercase hex.
///
/// The file is streamed in 4 KiB chunks.
pub fn calculate_file_hash(path: &Path, algorithm: HashAlgorithm) -> FileOpResult<String> {
    let hex = match algorithm {
        HashAlgorithm::Md5 => format!("{:x}", digest_file::<md5::Md5>(path)?),
        HashAlgorithm::Sha256 => format!("{:x}", digest_file::<sha2::Sha256>(path)?),
    };
    Ok(hex)
}

fn digest_file<D: Digest>(path: &Path) -> io::Result<Output<D>> {
    let mut file = File::open(path)?;
    let mut hasher = D::new();
    let mut buffer = [0u8; HASH_CHUNK_SIZE];

    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hasher.finalize())
}

/// Lists regular files in `directory`, sorted by path.
///
/// A missing directory yields an empty list. `extensions`, when given,
/// holds lowercase dotted extensions such as `".pdf"`.
pub fn list_files_in_directory(
    directory: &Path,
    recursive: bool,
    extensions: Option<&[&str]>,
) -> FileOpResult<Vec<PathBuf>> {
    if !directory.exists() {
        return Ok(Vec::new());
    }

    let base = glob::Pattern::escape(&directory.to_string_lossy());
    let pattern = if recursive {
        format!("{}/**/*", base)
    } else {
        format!("{}/*", base)
    };

    let options = glob::MatchOptions {
        require_literal_leading_dot: false,
        ..Default::default()
    };

    let mut files: Vec<PathBuf> = glob::glob_with(&pattern, options)?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|path| path.is_file())
        .filter(|path| match extensions {
            Some(allowed) => {
                let ext = path
                    .extension()
                    .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
                    .unwrap_or_default();
                allowed.contains(&ext.as_str())
            }
            None => true,
        })
        .collect();

    files.sort();
    debug!("Listed {} files in {}", files.len(), directory.display());
    Ok(files)
}

/// True when the file name starts with a dot.
pub fn is_hidden_file(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with('.'))
}

/// Reads and deserializes a JSON file.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> FileOpResult<T> {
    let contents = fs::read_to_string(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            FileOperationError::JsonNotFound(path.to_path_buf())
        } else {
            FileOperationError::Io(e)
        }
    })?;

    serde_json::from_str(&contents).map_err(|source| FileOperationError::InvalidJson {
        path: path.to_path_buf(),
        source,
    })
}

/// Serializes `data` to a JSON file, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, data: &T, pretty: bool) -> FileOpResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        ensure_directory(parent)?;
    }

    let json = if pretty {
        serde_json::to_string_pretty(data)
    } else {
        serde_json::to_string(data)
    }
    .map_err(|source| FileOperationError::JsonWrite {
        path: path.to_path_buf(),
        source,
    })?;

    fs::write(path, json)?;
    Ok(())
}

/// Detects a file's MIME type from its content, falling back to its
/// extension.
pub fn detect_mime(path: &Path) -> String {
    match infer::get_from_path(path) {
        Ok(Some(kind)) => kind.mime_type().to_string(),
        _ => guess_mime_type(path),
    }
}

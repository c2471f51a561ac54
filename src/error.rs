//! Top-level error type for the filebutler CLI.

use thiserror::Error;

pub use crate::config::ConfigError;
pub use crate::file_ops::FileOperationError;
pub use crate::validators::ValidationError;

/// Any failure surfaced by a CLI command.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("File operation failed: {0}")]
    FileOperation(#[from] FileOperationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Validation(_) => exit_codes::VALIDATION_ERROR,
            Error::Config(_) => exit_codes::CONFIG_ERROR,
            Error::FileOperation(_) => exit_codes::FILE_OPERATION_ERROR,
            Error::Io(_) | Error::Json(_) => exit_codes::UNEXPECTED_ERROR,
        }
    }
}

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const UNEXPECTED_ERROR: i32 = 1;
    pub const VALIDATION_ERROR: i32 = 2;
    pub const CONFIG_ERROR: i32 = 3;
    pub const FILE_OPERATION_ERROR: i32 = 4;
}

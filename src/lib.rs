//! filebutler - tidy file names and file documents into an organized tree
//!
//! This library cleans messy filenames, composes descriptive names from
//! document details, builds category/date destination paths, validates files
//! against safety rules, and moves files into place without overwriting
//! anything. Configuration comes from TOML files with environment overrides.

pub mod cli;
pub mod clock;
pub mod config;
pub mod describe;
pub mod error;
pub mod file_category;
pub mod file_ops;
pub mod humanize;
pub mod normalize;
pub mod organizer;
pub mod output;
pub mod paths;
pub mod validators;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ButlerConfig, CompiledFilters, ConfigError, FilterConfig};
pub use describe::{DateStyle, Entities, create_descriptive_filename};
pub use error::{Error, Result};
pub use file_category::{Category, FileMapper, get_file_type_category};
pub use file_ops::{FileMetadata, FileOperationError, HashAlgorithm};
pub use normalize::{NormalizeOptions, clean_filename};
pub use organizer::{FileOrganizer, Operation, OrganizePlan};
pub use paths::{OrganizedPath, build_organized_path};
pub use validators::{ValidationError, ValidationPolicy, Validator};

pub use cli::{Args, Command, run};

//! Moves files into the organized tree.
//!
//! Organizing a file happens in two steps. [`FileOrganizer::plan`] validates
//! the file and works out where it belongs without touching the disk, and
//! [`FileOrganizer::execute`] performs the move. Dry runs stop after planning.

use crate::clock::{Clock, SystemClock};
use crate::config::ButlerConfig;
use crate::error::Result;
use crate::file_category::{Category, FileMapper};
use crate::file_ops::{detect_mime, safe_move_file};
use crate::normalize::NormalizeOptions;
use crate::paths::build_organized_path_with_clock;
use crate::validators::{FileOperation, ValidationPolicy, ValidationResult, Validator};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where a file would go, decided before anything moves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrganizePlan {
    pub source: PathBuf,
    pub category: Category,
    pub mime_type: String,
    pub destination: PathBuf,
}

/// A completed move.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Operation {
    pub original_path: PathBuf,
    /// Final location; differs from the planned destination after a collision.
    pub new_path: PathBuf,
    pub category: Category,
}

/// Plans and performs moves into `<root>/<Category>/[year/month]/<clean name>`.
pub struct FileOrganizer {
    root: PathBuf,
    validator: Validator,
    mapper: FileMapper,
    naming: NormalizeOptions,
    date_based: bool,
    clock: Box<dyn Clock>,
}

impl FileOrganizer {
    /// Creates an organizer rooted at `root` that uses the system clock.
    pub fn new(
        root: impl Into<PathBuf>,
        policy: ValidationPolicy,
        naming: NormalizeOptions,
        date_based: bool,
    ) -> Self {
        Self {
            root: root.into(),
            validator: Validator::new(policy),
            mapper: FileMapper::default(),
            naming,
            date_based,
            clock: Box::new(SystemClock),
        }
    }

    /// Creates an organizer from loaded configuration.
    pub fn from_config(config: &ButlerConfig) -> Self {
        Self::new(
            config.paths.organize_root.clone(),
            config.validation_policy(),
            config.normalize_options(),
            config.naming.date_based,
        )
    }

    /// Replaces the clock used for year/month folders.
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Validates `source` and computes its destination.
    ///
    /// The file must exist, have a safe name and a non-dangerous extension,
    /// and fit within the size limit. Its category comes from content
    /// sniffing with an extension fallback.
    pub fn plan(&self, source: &Path) -> ValidationResult<OrganizePlan> {
        self.validator.validate_file_path(source, true)?;

        let filename = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.validator.validate_filename(&filename, false)?;
        self.validator.validate_file_extension(source, None, true)?;
        self.validator.validate_file_size(source, None)?;

        let mime_type = detect_mime(source);
        let extension = source.extension().map(|e| e.to_string_lossy());
        let category = self
            .mapper
            .categorize(Some(&mime_type), extension.as_deref());

        let cleaned = self.naming.clean(&filename);
        let no_subcategories: &[&str] = &[];
        let destination = build_organized_path_with_clock(
            &self.root,
            category.dir_name(),
            no_subcategories,
            Some(&cleaned),
            self.date_based,
            self.clock.as_ref(),
        )
        .to_path_buf();

        debug!(
            "Planned {} -> {} ({})",
            source.display(),
            destination.display(),
            category
        );

        Ok(OrganizePlan {
            source: source.to_path_buf(),
            category,
            mime_type,
            destination,
        })
    }

    /// Checks a whole batch against the count and size limits.
    pub fn check_batch<P: AsRef<Path>>(&self, files: &[P]) -> ValidationResult<()> {
        self.validator.validate_batch_operation(files)
    }

    /// Performs a planned move.
    ///
    /// An existing file at the destination is never overwritten; the file
    /// lands next to it with a numeric suffix instead.
    pub fn execute(&self, plan: &OrganizePlan) -> Result<Operation> {
        self.validator
            .validate_file_operation(&plan.source, &plan.destination, FileOperation::Move)?;

        let new_path = safe_move_file(&plan.source, &plan.destination, false)?;
        info!(
            "Organized {} into {}",
            plan.source.display(),
            new_path.display()
        );

        Ok(Operation {
            original_path: plan.source.clone(),
            new_path,
            category: plan.category,
        })
    }

    /// Plans and executes in one step.
    pub fn organize(&self, source: &Path) -> Result<Operation> {
        let plan = self.plan(source)?;
        self.execute(&plan)
    }
}

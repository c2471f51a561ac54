//! Command-line interface for filebutler.
//!
//! Parses arguments with clap, loads configuration, and dispatches each
//! subcommand to the library:
//! - `clean` / `describe` / `path` print generated names and paths
//! - `validate` / `inspect` report on existing files
//! - `organize` moves files into the organized tree (or previews it)
//! - `init` scaffolds the organized tree and writes a config file

use crate::clock::{Clock, SystemClock};
use crate::config::{ButlerConfig, CompiledFilters};
use crate::describe::{Entities, create_descriptive_filename_with_clock};
use crate::error::Result;
use crate::file_category::{Category, FileMapper};
use crate::file_ops::{
    HashAlgorithm, calculate_file_hash, detect_mime, get_file_metadata, list_files_in_directory,
};
use crate::humanize::format_time_ago;
use crate::normalize::{DEFAULT_MAX_LENGTH, clean_filename};
use crate::organizer::{FileOrganizer, Operation, OrganizePlan};
use crate::output::OutputFormatter;
use crate::paths::build_organized_path_with_clock;
use crate::validators::{ValidationError, Validator, resolve_lenient};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Tidy, rename and validate files.
#[derive(Parser, Debug)]
#[command(
    name = "filebutler",
    version,
    about = "Clean up messy filenames and file documents into an organized tree"
)]
pub struct Args {
    /// Path to a configuration file.
    #[arg(short, long, global = true, env = "FILEBUTLER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the cleaned form of one or more filenames.
    Clean {
        #[arg(required = true)]
        names: Vec<String>,

        /// Remove spaces instead of turning them into underscores.
        #[arg(long)]
        no_spaces: bool,

        /// Maximum base-name length (0 disables truncation).
        #[arg(long)]
        max_length: Option<usize>,
    },

    /// Compose a descriptive filename from document details.
    Describe {
        /// Document type, e.g. "invoice" or "contract".
        doc_type: String,

        #[arg(long)]
        company: Option<String>,

        #[arg(long)]
        person: Option<String>,

        #[arg(long)]
        invoice_number: Option<String>,

        #[arg(long)]
        reference: Option<String>,

        /// Document date (YYYY-MM-DD); defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Original filename, used for its extension.
        #[arg(long)]
        original: Option<String>,

        /// Leave the date out of the name.
        #[arg(long)]
        no_date: bool,
    },

    /// Print the organized path for a category.
    Path {
        category: String,

        /// Subcategory folder; repeat for deeper nesting.
        #[arg(long = "sub")]
        subcategories: Vec<String>,

        #[arg(long)]
        filename: Option<String>,

        /// Base directory (defaults to the configured organize root).
        #[arg(long)]
        base: Option<PathBuf>,

        /// Skip the year/month folders.
        #[arg(long)]
        no_date: bool,
    },

    /// Check files against the safety rules.
    Validate {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Only allow letters, digits, spaces and `-._()` in names.
        #[arg(long)]
        strict: bool,

        /// Allowed extensions, e.g. `--allow .pdf --allow .docx`.
        #[arg(long = "allow")]
        allowed_extensions: Vec<String>,
    },

    /// Show metadata for a file.
    Inspect {
        path: PathBuf,

        /// Print as JSON.
        #[arg(long)]
        json: bool,

        /// Also compute a SHA-256 digest.
        #[arg(long)]
        sha256: bool,
    },

    /// Move files into the organized tree.
    Organize {
        /// Files or directories to organize (defaults to the watch folders).
        sources: Vec<PathBuf>,

        /// Show what would happen without moving anything.
        #[arg(long)]
        dry_run: bool,

        /// Descend into subdirectories.
        #[arg(short, long)]
        recursive: bool,
    },

    /// Create the organized directory tree and a starter config file.
    Init {
        /// Where to write the config (defaults to ~/.config/filebutler/config.toml).
        #[arg(long)]
        output: Option<PathBuf>,

        /// Overwrite an existing config file.
        #[arg(long)]
        force: bool,
    },
}

/// Loads configuration and runs the parsed command with the system clock.
pub fn run(args: Args) -> Result<()> {
    let config = ButlerConfig::load(args.config.as_deref())?;
    config.validate()?;
    run_command(args.command, &config, Box::new(SystemClock))
}

/// Runs a single command against an already loaded configuration.
///
/// # Examples
///
/// ```no_run
/// use filebutler::cli::{Command, run_command};
/// use filebutler::clock::SystemClock;
/// use filebutler::config::ButlerConfig;
///
/// let command = Command::Organize { sources: vec![], dry_run: true, recursive: false };
/// run_command(command, &ButlerConfig::default(), Box::new(SystemClock)).unwrap();
/// ```
pub fn run_command(command: Command, config: &ButlerConfig, clock: Box<dyn Clock>) -> Result<()> {
    match command {
        Command::Clean {
            names,
            no_spaces,
            max_length,
        } => {
            let keep_spaces = !no_spaces && config.naming.keep_spaces;
            let max_length = Some(max_length.unwrap_or(config.naming.max_length));
            for name in names {
                OutputFormatter::plain(&clean_filename(&name, keep_spaces, max_length));
            }
            Ok(())
        }

        Command::Describe {
            doc_type,
            company,
            person,
            invoice_number,
            reference,
            date,
            original,
            no_date,
        } => {
            let entities = Entities {
                company,
                person,
                invoice_number,
                reference,
                document_date: date,
            };
            let name = create_descriptive_filename_with_clock(
                &doc_type,
                &entities,
                original.as_deref(),
                !no_date,
                clock.as_ref(),
            );
            OutputFormatter::plain(&name);
            Ok(())
        }

        Command::Path {
            category,
            subcategories,
            filename,
            base,
            no_date,
        } => {
            let validator = Validator::new(config.validation_policy());
            validator.validate_category_name(&category)?;
            for sub in &subcategories {
                validator.validate_category_name(sub)?;
            }

            let base = base.unwrap_or_else(|| config.paths.organize_root.clone());
            let path = build_organized_path_with_clock(
                &base,
                &category,
                &subcategories,
                filename.as_deref(),
                config.naming.date_based && !no_date,
                clock.as_ref(),
            );
            OutputFormatter::plain(&path.to_string());
            Ok(())
        }

        Command::Validate {
            paths,
            strict,
            allowed_extensions,
        } => validate_files(config, &paths, strict, &allowed_extensions),

        Command::Inspect { path, json, sha256 } => inspect_file(&path, json, sha256, clock.as_ref()),

        Command::Organize {
            sources,
            dry_run,
            recursive,
        } => {
            let sources = if sources.is_empty() {
                config.paths.watch_folders.clone()
            } else {
                sources
            };
            let organizer = FileOrganizer::from_config(config).with_clock(clock);
            organize(&organizer, config, &sources, dry_run, recursive)
        }

        Command::Init { output, force } => init(config, output, force),
    }
}

/// Runs every check on each path and reports the results.
///
/// Returns the first failure after all paths have been reported.
fn validate_files(
    config: &ButlerConfig,
    paths: &[PathBuf],
    strict: bool,
    allowed_extensions: &[String],
) -> Result<()> {
    let validator = Validator::new(config.validation_policy());
    let allowed: Vec<&str> = allowed_extensions.iter().map(String::as_str).collect();
    let allowed = (!allowed.is_empty()).then_some(allowed.as_slice());

    let mut first_error: Option<ValidationError> = None;

    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let outcome = validator
            .validate_file_path(path, true)
            .and_then(|_| validator.validate_filename(&name, strict))
            .and_then(|_| validator.validate_file_extension(path, allowed, true))
            .and_then(|_| validator.validate_file_size(path, None));

        match outcome {
            Ok(()) => {
                let note = if validator.is_supported_file_type(path) {
                    ""
                } else {
                    " (unsupported type)"
                };
                OutputFormatter::success(&format!("{}{}", path.display(), note));
            }
            Err(e) => {
                OutputFormatter::error(&format!("{}: {}", path.display(), e));
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

fn inspect_file(path: &Path, json: bool, sha256: bool, clock: &dyn Clock) -> Result<()> {
    let metadata = get_file_metadata(path)?;
    let sha = if sha256 {
        Some(calculate_file_hash(path, HashAlgorithm::Sha256)?)
    } else {
        None
    };
    let detected = detect_mime(path);
    let category = categorize(path, &detected);

    if json {
        let mut value = serde_json::to_value(&metadata)?;
        value["detected_mime_type"] = detected.into();
        value["category"] = category.as_str().into();
        if let Some(sha) = sha {
            value["sha256"] = sha.into();
        }
        OutputFormatter::plain(&serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    OutputFormatter::header(&metadata.filename);
    OutputFormatter::field("Path", &metadata.absolute_path.display().to_string());
    OutputFormatter::field("Size", &metadata.size_human);
    OutputFormatter::field("MIME type", &metadata.mime_type);
    OutputFormatter::field("Detected type", &detected);
    OutputFormatter::field("Category", category.dir_name());
    if let Some(modified) = metadata.modified_time {
        OutputFormatter::field("Modified", &format_time_ago(modified, clock.now()));
    }
    OutputFormatter::field("MD5", &metadata.file_hash);
    if let Some(sha) = sha {
        OutputFormatter::field("SHA-256", &sha);
    }
    OutputFormatter::field(
        "Suggested name",
        &clean_filename(&metadata.filename, true, Some(DEFAULT_MAX_LENGTH)),
    );

    Ok(())
}

fn categorize(path: &Path, mime: &str) -> Category {
    let extension = path.extension().map(|e| e.to_string_lossy());
    FileMapper::default().categorize(Some(mime), extension.as_deref())
}

/// Collects the candidate files under `sources`, applying the configured filters.
fn collect_files(
    sources: &[PathBuf],
    recursive: bool,
    filters: &CompiledFilters,
    root: &Path,
) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let root = resolve_lenient(root);

    for source in sources {
        if source.is_file() {
            files.push(source.clone());
            continue;
        }

        if !source.is_dir() {
            warn!("Skipping missing source {}", source.display());
            OutputFormatter::warning(&format!("Not found: {}", source.display()));
            continue;
        }

        for file in list_files_in_directory(source, recursive, None)? {
            let relative = file.strip_prefix(source).unwrap_or(&file);
            if !filters.should_include(relative) {
                debug!("Filtered out {}", file.display());
                continue;
            }
            // Files already filed below the organize root stay where they are.
            // Compare resolved paths so relative or symlinked sources still match.
            let resolved = resolve_lenient(&file);
            if resolved.starts_with(&root) && resolved.parent() != Some(root.as_path()) {
                debug!("Already organized: {}", file.display());
                continue;
            }
            files.push(file);
        }
    }

    Ok(files)
}

fn organize(
    organizer: &FileOrganizer,
    config: &ButlerConfig,
    sources: &[PathBuf],
    dry_run: bool,
    recursive: bool,
) -> Result<()> {
    let filters = config.filters.compile()?;
    let files = collect_files(sources, recursive, &filters, organizer.root())?;

    if files.is_empty() {
        OutputFormatter::info("No files found to organize.");
        return Ok(());
    }

    organizer.check_batch(files.as_slice())?;

    let mut plans: Vec<OrganizePlan> = Vec::new();
    for file in &files {
        match organizer.plan(file) {
            Ok(plan) => plans.push(plan),
            Err(e) => OutputFormatter::warning(&format!("Skipping {}: {}", file.display(), e)),
        }
    }

    let mut counts: BTreeMap<Category, usize> = BTreeMap::new();

    if dry_run {
        OutputFormatter::dry_run_notice(&format!(
            "Files would be organized under {}:",
            organizer.root().display()
        ));
        for plan in &plans {
            OutputFormatter::plan(plan, organizer.root());
            *counts.entry(plan.category).or_insert(0) += 1;
        }
        OutputFormatter::summary_table(&counts);
        OutputFormatter::dry_run_notice("No files were modified.");
        return Ok(());
    }

    let progress = OutputFormatter::create_progress_bar(plans.len() as u64);
    let mut operations: Vec<Operation> = Vec::new();
    let mut failures: Vec<(PathBuf, String)> = Vec::new();

    for plan in &plans {
        match organizer.execute(plan) {
            Ok(operation) => {
                *counts.entry(operation.category).or_insert(0) += 1;
                operations.push(operation);
            }
            Err(e) => failures.push((plan.source.clone(), e.to_string())),
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    for operation in &operations {
        OutputFormatter::operation(operation);
    }
    for (path, reason) in &failures {
        OutputFormatter::error(&format!("{}: {}", path.display(), reason));
    }

    OutputFormatter::summary_table(&counts);
    if !failures.is_empty() {
        OutputFormatter::warning("Some files could not be organized. Please review errors above.");
    }

    Ok(())
}

fn init(config: &ButlerConfig, output: Option<PathBuf>, force: bool) -> Result<()> {
    let created = config.create_directories()?;
    OutputFormatter::success(&format!(
        "Prepared {} folders under {}",
        created.len(),
        config.paths.organize_root.display()
    ));

    let Some(target) = output.or_else(ButlerConfig::user_config_path) else {
        OutputFormatter::warning("HOME is not set; skipping config file");
        return Ok(());
    };

    if target.exists() && !force {
        OutputFormatter::info(&format!(
            "Config already exists at {} (use --force to overwrite)",
            target.display()
        ));
        return Ok(());
    }

    config.save(&target)?;
    OutputFormatter::success(&format!("Wrote config to {}", target.display()));
    Ok(())
}

//! Configuration loading, environment overrides and file filtering rules.
//!
//! Configuration is stored in TOML. Every section and field is optional:
//!
//! ```toml
//! [paths]
//! organize_root = "~/Documents"
//! watch_folders = ["~/Downloads", "~/Desktop", "~/Documents"]
//!
//! [limits]
//! max_file_size_mb = 100.0
//! max_batch_files = 100
//! max_batch_size_mb = 500.0
//!
//! [naming]
//! keep_spaces = true
//! max_length = 100
//! date_based = true
//!
//! [files]
//! supported_extensions = [".pdf", ".docx", ".png"]
//!
//! [filters]
//! enable_hidden_files = false
//!
//! [filters.exclude]
//! filenames = [".DS_Store", "Thumbs.db"]
//! patterns = ["*.tmp", "node_modules/**"]
//! extensions = ["bak", "tmp"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//! ```

use crate::file_category::Category;
use crate::file_ops::{FileOpResult, ensure_directory};
use crate::normalize::NormalizeOptions;
use crate::validators::{
    DEFAULT_MAX_BATCH_FILES, DEFAULT_MAX_BATCH_SIZE_MB, DEFAULT_MAX_FILE_SIZE_MB,
    DEFAULT_SUPPORTED_EXTENSIONS, ValidationPolicy,
};
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_NAME: &str = ".filebutler.toml";

pub const ENV_ORGANIZE_ROOT: &str = "FILEBUTLER_ORGANIZE_ROOT";
pub const ENV_WATCH_FOLDERS: &str = "FILEBUTLER_WATCH_FOLDERS";
pub const ENV_MAX_FILE_SIZE_MB: &str = "FILEBUTLER_MAX_FILE_SIZE_MB";

/// Errors raised while loading, validating or compiling configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid configuration in {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },

    #[error("Invalid glob pattern '{0}': expected *.ext or dir/**")]
    InvalidGlobPattern(String),

    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },

    #[error("Invalid configuration value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("IO error reading configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ButlerConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub naming: NamingConfig,
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub filters: FilterConfig,
}

/// Where files come from and where they are organized to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_organize_root")]
    pub organize_root: PathBuf,
    #[serde(default = "default_watch_folders")]
    pub watch_folders: Vec<PathBuf>,
}

fn default_organize_root() -> PathBuf {
    PathBuf::from("~/Documents")
}

fn default_watch_folders() -> Vec<PathBuf> {
    ["~/Downloads", "~/Desktop", "~/Documents"]
        .into_iter()
        .map(PathBuf::from)
        .collect()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            organize_root: default_organize_root(),
            watch_folders: default_watch_folders(),
        }
    }
}

/// Size and batch limits fed to the validators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: f64,
    #[serde(default = "default_max_batch_files")]
    pub max_batch_files: usize,
    #[serde(default = "default_max_batch_size_mb")]
    pub max_batch_size_mb: f64,
}

fn default_max_file_size_mb() -> f64 {
    DEFAULT_MAX_FILE_SIZE_MB
}

fn default_max_batch_files() -> usize {
    DEFAULT_MAX_BATCH_FILES
}

fn default_max_batch_size_mb() -> f64 {
    DEFAULT_MAX_BATCH_SIZE_MB
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: default_max_file_size_mb(),
            max_batch_files: default_max_batch_files(),
            max_batch_size_mb: default_max_batch_size_mb(),
        }
    }
}

/// Filename cleaning and layout options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingConfig {
    #[serde(default = "default_true")]
    pub keep_spaces: bool,
    /// Maximum cleaned base-name length; 0 disables truncation.
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    /// Insert year and month folders after the category.
    #[serde(default = "default_true")]
    pub date_based: bool,
}

fn default_true() -> bool {
    true
}

fn default_max_length() -> usize {
    crate::normalize::DEFAULT_MAX_LENGTH
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            keep_spaces: true,
            max_length: default_max_length(),
            date_based: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    #[serde(default = "default_supported_extensions")]
    pub supported_extensions: Vec<String>,
}

fn default_supported_extensions() -> Vec<String> {
    DEFAULT_SUPPORTED_EXTENSIONS
        .iter()
        .map(|e| e.to_string())
        .collect()
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            supported_extensions: default_supported_extensions(),
        }
    }
}

/// Rules deciding which files a directory scan picks up.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Whether to include hidden files (starting with "."). Defaults to false.
    #[serde(default)]
    pub enable_hidden_files: bool,

    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Whitelist that overrides every exclude rule.
    #[serde(default)]
    pub include: IncludeRules,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames (e.g., ".DS_Store", "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns (e.g., "*.tmp", "node_modules/**").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Extensions without the dot (e.g., "bak", "tmp").
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl ButlerConfig {
    /// Loads configuration, applies environment overrides and expands `~`.
    ///
    /// Lookup order:
    /// 1. `config_path`, if provided
    /// 2. `.filebutler.toml` in the current directory
    /// 3. `~/.config/filebutler/config.toml`
    /// 4. Built-in defaults
    ///
    /// # Errors
    ///
    /// Fails if an explicitly given file is missing, if any file found is not
    /// valid TOML, or if an environment override cannot be parsed.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::locate_and_read(config_path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;

        let home = std::env::var_os("HOME").map(PathBuf::from);
        config.expand_home(home.as_deref());

        Ok(config)
    }

    fn locate_and_read(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_NAME);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Some(home_config) = Self::user_config_path()
            && home_config.exists()
        {
            return Self::load_from_file(&home_config);
        }

        debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// `~/.config/filebutler/config.toml`, when `HOME` is set.
    pub fn user_config_path() -> Option<PathBuf> {
        std::env::var_os("HOME").map(|home| {
            PathBuf::from(home)
                .join(".config")
                .join("filebutler")
                .join("config.toml")
        })
    }

    /// Reads a configuration file without overrides or `~` expansion.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path)?;
        let config = toml::from_str(&content).map_err(|e| ConfigError::Invalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Applies `FILEBUTLER_*` overrides read through `lookup`.
    ///
    /// Watch folders are comma-separated; blank entries are skipped.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup(ENV_ORGANIZE_ROOT) {
            debug!("{} overrides organize root", ENV_ORGANIZE_ROOT);
            self.paths.organize_root = PathBuf::from(root);
        }

        if let Some(folders) = lookup(ENV_WATCH_FOLDERS) {
            debug!("{} overrides watch folders", ENV_WATCH_FOLDERS);
            self.paths.watch_folders = folders
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(PathBuf::from)
                .collect();
        }

        if let Some(size) = lookup(ENV_MAX_FILE_SIZE_MB) {
            self.limits.max_file_size_mb =
                size.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        field: ENV_MAX_FILE_SIZE_MB.to_string(),
                        message: format!("expected a number, got '{}'", size),
                    })?;
        }

        Ok(())
    }

    /// Expands a leading `~` in every configured path against `home`.
    pub fn expand_home(&mut self, home: Option<&Path>) {
        self.paths.organize_root = expand_tilde(&self.paths.organize_root, home);
        for folder in &mut self.paths.watch_folders {
            *folder = expand_tilde(folder, home);
        }
    }

    /// Checks limits and extension formats, and that the filters compile.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.max_file_size_mb <= 0.0 {
            return Err(invalid_value(
                "limits.max_file_size_mb",
                "must be greater than 0",
            ));
        }

        if self.limits.max_batch_files == 0 {
            return Err(invalid_value(
                "limits.max_batch_files",
                "must be greater than 0",
            ));
        }

        if self.limits.max_batch_size_mb <= 0.0 {
            return Err(invalid_value(
                "limits.max_batch_size_mb",
                "must be greater than 0",
            ));
        }

        if let Some(bad) = self
            .files
            .supported_extensions
            .iter()
            .find(|ext| !ext.starts_with('.') || ext.len() < 2)
        {
            return Err(invalid_value(
                "files.supported_extensions",
                &format!("'{}' must start with a dot, e.g. '.pdf'", bad),
            ));
        }

        if self.paths.organize_root.as_os_str().is_empty() {
            return Err(invalid_value("paths.organize_root", "cannot be empty"));
        }

        self.filters.compile()?;
        Ok(())
    }

    /// Validation limits derived from this configuration.
    pub fn validation_policy(&self) -> ValidationPolicy {
        ValidationPolicy {
            max_file_size_mb: self.limits.max_file_size_mb,
            max_batch_files: self.limits.max_batch_files,
            max_batch_size_mb: self.limits.max_batch_size_mb,
            supported_extensions: self
                .files
                .supported_extensions
                .iter()
                .map(|e| e.to_lowercase())
                .collect(),
            ..ValidationPolicy::default()
        }
    }

    /// Filename cleaning options derived from this configuration.
    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            keep_spaces: self.naming.keep_spaces,
            max_length: Some(self.naming.max_length),
        }
    }

    /// Creates the organize root and one folder per category beneath it.
    ///
    /// Returns the directories that were ensured, root first.
    pub fn create_directories(&self) -> FileOpResult<Vec<PathBuf>> {
        let root = &self.paths.organize_root;
        let mut created = vec![ensure_directory(root)?];

        for category in Category::ALL {
            created.push(ensure_directory(&root.join(category.dir_name()))?);
        }

        info!(
            "Prepared {} directories under {}",
            created.len(),
            root.display()
        );
        Ok(created)
    }

    /// Serializes this configuration as pretty TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Writes this configuration to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml_string()?)?;
        info!("Wrote configuration to {}", path.display());
        Ok(())
    }
}

fn invalid_value(field: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn expand_tilde(path: &Path, home: Option<&Path>) -> PathBuf {
    let Some(home) = home else {
        return path.to_path_buf();
    };

    match path.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => path.to_path_buf(),
    }
}

impl FilterConfig {
    /// Compiles the rules into matchers.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob pattern is invalid.
    pub fn compile(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(self)
    }
}

/// Pre-compiled filter rules.
#[derive(Debug)]
pub struct CompiledFilters {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl CompiledFilters {
    fn new(rules: &FilterConfig) -> Result<Self, ConfigError> {
        let compile_globs = |patterns: &[String]| {
            patterns
                .iter()
                .map(|pattern| {
                    Pattern::new(pattern)
                        .map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
                })
                .collect::<Result<Vec<_>, _>>()
        };

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns: compile_globs(&rules.exclude.patterns)?,
            exclude_regexes,
            include_patterns: compile_globs(&rules.include.patterns)?,
        })
    }

    /// Decides whether a file should be picked up.
    ///
    /// Checked in order, stopping at the first match:
    /// 1. Include patterns - include
    /// 2. Hidden file while hidden files are disabled - exclude
    /// 3. Exact filename - exclude
    /// 4. Extension - exclude
    /// 5. Glob pattern - exclude
    /// 6. Regex on the file name - exclude
    /// 7. Otherwise include
    pub fn should_include(&self, file_path: &Path) -> bool {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self
            .include_patterns
            .iter()
            .any(|pattern| pattern.matches_path(file_path))
        {
            return true;
        }

        if !self.enable_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = file_path.extension()
            && self
                .exclude_extensions
                .contains(&ext.to_string_lossy().to_lowercase())
        {
            return false;
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches_path(file_path))
        {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
    }
}

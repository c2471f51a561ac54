use chrono::NaiveDate;
use filebutler::cli::{Command, run_command};
use filebutler::clock::{Clock, FixedClock};
use filebutler::config::ButlerConfig;
use filebutler::describe::{Entities, create_descriptive_filename_with_clock};
use filebutler::error::{Error, exit_codes};
use filebutler::normalize::clean_filename;
use filebutler::paths::build_organized_path_with_clock;
use filebutler::validators::{ValidationError, Validator};
/// Integration tests for filebutler
///
/// These tests drive the library the way the CLI does, against real files in
/// a temporary directory.
///
/// Test categories:
/// 1. Naming and path scenarios
/// 2. Validation
/// 3. Organizing and dry runs
/// 4. Configuration and filtering
/// 5. Setup
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A temporary workspace with an `inbox` of incoming files and an
/// `organized` root to file them into.
struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir(temp_dir.path().join("inbox")).expect("Failed to create inbox");
        TestFixture { temp_dir }
    }

    fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    fn inbox(&self) -> PathBuf {
        self.path().join("inbox")
    }

    fn root(&self) -> PathBuf {
        self.path().join("organized")
    }

    /// Create a file with content in the inbox.
    fn create_file(&self, name: &str, content: &[u8]) -> PathBuf {
        let file_path = self.inbox().join(name);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        let mut file = File::create(&file_path).expect("Failed to create file");
        file.write_all(content)
            .expect("Failed to write file content");
        file_path
    }

    fn create_text_file(&self, name: &str, content: &str) -> PathBuf {
        self.create_file(name, content.as_bytes())
    }

    /// Default configuration pointed at this fixture.
    fn config(&self) -> ButlerConfig {
        let mut config = ButlerConfig::default();
        config.paths.organize_root = self.root();
        config.paths.watch_folders = vec![self.inbox()];
        config
    }

    /// Write a TOML config file into the fixture and return its path.
    fn write_config(&self, content: &str) -> PathBuf {
        let config_path = self.path().join("filebutler.toml");
        fs::write(&config_path, content).expect("Failed to write config");
        config_path
    }

    fn organize(&self, config: &ButlerConfig, dry_run: bool) -> filebutler::Result<()> {
        let command = Command::Organize {
            sources: vec![],
            dry_run,
            recursive: false,
        };
        run_command(command, config, clock())
    }

    /// Path under the organized root for March 2024.
    fn dated(&self, category: &str, name: &str) -> PathBuf {
        self.root()
            .join(category)
            .join("2024")
            .join("March")
            .join(name)
    }

    fn assert_file_exists(&self, path: &Path) {
        assert!(
            path.exists() && path.is_file(),
            "File should exist: {}",
            path.display()
        );
    }

    fn assert_file_not_exists(&self, path: &Path) {
        assert!(!path.exists(), "File should not exist: {}", path.display());
    }

    /// List all files below `dir` recursively.
    fn list_files_recursive(dir: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        Self::walk_dir(dir, &mut files);
        files.sort();
        files
    }

    fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>) {
        if let Ok(entries) = fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_file() {
                    files.push(path);
                } else if path.is_dir() {
                    Self::walk_dir(&path, files);
                }
            }
        }
    }
}

fn march_15() -> FixedClock {
    FixedClock::from_date(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
}

fn clock() -> Box<dyn Clock> {
    Box::new(march_15())
}

// ============================================================================
// Test Data: Realistic File Content
// ============================================================================

/// PNG file header (minimal, just enough to be detected as PNG)
const PNG_HEADER: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
    0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR chunk
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, // 1x1 image
    0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53, // bit depth, color
    0xDE,
];

/// PDF file header (minimal)
const PDF_HEADER: &[u8] = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n";

/// MP3 file header (minimal)
const MP3_HEADER: &[u8] = &[0xFF, 0xFB, 0x10, 0x00]; // MPEG audio sync

// ============================================================================
// Test Suite 1: Naming and Paths
// ============================================================================

#[test]
fn test_clean_messy_download_name() {
    assert_eq!(
        clean_filename("invoice__FINAL_v2 (1) - Copy.pdf", true, Some(100)),
        "invoice_v2.pdf"
    );
}

#[test]
fn test_descriptive_invoice_name() {
    let entities = Entities {
        company: Some("Amazon.com Inc.".to_string()),
        invoice_number: Some("12345".to_string()),
        document_date: NaiveDate::from_ymd_opt(2024, 3, 15),
        ..Default::default()
    };

    let name = create_descriptive_filename_with_clock(
        "invoice",
        &entities,
        Some("scan_0001.pdf"),
        true,
        &march_15(),
    );

    assert_eq!(name, "amazon_invoice_in12345_2024-03-15.pdf");
}

#[test]
fn test_descriptive_name_falls_back_to_today() {
    let entities = Entities {
        person: Some("john doe".to_string()),
        ..Default::default()
    };

    let name =
        create_descriptive_filename_with_clock("contract", &entities, None, true, &march_15());

    assert_eq!(name, "johndoe_contract_2024-03-15.pdf");
}

#[test]
fn test_organized_path_with_dates() {
    let path = build_organized_path_with_clock(
        Path::new("Documents"),
        "Invoices",
        &["Amazon"],
        Some("x.pdf"),
        true,
        &march_15(),
    );

    assert_eq!(
        path.to_path_buf(),
        PathBuf::from("Documents/Invoices/2024/March/Amazon/x.pdf")
    );
}

#[test]
fn test_path_command_rejects_bad_subcategory() {
    let fixture = TestFixture::new();
    let command = Command::Path {
        category: "Invoices".to_string(),
        subcategories: vec!["../escape".to_string()],
        filename: None,
        base: None,
        no_date: false,
    };

    let result = run_command(command, &fixture.config(), clock());
    let err = result.expect_err("Subcategory with a slash should be rejected");
    assert_eq!(err.exit_code(), exit_codes::VALIDATION_ERROR);
}

// ============================================================================
// Test Suite 2: Validation
// ============================================================================

#[test]
fn test_reserved_name_rejected() {
    let validator = Validator::default();
    assert!(matches!(
        validator.validate_filename("CON.txt", false),
        Err(ValidationError::ReservedName(_))
    ));
}

#[test]
fn test_batch_of_101_files_rejected() {
    let fixture = TestFixture::new();
    let files: Vec<PathBuf> = (0..101)
        .map(|i| fixture.create_text_file(&format!("note_{}.txt", i), "x"))
        .collect();

    let result = Validator::default().validate_batch_operation(files.as_slice());
    assert!(matches!(
        result,
        Err(ValidationError::TooManyFiles { count: 101, max: 100 })
    ));

    assert!(
        Validator::default()
            .validate_batch_operation(&files[..100])
            .is_ok()
    );
}

#[test]
fn test_validate_command_reports_failures() {
    let fixture = TestFixture::new();
    let good = fixture.create_file("report.pdf", PDF_HEADER);
    let bad = fixture.create_text_file("installer.exe", "MZ");

    let ok = run_command(
        Command::Validate {
            paths: vec![good.clone()],
            strict: true,
            allowed_extensions: vec![],
        },
        &fixture.config(),
        clock(),
    );
    assert!(ok.is_ok(), "Result error: {:?}", ok.err());

    let result = run_command(
        Command::Validate {
            paths: vec![good, bad],
            strict: false,
            allowed_extensions: vec![],
        },
        &fixture.config(),
        clock(),
    );
    assert!(matches!(
        result,
        Err(Error::Validation(ValidationError::DangerousExtension(_)))
    ));
}

#[test]
fn test_validate_command_with_allow_list() {
    let fixture = TestFixture::new();
    let notes = fixture.create_text_file("notes.txt", "hello");

    let result = run_command(
        Command::Validate {
            paths: vec![notes],
            strict: false,
            allowed_extensions: vec![".pdf".to_string()],
        },
        &fixture.config(),
        clock(),
    );

    assert!(matches!(
        result,
        Err(Error::Validation(ValidationError::ExtensionNotAllowed { .. }))
    ));
}

#[test]
fn test_inspect_missing_file_is_file_operation_error() {
    let fixture = TestFixture::new();
    let result = run_command(
        Command::Inspect {
            path: fixture.inbox().join("nope.pdf"),
            json: true,
            sha256: false,
        },
        &fixture.config(),
        clock(),
    );

    let err = result.expect_err("Missing file should fail");
    assert_eq!(err.exit_code(), exit_codes::FILE_OPERATION_ERROR);
}

#[test]
fn test_inspect_existing_file() {
    let fixture = TestFixture::new();
    let file = fixture.create_file("photo.png", PNG_HEADER);

    let result = run_command(
        Command::Inspect {
            path: file,
            json: true,
            sha256: true,
        },
        &fixture.config(),
        clock(),
    );
    assert!(result.is_ok(), "Result error: {:?}", result.err());
}

// ============================================================================
// Test Suite 3: Organizing
// ============================================================================

#[test]
fn test_organize_empty_inbox() {
    let fixture = TestFixture::new();

    let result = fixture.organize(&fixture.config(), false);

    assert!(result.is_ok(), "Should succeed on empty inbox");
    assert!(!fixture.root().exists(), "Nothing should be created");
}

#[test]
fn test_organize_mixed_file_types() {
    let fixture = TestFixture::new();
    fixture.create_file("Invoice FINAL (1).PDF", PDF_HEADER);
    fixture.create_file("IMG 2041 - Copy.png", PNG_HEADER);
    fixture.create_file("song.mp3", MP3_HEADER);
    fixture.create_text_file("Budget 2024.xlsx", "not really a workbook");
    fixture.create_text_file("Copy of meeting notes.txt", "agenda");

    let result = fixture.organize(&fixture.config(), false);
    assert!(result.is_ok(), "Result error: {:?}", result.err());

    fixture.assert_file_exists(&fixture.dated("Documents", "invoice_final.pdf"));
    fixture.assert_file_exists(&fixture.dated("Images", "img_2041.png"));
    fixture.assert_file_exists(&fixture.dated("Audio", "song.mp3"));
    fixture.assert_file_exists(&fixture.dated("Spreadsheets", "budget_2024.xlsx"));
    fixture.assert_file_exists(&fixture.dated("Documents", "meeting_notes.txt"));

    assert!(
        TestFixture::list_files_recursive(&fixture.inbox()).is_empty(),
        "Inbox should be empty"
    );
}

#[test]
fn test_organize_preserves_file_content() {
    let fixture = TestFixture::new();
    fixture.create_text_file("letter.txt", "Dear reader");

    fixture.organize(&fixture.config(), false).unwrap();

    let moved = fixture.dated("Documents", "letter.txt");
    assert_eq!(fs::read_to_string(moved).unwrap(), "Dear reader");
}

#[test]
fn test_organize_without_date_folders() {
    let fixture = TestFixture::new();
    fixture.create_file("photo.png", PNG_HEADER);

    let mut config = fixture.config();
    config.naming.date_based = false;
    fixture.organize(&config, false).unwrap();

    fixture.assert_file_exists(&fixture.root().join("Images").join("photo.png"));
}

#[test]
fn test_organize_name_collision_gets_suffix() {
    let fixture = TestFixture::new();
    fixture.create_text_file("Report.txt", "first");
    fixture.create_text_file("report (1).txt", "second");

    fixture.organize(&fixture.config(), false).unwrap();

    let first = fixture.dated("Documents", "report.txt");
    let second = fixture.dated("Documents", "report_2.txt");
    fixture.assert_file_exists(&first);
    fixture.assert_file_exists(&second);

    let mut contents = vec![
        fs::read_to_string(first).unwrap(),
        fs::read_to_string(second).unwrap(),
    ];
    contents.sort();
    assert_eq!(contents, ["first", "second"]);
}

#[test]
fn test_organize_skips_dangerous_files() {
    let fixture = TestFixture::new();
    let exe = fixture.create_text_file("setup.exe", "MZ");
    fixture.create_file("photo.png", PNG_HEADER);

    let result = fixture.organize(&fixture.config(), false);
    assert!(result.is_ok(), "Unsafe files are skipped, not fatal");

    fixture.assert_file_exists(&exe);
    fixture.assert_file_exists(&fixture.dated("Images", "photo.png"));
}

#[test]
fn test_dry_run_doesnt_move_files() {
    let fixture = TestFixture::new();
    let pdf = fixture.create_file("report.pdf", PDF_HEADER);
    let png = fixture.create_file("photo.png", PNG_HEADER);

    let result = fixture.organize(&fixture.config(), true);
    assert!(result.is_ok(), "Result error: {:?}", result.err());

    fixture.assert_file_exists(&pdf);
    fixture.assert_file_exists(&png);
    assert!(!fixture.root().exists(), "Dry run should not create folders");
}

#[test]
fn test_organize_batch_limit() {
    let fixture = TestFixture::new();
    for name in ["a.txt", "b.txt", "c.txt"] {
        fixture.create_text_file(name, "x");
    }

    let mut config = fixture.config();
    config.limits.max_batch_files = 2;

    let result = fixture.organize(&config, false);
    assert!(matches!(
        result,
        Err(Error::Validation(ValidationError::TooManyFiles { count: 3, max: 2 }))
    ));

    assert_eq!(TestFixture::list_files_recursive(&fixture.inbox()).len(), 3);
}

#[test]
fn test_organize_explicit_file_source() {
    let fixture = TestFixture::new();
    let chosen = fixture.create_file("chosen.pdf", PDF_HEADER);
    let other = fixture.create_file("other.pdf", PDF_HEADER);

    let command = Command::Organize {
        sources: vec![chosen.clone()],
        dry_run: false,
        recursive: false,
    };
    run_command(command, &fixture.config(), clock()).unwrap();

    fixture.assert_file_not_exists(&chosen);
    fixture.assert_file_exists(&other);
    fixture.assert_file_exists(&fixture.dated("Documents", "chosen.pdf"));
}

#[test]
fn test_recursive_organize_skips_already_organized_files() {
    let fixture = TestFixture::new();
    fixture.create_text_file("projects/todo.txt", "ship it");

    // Root inside the inbox, so a recursive pass walks the organized tree too.
    let mut config = fixture.config();
    config.paths.organize_root = fixture.inbox().join("sorted");

    let organize = |config: &ButlerConfig| {
        run_command(
            Command::Organize {
                sources: vec![],
                dry_run: false,
                recursive: true,
            },
            config,
            clock(),
        )
    };

    organize(&config).unwrap();
    let expected = config
        .paths
        .organize_root
        .join("Documents")
        .join("2024")
        .join("March")
        .join("todo.txt");
    fixture.assert_file_exists(&expected);

    organize(&config).unwrap();
    fixture.assert_file_exists(&expected);
    assert_eq!(
        TestFixture::list_files_recursive(&fixture.inbox()),
        vec![expected]
    );
}

#[test]
fn test_recursive_organize_through_relative_source_keeps_filed_files() {
    // A fixture under the working directory can be named by a relative path.
    let temp_dir = tempfile::Builder::new()
        .prefix("relative_fixture")
        .tempdir_in(".")
        .expect("Failed to create temp directory");
    let cwd = std::env::current_dir().expect("Failed to read current directory");
    let base = temp_dir
        .path()
        .strip_prefix(&cwd)
        .unwrap_or(temp_dir.path())
        .to_path_buf();
    assert!(base.is_relative());

    let relative_root = base.join("organized");
    let filed = relative_root
        .join("Documents")
        .join("2024")
        .join("March")
        .join("report.pdf");
    fs::create_dir_all(filed.parent().unwrap()).expect("Failed to create folders");
    fs::write(&filed, PDF_HEADER).expect("Failed to write file");

    let mut config = ButlerConfig::default();
    config.paths.organize_root =
        std::path::absolute(&relative_root).expect("Failed to resolve root");

    let april = FixedClock::from_date(NaiveDate::from_ymd_opt(2024, 4, 2).unwrap());
    let command = Command::Organize {
        sources: vec![relative_root.clone()],
        dry_run: false,
        recursive: true,
    };
    let result = run_command(command, &config, Box::new(april));
    assert!(result.is_ok(), "Result error: {:?}", result.err());

    assert!(filed.is_file(), "Filed document should stay in March");
    assert!(
        !relative_root
            .join("Documents")
            .join("2024")
            .join("April")
            .exists(),
        "Nothing should be refiled under April"
    );
}

// ============================================================================
// Test Suite 4: Configuration and Filtering
// ============================================================================

#[test]
fn test_organize_with_exclude_pattern() {
    let fixture = TestFixture::new();
    let config_path = fixture.write_config(
        r#"
[filters.exclude]
patterns = ["*.tmp"]
"#,
    );

    fixture.create_file("photo.png", PNG_HEADER);
    let tmp = fixture.create_text_file("temp.tmp", "temporary file");

    let mut config = ButlerConfig::load_from_file(&config_path).unwrap();
    config.paths.organize_root = fixture.root();
    config.paths.watch_folders = vec![fixture.inbox()];

    let result = fixture.organize(&config, false);
    assert!(result.is_ok(), "Result error: {:?}", result.err());

    fixture.assert_file_exists(&fixture.dated("Images", "photo.png"));
    fixture.assert_file_exists(&tmp);
}

#[test]
fn test_organize_hidden_files_excluded_by_default() {
    let fixture = TestFixture::new();
    fixture.create_file("photo.png", PNG_HEADER);
    let hidden = fixture.create_text_file(".hidden_config", "config");

    fixture.organize(&fixture.config(), false).unwrap();

    fixture.assert_file_exists(&fixture.dated("Images", "photo.png"));
    fixture.assert_file_exists(&hidden);
}

#[test]
fn test_load_config_file() {
    let fixture = TestFixture::new();
    let config_path = fixture.write_config(
        r#"
[paths]
organize_root = "~/Sorted"
watch_folders = ["~/Inbox", "/tmp/drop"]

[limits]
max_file_size_mb = 25.0

[naming]
keep_spaces = false
max_length = 0
date_based = false
"#,
    );

    let mut config = ButlerConfig::load_from_file(&config_path).unwrap();
    config.expand_home(Some(Path::new("/home/tester")));

    assert_eq!(config.paths.organize_root, PathBuf::from("/home/tester/Sorted"));
    assert_eq!(
        config.paths.watch_folders,
        vec![PathBuf::from("/home/tester/Inbox"), PathBuf::from("/tmp/drop")]
    );
    assert_eq!(config.limits.max_file_size_mb, 25.0);
    assert_eq!(config.limits.max_batch_files, 100);
    assert!(!config.naming.keep_spaces);
    assert!(config.validate().is_ok());
}

#[test]
fn test_invalid_config_is_config_error() {
    let fixture = TestFixture::new();
    let config_path = fixture.write_config("[limits]\nmax_file_size_mb = \"big\"\n");

    let err: Error = ButlerConfig::load_from_file(&config_path)
        .expect_err("Non-numeric limit should fail")
        .into();
    assert_eq!(err.exit_code(), exit_codes::CONFIG_ERROR);
}

#[test]
fn test_invalid_regex_filter_fails_organize() {
    let fixture = TestFixture::new();
    fixture.create_text_file("notes.txt", "x");

    let mut config = fixture.config();
    config.filters.exclude.regex = vec!["([unclosed".to_string()];

    let result = fixture.organize(&config, false);
    assert!(matches!(result, Err(Error::Config(_))));
    fixture.assert_file_exists(&fixture.inbox().join("notes.txt"));
}

// ============================================================================
// Test Suite 5: Setup
// ============================================================================

#[test]
fn test_init_creates_tree_and_config() {
    let fixture = TestFixture::new();
    let config = fixture.config();
    let output = fixture.path().join("conf").join("config.toml");

    let command = Command::Init {
        output: Some(output.clone()),
        force: false,
    };
    run_command(command, &config, clock()).unwrap();

    for dir in ["Documents", "Images", "Spreadsheets", "Archives", "Other"] {
        assert!(fixture.root().join(dir).is_dir(), "Missing {}", dir);
    }

    let saved = ButlerConfig::load_from_file(&output).unwrap();
    assert_eq!(saved.paths.organize_root, fixture.root());
}

#[test]
fn test_init_keeps_existing_config_without_force() {
    let fixture = TestFixture::new();
    let output = fixture.write_config("# hand-written\n");

    let command = Command::Init {
        output: Some(output.clone()),
        force: false,
    };
    run_command(command, &fixture.config(), clock()).unwrap();
    assert_eq!(fs::read_to_string(&output).unwrap(), "# hand-written\n");

    let command = Command::Init {
        output: Some(output.clone()),
        force: true,
    };
    run_command(command, &fixture.config(), clock()).unwrap();
    assert_ne!(fs::read_to_string(&output).unwrap(), "# hand-written\n");
}

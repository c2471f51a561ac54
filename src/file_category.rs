//! Broad file-type categories and the MIME/extension lookups that feed them.
//!
//! # Examples
//!
//! ```
//! use filebutler::file_category::{Category, FileMapper};
//!
//! let mapper = FileMapper::default();
//! assert_eq!(mapper.mime_to_category("image/png"), Some(Category::Image));
//! assert_eq!(mapper.extension_to_category("xlsx"), Some(Category::Spreadsheet));
//! assert_eq!(mapper.categorize(None, Some("yaml")), Category::Data);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// A broad file category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// PDF, Word, plain text, RTF, OpenDocument text
    Document,
    /// Excel, CSV, OpenDocument spreadsheets
    Spreadsheet,
    /// PowerPoint, OpenDocument presentations
    Presentation,
    Image,
    Video,
    Audio,
    /// ZIP, RAR, 7z, tarballs
    Archive,
    /// Source files, plus JSON and XML
    Code,
    /// YAML, SQL and TOML
    Data,
    Other,
}

impl Category {
    /// Every category, in lookup order.
    pub const ALL: [Category; 10] = [
        Category::Document,
        Category::Spreadsheet,
        Category::Presentation,
        Category::Image,
        Category::Video,
        Category::Audio,
        Category::Archive,
        Category::Code,
        Category::Data,
        Category::Other,
    ];

    /// Lowercase identifier, e.g. `"spreadsheet"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Document => "document",
            Category::Spreadsheet => "spreadsheet",
            Category::Presentation => "presentation",
            Category::Image => "image",
            Category::Video => "video",
            Category::Audio => "audio",
            Category::Archive => "archive",
            Category::Code => "code",
            Category::Data => "data",
            Category::Other => "other",
        }
    }

    /// Folder name used under the organize root.
    ///
    /// # Examples
    ///
    /// ```
    /// use filebutler::file_category::Category;
    ///
    /// assert_eq!(Category::Document.dir_name(), "Documents");
    /// assert_eq!(Category::Audio.dir_name(), "Audio");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Document => "Documents",
            Category::Spreadsheet => "Spreadsheets",
            Category::Presentation => "Presentations",
            Category::Image => "Images",
            Category::Video => "Videos",
            Category::Audio => "Audio",
            Category::Archive => "Archives",
            Category::Code => "Code",
            Category::Data => "Data",
            Category::Other => "Other",
        }
    }

    fn extensions(&self) -> &'static [&'static str] {
        match self {
            Category::Document => &["pdf", "doc", "docx", "txt", "rtf", "odt"],
            Category::Spreadsheet => &["xls", "xlsx", "csv", "ods"],
            Category::Presentation => &["ppt", "pptx", "odp"],
            Category::Image => &["jpg", "jpeg", "png", "gif", "bmp", "svg", "webp"],
            Category::Video => &["mp4", "avi", "mov", "wmv", "flv", "mkv"],
            Category::Audio => &["mp3", "wav", "flac", "aac", "ogg", "wma"],
            Category::Archive => &["zip", "rar", "7z", "tar", "gz", "bz2"],
            Category::Code => &["py", "js", "java", "cpp", "c", "html", "css", "json", "xml"],
            Category::Data => &["json", "xml", "yaml", "yml", "sql", "toml"],
            Category::Other => &[],
        }
    }

    fn mime_types(&self) -> &'static [&'static str] {
        match self {
            Category::Document => &[
                "application/pdf",
                "application/msword",
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                "application/rtf",
                "application/vnd.oasis.opendocument.text",
                "text/plain",
                "text/markdown",
            ],
            Category::Spreadsheet => &[
                "application/vnd.ms-excel",
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                "application/vnd.oasis.opendocument.spreadsheet",
                "text/csv",
            ],
            Category::Presentation => &[
                "application/vnd.ms-powerpoint",
                "application/vnd.openxmlformats-officedocument.presentationml.presentation",
                "application/vnd.oasis.opendocument.presentation",
            ],
            Category::Image => &[
                "image/png",
                "image/jpeg",
                "image/gif",
                "image/bmp",
                "image/svg+xml",
                "image/webp",
                "image/tiff",
            ],
            Category::Video => &[
                "video/mp4",
                "video/x-msvideo",
                "video/quicktime",
                "video/x-ms-wmv",
                "video/x-flv",
                "video/x-matroska",
            ],
            Category::Audio => &[
                "audio/mpeg",
                "audio/x-wav",
                "audio/wav",
                "audio/x-flac",
                "audio/flac",
                "audio/aac",
                "audio/ogg",
            ],
            Category::Archive => &[
                "application/zip",
                "application/vnd.rar",
                "application/x-rar-compressed",
                "application/x-7z-compressed",
                "application/x-tar",
                "application/gzip",
                "application/x-bzip2",
            ],
            Category::Code => &[
                "text/x-python",
                "text/javascript",
                "application/javascript",
                "text/x-java",
                "text/x-c",
                "text/html",
                "text/css",
                "application/json",
                "application/xml",
                "text/xml",
            ],
            Category::Data => &["application/x-yaml", "text/x-yaml", "application/sql"],
            Category::Other => &[],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps MIME types and file extensions to categories.
///
/// Lookups are case-insensitive. When an extension appears under several
/// categories the earliest in [`Category::ALL`] wins, so `json` and `xml`
/// resolve to [`Category::Code`].
#[derive(Debug, Clone)]
pub struct FileMapper {
    mime_map: HashMap<String, Category>,
    extension_map: HashMap<String, Category>,
}

impl FileMapper {
    /// Creates a mapper populated with the standard tables.
    pub fn new() -> Self {
        let mut mapper = Self {
            mime_map: HashMap::new(),
            extension_map: HashMap::new(),
        };

        for category in Category::ALL {
            for mime in category.mime_types() {
                mapper.mime_map.entry(mime.to_string()).or_insert(category);
            }
            for ext in category.extensions() {
                mapper.extension_map.entry(ext.to_string()).or_insert(category);
            }
        }

        mapper
    }

    /// Adds or replaces a MIME type mapping.
    pub fn add_mime_mapping(&mut self, mime: &str, category: Category) {
        self.mime_map.insert(mime.to_lowercase(), category);
    }

    /// Adds or replaces an extension mapping. A leading dot is ignored.
    pub fn add_extension_mapping(&mut self, ext: &str, category: Category) {
        self.extension_map
            .insert(normalize_extension(ext), category);
    }

    pub fn mime_to_category(&self, mime_type: &str) -> Option<Category> {
        self.mime_map.get(&mime_type.to_lowercase()).copied()
    }

    /// Maps an extension, with or without its leading dot.
    pub fn extension_to_category(&self, ext: &str) -> Option<Category> {
        self.extension_map.get(&normalize_extension(ext)).copied()
    }

    /// Picks a category from a MIME type and/or extension.
    ///
    /// The MIME type is tried first, then the extension, then
    /// [`Category::Other`].
    pub fn categorize(&self, mime_type: Option<&str>, ext: Option<&str>) -> Category {
        if let Some(mime) = mime_type
            && let Some(category) = self.mime_to_category(mime)
        {
            return category;
        }

        if let Some(extension) = ext
            && let Some(category) = self.extension_to_category(extension)
        {
            return category;
        }

        Category::Other
    }
}

impl Default for FileMapper {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim_start_matches('.').to_lowercase()
}

/// Categorizes a path by its extension alone.
///
/// # Examples
///
/// ```
/// use filebutler::file_category::{Category, get_file_type_category};
/// use std::path::Path;
///
/// assert_eq!(get_file_type_category(Path::new("deck.PPTX")), Category::Presentation);
/// assert_eq!(get_file_type_category(Path::new("notes")), Category::Other);
/// ```
pub fn get_file_type_category(path: &Path) -> Category {
    let extension = path.extension().map(|e| e.to_string_lossy());
    FileMapper::default().categorize(None, extension.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_names() {
        assert_eq!(Category::Spreadsheet.as_str(), "spreadsheet");
        assert_eq!(Category::Spreadsheet.dir_name(), "Spreadsheets");
        assert_eq!(Category::Other.to_string(), "other");
    }

    #[test]
    fn test_extension_lookup_case_and_dot_insensitive() {
        let mapper = FileMapper::default();
        assert_eq!(mapper.extension_to_category("PDF"), Some(Category::Document));
        assert_eq!(mapper.extension_to_category(".Mp3"), Some(Category::Audio));
        assert_eq!(mapper.extension_to_category("exe"), None);
    }

    #[test]
    fn test_overlapping_extensions_resolve_to_code() {
        let mapper = FileMapper::default();
        assert_eq!(mapper.extension_to_category("json"), Some(Category::Code));
        assert_eq!(mapper.extension_to_category("xml"), Some(Category::Code));
        assert_eq!(mapper.extension_to_category("yml"), Some(Category::Data));
    }

    #[test]
    fn test_mime_lookup() {
        let mapper = FileMapper::default();
        assert_eq!(mapper.mime_to_category("IMAGE/PNG"), Some(Category::Image));
        assert_eq!(mapper.mime_to_category("text/csv"), Some(Category::Spreadsheet));
        assert_eq!(mapper.mime_to_category("unknown/type"), None);
    }

    #[test]
    fn test_categorize_prefers_mime() {
        let mapper = FileMapper::default();
        assert_eq!(
            mapper.categorize(Some("image/jpeg"), Some("txt")),
            Category::Image
        );
        assert_eq!(
            mapper.categorize(Some("unknown/type"), Some("zip")),
            Category::Archive
        );
        assert_eq!(mapper.categorize(None, None), Category::Other);
    }

    #[test]
    fn test_custom_mapping() {
        let mut mapper = FileMapper::default();
        mapper.add_extension_mapping(".ledger", Category::Data);
        mapper.add_mime_mapping("Application/X-Ledger", Category::Data);

        assert_eq!(mapper.extension_to_category("ledger"), Some(Category::Data));
        assert_eq!(
            mapper.mime_to_category("application/x-ledger"),
            Some(Category::Data)
        );
    }

    #[test]
    fn test_get_file_type_category() {
        assert_eq!(
            get_file_type_category(Path::new("a/b/Report.DOCX")),
            Category::Document
        );
        assert_eq!(get_file_type_category(Path::new("movie.mkv")), Category::Video);
        assert_eq!(get_file_type_category(Path::new("schema.sql")), Category::Data);
        assert_eq!(get_file_type_category(Path::new("tool.exe")), Category::Other);
        assert_eq!(get_file_type_category(Path::new("Makefile")), Category::Other);
    }
}

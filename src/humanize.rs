//! Human-friendly display helpers: sizes, relative times, month names and
//! small naming utilities.

use chrono::{Month, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;

static RE_RESOLUTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+x\d+)").expect("Invalid regex"));

/// Converts a byte count to a display string starting at `bytes`.
///
/// # Examples
///
/// ```
/// use filebutler::humanize::humanize_file_size;
///
/// assert_eq!(humanize_file_size(500), "500 bytes");
/// assert_eq!(humanize_file_size(1024), "1.0 KB");
/// assert_eq!(humanize_file_size(1_073_741_824), "1.0 GB");
/// ```
pub fn humanize_file_size(size_bytes: u64) -> String {
    if size_bytes < 1024 {
        return format!("{} bytes", size_bytes);
    }

    let mut size = size_bytes as f64 / 1024.0;
    for unit in ["KB", "MB", "GB", "TB"] {
        if size < 1024.0 {
            return format!("{:.1} {}", size, unit);
        }
        size /= 1024.0;
    }

    format!("{:.1} PB", size)
}

/// Converts a byte count to a compact display string such as `1.5 MB`.
pub fn format_file_size(size_bytes: u64) -> String {
    let mut size = size_bytes as f64;
    for unit in ["B", "KB", "MB", "GB", "TB"] {
        if size < 1024.0 {
            return format!("{:.1} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.1} PB", size)
}

/// Describes how long ago `timestamp` was, relative to `now`.
///
/// Falls back to an absolute date (`March 15, 2024`) past thirty days.
pub fn format_time_ago(timestamp: NaiveDateTime, now: NaiveDateTime) -> String {
    let seconds = (now - timestamp).num_seconds();

    match seconds {
        s if s < 60 => "just now".to_string(),
        s if s < 3_600 => plural(s / 60, "minute"),
        s if s < 86_400 => plural(s / 3_600, "hour"),
        s if s < 172_800 => "yesterday".to_string(),
        s if s < 604_800 => format!("{} days ago", s / 86_400),
        s if s < 2_592_000 => plural(s / 604_800, "week"),
        _ => timestamp.format("%B %d, %Y").to_string(),
    }
}

fn plural(count: i64, unit: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{} {}{} ago", count, unit, suffix)
}

/// Returns the full English month name for 1–12, or `Month<n>` otherwise.
pub fn format_month_name(month_number: u32) -> String {
    u8::try_from(month_number)
        .ok()
        .and_then(|n| Month::try_from(n).ok())
        .map(|month| month.name().to_string())
        .unwrap_or_else(|| format!("Month{}", month_number))
}

/// Shortens `text` to `max_length` characters, ending with `suffix` when cut.
pub fn truncate_text(text: &str, max_length: usize, suffix: &str) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }

    let keep = max_length.saturating_sub(suffix.chars().count());
    let head: String = text.chars().take(keep).collect();
    format!("{}{}", head.trim_end(), suffix)
}

/// Returns `base_name`, or `base_name_<n>` with the smallest `n >= 2` not
/// already taken.
pub fn generate_unique_suffix<S: AsRef<str>>(base_name: &str, existing_names: &[S]) -> String {
    let taken = |candidate: &str| existing_names.iter().any(|n| n.as_ref() == candidate);

    if !taken(base_name) {
        return base_name.to_string();
    }

    let mut counter = 2;
    while taken(&format!("{}_{}", base_name, counter)) {
        counter += 1;
    }
    format!("{}_{}", base_name, counter)
}

/// Builds a standardized screenshot filename stamped with `now`.
///
/// macOS-style originals (`... at 2.34.56 PM`) get a `_macos` marker and
/// names carrying a resolution such as `1920x1080` keep it.
pub fn create_screenshot_filename(original: Option<&str>, now: NaiveDateTime) -> String {
    let display_info = match original {
        Some(name) if name.to_lowercase().contains("at") => "_macos".to_string(),
        Some(name) => RE_RESOLUTION
            .captures(name)
            .and_then(|caps| caps.get(1))
            .map(|m| format!("_{}", m.as_str()))
            .unwrap_or_default(),
        None => String::new(),
    };

    format!("screenshot_{}{}.png", now.format("%Y%m%d_%H%M%S"), display_info)
}

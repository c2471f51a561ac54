//! Descriptive filename composition.
//!
//! Builds human-readable filenames such as `amazon_invoice_in12345_2024-03-15.pdf`
//! from a document type and a bag of extracted entities. The entities are
//! supplied by the caller; nothing here tries to derive them.

use crate::clock::{Clock, SystemClock};
use crate::normalize::{DEFAULT_MAX_LENGTH, clean_filename};
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::LazyLock;

/// Extension used when the original name does not provide one.
pub const DEFAULT_EXTENSION: &str = ".pdf";

const MAX_COMPANY_LENGTH: usize = 30;
const MAX_REFERENCE_LENGTH: usize = 10;

/// Known document types and their filename spelling, in lookup order.
const DOCUMENT_TYPES: &[(&str, &str)] = &[
    ("invoice", "Invoice"),
    ("receipt", "Receipt"),
    ("contract", "Contract"),
    ("agreement", "Agreement"),
    ("proposal", "Proposal"),
    ("report", "Report"),
    ("statement", "Statement"),
    ("tax", "TaxDoc"),
    ("resume", "Resume"),
    ("cv", "CV"),
    ("letter", "Letter"),
    ("memo", "Memo"),
    ("presentation", "Presentation"),
    ("spreadsheet", "Spreadsheet"),
    ("form", "Form"),
    ("application", "Application"),
    ("certificate", "Certificate"),
    ("license", "License"),
    ("policy", "Policy"),
    ("manual", "Manual"),
    ("guide", "Guide"),
];

/// Legal-entity suffixes stripped from company names, in stripping order.
const COMPANY_SUFFIXES: &[&str] = &[
    "Inc",
    "LLC",
    "Ltd",
    "Corporation",
    "Corp",
    "Company",
    "Co",
    "Group",
    "Holdings",
    "Limited",
    "GmbH",
    "AG",
    "SA",
    "PLC",
    "LLP",
    "LP",
];

static RE_COMPANY_SUFFIXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    COMPANY_SUFFIXES
        .iter()
        .map(|suffix| {
            Regex::new(&format!(r"(?i)\s*\b{}\b\.?\s*$", regex::escape(suffix)))
                .expect("Invalid regex")
        })
        .collect()
});

static RE_WEB_DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(com|net|org|io|co\.uk|co|de)\s*$").expect("Invalid regex")
});

static RE_LEADING_THE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*the\s+").expect("Invalid regex"));

static RE_NON_WORD_SPACE_HYPHEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("Invalid regex"));

static RE_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid regex"));

static RE_NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\W").expect("Invalid regex"));

/// Attributes of a document, extracted elsewhere and passed in verbatim.
///
/// Every field is optional; empty strings are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entities {
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub person: Option<String>,
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub document_date: Option<NaiveDate>,
}

impl Entities {
    fn company(&self) -> Option<&str> {
        non_empty(self.company.as_deref())
    }

    fn person(&self) -> Option<&str> {
        non_empty(self.person.as_deref())
    }

    fn invoice_number(&self) -> Option<&str> {
        non_empty(self.invoice_number.as_deref())
    }

    fn reference(&self) -> Option<&str> {
        non_empty(self.reference.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Date layouts usable in filenames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateStyle {
    /// `20240315`
    Compact,
    /// `2024-03-15`
    #[default]
    Readable,
    /// `2024-03-15_143045`
    Full,
    /// `03-15-2024`
    American,
    /// `15-03-2024`
    European,
}

impl DateStyle {
    fn pattern(self) -> &'static str {
        match self {
            DateStyle::Compact => "%Y%m%d",
            DateStyle::Readable => "%Y-%m-%d",
            DateStyle::Full => "%Y-%m-%d_%H%M%S",
            DateStyle::American => "%m-%d-%Y",
            DateStyle::European => "%d-%m-%Y",
        }
    }
}

impl FromStr for DateStyle {
    type Err = std::convert::Infallible;

    /// Parses a style name; unknown names fall back to [`DateStyle::Readable`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "compact" => DateStyle::Compact,
            "full" => DateStyle::Full,
            "american" => DateStyle::American,
            "european" => DateStyle::European,
            _ => DateStyle::Readable,
        })
    }
}

/// Formats a timestamp for use in a filename.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use filebutler::describe::{format_date_for_filename, DateStyle};
///
/// let when = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap().and_hms_opt(14, 30, 45).unwrap();
/// assert_eq!(format_date_for_filename(when, DateStyle::Compact), "20240315");
/// assert_eq!(format_date_for_filename(when, DateStyle::Full), "2024-03-15_143045");
/// ```
pub fn format_date_for_filename(when: NaiveDateTime, style: DateStyle) -> String {
    when.format(style.pattern()).to_string()
}

/// Composes a descriptive filename using the system clock for the default date.
///
/// See [`create_descriptive_filename_with_clock`].
pub fn create_descriptive_filename(
    document_type: &str,
    entities: &Entities,
    original_name: Option<&str>,
    include_date: bool,
) -> String {
    create_descriptive_filename_with_clock(
        document_type,
        entities,
        original_name,
        include_date,
        &SystemClock,
    )
}

/// Composes a descriptive filename from a document type and its entities.
///
/// The parts, in order, are the primary subject (company, else person), the
/// formatted document type, an identifier (`IN<invoice number>`, else the
/// first ten characters of the reference) and, when `include_date` is set,
/// the document date or today's date as `YYYY-MM-DD`. Empty parts are
/// skipped. The extension comes from `original_name` or defaults to `.pdf`,
/// and the whole name goes through [`clean_filename`].
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use filebutler::clock::FixedClock;
/// use filebutler::describe::{create_descriptive_filename_with_clock, Entities};
///
/// let entities = Entities {
///     company: Some("Amazon.com Inc.".to_string()),
///     invoice_number: Some("12345".to_string()),
///     document_date: NaiveDate::from_ymd_opt(2024, 3, 15),
///     ..Default::default()
/// };
/// let clock = FixedClock::from_date(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
///
/// assert_eq!(
///     create_descriptive_filename_with_clock("invoice", &entities, Some("download.pdf"), true, &clock),
///     "amazon_invoice_in12345_2024-03-15.pdf"
/// );
/// ```
pub fn create_descriptive_filename_with_clock(
    document_type: &str,
    entities: &Entities,
    original_name: Option<&str>,
    include_date: bool,
    clock: &dyn Clock,
) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(company) = entities.company() {
        parts.push(clean_company_name(company));
    } else if let Some(person) = entities.person() {
        parts.push(format_person_name(person));
    }

    parts.push(format_document_type(document_type));

    if let Some(number) = entities.invoice_number() {
        parts.push(format!("IN{}", number));
    } else if let Some(reference) = entities.reference() {
        parts.push(reference.chars().take(MAX_REFERENCE_LENGTH).collect());
    }

    if include_date {
        let date = entities.document_date.unwrap_or_else(|| clock.today());
        let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
        parts.push(format_date_for_filename(midnight, DateStyle::Readable));
    }

    let extension = original_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| format!(".{}", ext.to_lowercase()))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());

    let joined = parts
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    clean_filename(&(joined + &extension), true, Some(DEFAULT_MAX_LENGTH))
}

/// Maps a raw document type to its filename spelling.
///
/// Tries an exact match on the lowercased input, then the first known type
/// contained in it, and otherwise capitalizes the input.
///
/// # Examples
///
/// ```
/// use filebutler::describe::format_document_type;
///
/// assert_eq!(format_document_type("tax"), "TaxDoc");
/// assert_eq!(format_document_type("Monthly Statement"), "Statement");
/// assert_eq!(format_document_type("blueprint"), "Blueprint");
/// ```
pub fn format_document_type(doc_type: &str) -> String {
    let lower = doc_type.to_lowercase();

    if let Some((_, formatted)) = DOCUMENT_TYPES.iter().find(|(key, _)| *key == lower) {
        return formatted.to_string();
    }

    if let Some((_, formatted)) = DOCUMENT_TYPES.iter().find(|(key, _)| lower.contains(key)) {
        return formatted.to_string();
    }

    capitalize(doc_type)
}

/// Cleans a company name for use in a filename.
///
/// `"Amazon.com Inc."` becomes `"Amazon"`, `"The Home Depot"` becomes
/// `"HomeDepot"`. The result is at most 30 characters.
pub fn clean_company_name(company: &str) -> String {
    let mut name = company.to_string();

    for suffix in RE_COMPANY_SUFFIXES.iter() {
        name = suffix.replace(&name, "").into_owned();
    }

    name = RE_WEB_DOMAIN.replace(&name, "").into_owned();
    name = RE_LEADING_THE.replace(&name, "").into_owned();
    name = RE_NON_WORD_SPACE_HYPHEN.replace_all(&name, "").into_owned();
    name = RE_WHITESPACE.replace_all(&name, "").into_owned();

    name.chars().take(MAX_COMPANY_LENGTH).collect()
}

/// Formats a person's name for use in a filename.
///
/// `"Last, First"` is reordered to `"First Last"`, only the first and last
/// tokens are kept, and the joined result is capitalized as a whole:
/// `"John A. Doe"` becomes `"Johndoe"`.
pub fn format_person_name(person: &str) -> String {
    let reordered = match person.split_once(',') {
        Some((last, first)) => format!("{} {}", first.trim(), last.trim()),
        None => person.to_string(),
    };

    let tokens: Vec<&str> = reordered.split_whitespace().collect();
    let joined = match tokens.as_slice() {
        [first, .., last] => format!("{}{}", first, last),
        _ => tokens.concat(),
    };

    capitalize(&RE_NON_WORD.replace_all(&joined, ""))
}

/// Uppercases the first character and lowercases the rest.
fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => {
            let mut out: String = first.to_uppercase().collect();
            out.push_str(&chars.as_str().to_lowercase());
            out
        }
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn clock() -> FixedClock {
        FixedClock::from_date(date(2025, 6, 1))
    }

    #[test]
    fn test_descriptive_invoice_with_company() {
        let entities = Entities {
            company: Some("Amazon.com Inc.".to_string()),
            invoice_number: Some("12345".to_string()),
            document_date: Some(date(2024, 3, 15)),
            ..Default::default()
        };

        let name = create_descriptive_filename_with_clock(
            "invoice",
            &entities,
            Some("download.pdf"),
            true,
            &clock(),
        );
        assert_eq!(name, "amazon_invoice_in12345_2024-03-15.pdf");
    }

    #[test]
    fn test_descriptive_contract_with_person_and_reference() {
        let entities = Entities {
            person: Some("John A. Doe".to_string()),
            reference: Some("AGR-2024-0315".to_string()),
            ..Default::default()
        };

        let name = create_descriptive_filename_with_clock(
            "contract",
            &entities,
            Some("scan0001.pdf"),
            true,
            &clock(),
        );
        assert_eq!(name, "johndoe_contract_agr-2024-0_2025-06-01.pdf");
    }

    #[test]
    fn test_descriptive_company_preferred_over_person() {
        let entities = Entities {
            company: Some("The Home Depot".to_string()),
            person: Some("Jane Smith".to_string()),
            ..Default::default()
        };

        let name =
            create_descriptive_filename_with_clock("report", &entities, Some("untitled.docx"), false, &clock());
        assert_eq!(name, "homedepot_report.docx");
    }

    #[test]
    fn test_descriptive_defaults_to_pdf_and_today() {
        let name =
            create_descriptive_filename_with_clock("receipt", &Entities::default(), None, true, &clock());
        assert_eq!(name, "receipt_2025-06-01.pdf");

        let name = create_descriptive_filename_with_clock(
            "receipt",
            &Entities::default(),
            Some("no_extension"),
            false,
            &clock(),
        );
        assert_eq!(name, "receipt.pdf");
    }

    #[test]
    fn test_descriptive_empty_entities_are_skipped() {
        let entities = Entities {
            company: Some(String::new()),
            person: Some("Doe, Jane".to_string()),
            invoice_number: Some(String::new()),
            ..Default::default()
        };

        let name =
            create_descriptive_filename_with_clock("memo", &entities, Some("a.TXT"), false, &clock());
        assert_eq!(name, "janedoe_memo.txt");
    }

    #[test]
    fn test_descriptive_degenerate_input() {
        let entities = Entities {
            company: Some("Inc.".to_string()),
            ..Default::default()
        };
        let name = create_descriptive_filename_with_clock("", &entities, Some(""), false, &clock());
        assert_eq!(name, "unnamed.pdf");
    }

    #[test]
    fn test_format_document_type() {
        assert_eq!(format_document_type("invoice"), "Invoice");
        assert_eq!(format_document_type("INVOICE"), "Invoice");
        assert_eq!(format_document_type("cv"), "CV");
        assert_eq!(format_document_type("invoices"), "Invoice");
        assert_eq!(format_document_type("tax return"), "TaxDoc");
        assert_eq!(format_document_type("bLUEPRINT"), "Blueprint");
        assert_eq!(format_document_type(""), "");
    }

    #[test]
    fn test_clean_company_name() {
        assert_eq!(clean_company_name("Amazon.com Inc."), "Amazon");
        assert_eq!(clean_company_name("The Home Depot"), "HomeDepot");
        assert_eq!(clean_company_name("Acme Corp."), "Acme");
        assert_eq!(clean_company_name("Acme Holdings Inc"), "Acme");
        assert_eq!(clean_company_name("Siemens AG"), "Siemens");
        assert_eq!(clean_company_name("Smith & Wesson LLC"), "SmithWesson");
        assert_eq!(clean_company_name("Coca-Cola Company"), "Coca-Cola");
    }

    #[test]
    fn test_clean_company_name_suffix_needs_word_boundary() {
        assert_eq!(clean_company_name("Costco"), "Costco");
        assert_eq!(clean_company_name("Disco"), "Disco");
    }

    #[test]
    fn test_clean_company_name_truncates() {
        let name = clean_company_name("International Business Machines Worldwide Services");
        assert_eq!(name.chars().count(), 30);
        assert_eq!(name, "InternationalBusinessMachinesW");
    }

    #[test]
    fn test_format_person_name() {
        assert_eq!(format_person_name("John A. Doe"), "Johndoe");
        assert_eq!(format_person_name("doe, jane"), "Janedoe");
        assert_eq!(format_person_name("Cher"), "Cher");
        assert_eq!(format_person_name("O'Brien, Pat"), "Patobrien");
        assert_eq!(format_person_name("   "), "");
    }

    #[test]
    fn test_date_styles() {
        let when = date(2024, 3, 5).and_hms_opt(9, 8, 7).unwrap();
        assert_eq!(format_date_for_filename(when, DateStyle::Compact), "20240305");
        assert_eq!(format_date_for_filename(when, DateStyle::Readable), "2024-03-05");
        assert_eq!(format_date_for_filename(when, DateStyle::Full), "2024-03-05_090807");
        assert_eq!(format_date_for_filename(when, DateStyle::American), "03-05-2024");
        assert_eq!(format_date_for_filename(when, DateStyle::European), "05-03-2024");
    }

    #[test]
    fn test_date_style_parsing_falls_back_to_readable() {
        assert_eq!("Compact".parse::<DateStyle>().unwrap(), DateStyle::Compact);
        assert_eq!("european".parse::<DateStyle>().unwrap(), DateStyle::European);
        assert_eq!("whatever".parse::<DateStyle>().unwrap(), DateStyle::Readable);
    }
}

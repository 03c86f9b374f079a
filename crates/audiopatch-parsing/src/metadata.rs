use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use audiopatch_core::Metadata;

/// Pull document-level fields out of the report header.
///
/// Each label is searched independently; a missing label leaves its field
/// `None`. Finding nothing at all is not an error.
pub fn extract_metadata(text: &str) -> Metadata {
    Metadata {
        format_version: format_version(text),
        generated_date: generated_date(text),
        source_file_name: source_file_name(text),
        ..Metadata::default()
    }
}

/// `Version: 3.6.2` → `"3.6.2"`.
pub fn format_version(text: &str) -> Option<String> {
    static RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Version:\s*(\d+(?:\.\d+)*)").unwrap());
    RE.captures(text).map(|caps| caps[1].to_string())
}

/// `Date: 2024/03/15` → 2024-03-15.
///
/// A label whose value is not a real calendar date is treated as absent.
pub fn generated_date(text: &str) -> Option<NaiveDate> {
    static RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Date:\s*(\d{4}/\d{2}/\d{2})").unwrap());
    let caps = RE.captures(text)?;
    match NaiveDate::parse_from_str(&caps[1], "%Y/%m/%d") {
        Ok(date) => Some(date),
        Err(e) => {
            tracing::debug!(value = &caps[1], error = %e, "ignoring invalid report date");
            None
        }
    }
}

/// `File name: Arena Main.xmlp` → `"Arena Main.xmlp"` (rest of the line, trimmed).
pub fn source_file_name(text: &str) -> Option<String> {
    static RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"File name:[ \t]*([^\n]+)").unwrap());
    let caps = RE.captures(text)?;
    let name = caps[1].trim();
    (!name.is_empty()).then(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Soundvision report\n\
        Version: 3.6.2.1\n\
        Date: 2024/03/15\n\
        File name:  Arena Main v4.xmlp  \n\
        Units: ft.in / lb\n";

    #[test]
    fn test_full_header() {
        let meta = extract_metadata(HEADER);
        assert_eq!(meta.format_version.as_deref(), Some("3.6.2.1"));
        assert_eq!(meta.generated_date, NaiveDate::from_ymd_opt(2024, 3, 15));
        assert_eq!(meta.source_file_name.as_deref(), Some("Arena Main v4.xmlp"));
        assert_eq!(meta.distance_unit, "ft.in");
        assert_eq!(meta.weight_unit, "lb");
    }

    #[test]
    fn test_date_only() {
        let meta = extract_metadata("Some title\nDate: 2024/03/15\n");
        assert_eq!(meta.generated_date, NaiveDate::from_ymd_opt(2024, 3, 15));
        assert!(meta.format_version.is_none());
        assert!(meta.source_file_name.is_none());
    }

    #[test]
    fn test_nothing_found() {
        let meta = extract_metadata("no labels in here");
        assert!(meta.is_empty());
    }

    #[test]
    fn test_invalid_date_is_absent() {
        assert_eq!(generated_date("Date: 2024/13/45"), None);
    }

    #[test]
    fn test_file_name_stops_at_line_end() {
        assert_eq!(
            source_file_name("File name: show.xmlp\nVersion: 3.6").as_deref(),
            Some("show.xmlp")
        );
    }

    #[test]
    fn test_blank_file_name_is_absent() {
        assert_eq!(source_file_name("File name:   \nVersion: 3.6"), None);
    }
}

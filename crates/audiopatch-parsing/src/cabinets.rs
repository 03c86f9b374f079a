use once_cell::sync::Lazy;
use regex::Regex;

use audiopatch_core::ParsedCabinet;

use crate::config::ParsingConfig;

/// Model names are one or more uppercase words (`KARA II`, `KS28 LOW`, `K2`).
const MODEL: &str = r"[A-Z][A-Z0-9\-]*(?:[ \t]+[A-Z][A-Z0-9\-]*)*";

const NUM: &str = r"-?(?:\d+\.?\d*|\.\d+)";

static RATIO_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+/\d+").unwrap());

/// The two cabinet table layouts a report can print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableLayout {
    /// `#N MODEL angle site top_z bottom_z ratio` with a directivity column.
    Directivity,
    /// `#N MODEL [angle] site top_z bottom_z`; the first row prints no angle.
    Standard,
}

/// Pick the table layout for a source span.
///
/// The directivity layout is chosen when the feature keyword appears anywhere
/// in the span, or when any `digits/digits` token does.
pub fn detect_layout(text: &str, directivity_keyword: &str) -> TableLayout {
    let has_keyword = !directivity_keyword.is_empty() && text.contains(directivity_keyword);
    if has_keyword || RATIO_RE.is_match(text) {
        TableLayout::Directivity
    } else {
        TableLayout::Standard
    }
}

/// Parse the cabinet table embedded in one source span.
///
/// Rows that do not fit the detected layout are skipped, never reported as
/// errors. Position numbers are kept exactly as printed.
pub fn parse_cabinet_table(text: &str) -> Vec<ParsedCabinet> {
    parse_cabinet_table_with_config(text, &ParsingConfig::default())
}

/// Config-aware version of [`parse_cabinet_table`].
pub(crate) fn parse_cabinet_table_with_config(
    text: &str,
    config: &ParsingConfig,
) -> Vec<ParsedCabinet> {
    match detect_layout(text, &config.directivity_keyword) {
        TableLayout::Directivity => parse_directivity_rows(text),
        TableLayout::Standard => parse_standard_rows(text, config),
    }
}

fn parse_directivity_rows(text: &str) -> Vec<ParsedCabinet> {
    static RE: Lazy<Regex> = Lazy::new(|| {
        let sep = r"[ \t]+";
        Regex::new(&format!(
            r"#(\d+){sep}({MODEL}){sep}({NUM}){sep}({NUM}){sep}({NUM}){sep}({NUM}){sep}(\d+/\d+)"
        ))
        .unwrap()
    });

    RE.captures_iter(text)
        .filter_map(|caps| {
            Some(ParsedCabinet {
                position: caps[1].parse().ok()?,
                model: caps[2].trim().to_string(),
                angle_to_next: caps[3].parse().ok()?,
                site_angle: caps[4].parse().ok()?,
                top_z: caps[5].parse().ok()?,
                bottom_z: caps[6].parse().ok()?,
                panflex_setting: caps[7].to_string(),
            })
        })
        .collect()
}

fn is_header_row(line: &str, config: &ParsingConfig) -> bool {
    let has_type_word = config
        .header_type_words
        .iter()
        .any(|w| line.contains(w.as_str()));
    let has_marker = config
        .header_marker_words
        .iter()
        .any(|w| line.contains(w.as_str()));
    has_type_word && has_marker
}

/// Line-by-line parse: the leading row of an array has no inter-cabinet angle,
/// so rows carry either three or four numbers.
fn parse_standard_rows(text: &str, config: &ParsingConfig) -> Vec<ParsedCabinet> {
    static ROW_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#\d").unwrap());
    static ROW_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(&format!(r"^#(\d+)\s+({MODEL})(.*)$")).unwrap());
    static NUM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(NUM).unwrap());

    let mut cabinets = Vec::new();
    for line in text.lines().map(str::trim) {
        if !ROW_START.is_match(line) || is_header_row(line, config) {
            continue;
        }
        let Some(caps) = ROW_RE.captures(line) else {
            tracing::debug!(line, "skipping cabinet row without a model");
            continue;
        };
        let Ok(position) = caps[1].parse::<u32>() else {
            continue;
        };
        let numbers: Vec<f64> = NUM_RE
            .find_iter(&caps[3])
            .filter_map(|m| m.as_str().parse().ok())
            .collect();

        let (angle_to_next, site_angle, top_z, bottom_z) = match numbers.as_slice() {
            [angle, site, top, bottom] => (*angle, *site, *top, *bottom),
            [site, top, bottom] => (0.0, *site, *top, *bottom),
            _ => {
                tracing::debug!(line, count = numbers.len(), "skipping cabinet row");
                continue;
            }
        };

        cabinets.push(ParsedCabinet {
            position,
            model: caps[2].trim().to_string(),
            angle_to_next,
            site_angle,
            top_z,
            bottom_z,
            panflex_setting: String::new(),
        });
    }
    cabinets
}

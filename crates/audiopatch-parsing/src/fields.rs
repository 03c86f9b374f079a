//! Label-anchored field extractors for a source span.
//!
//! Every field is found by its own independent search, so the order labels
//! appear in is irrelevant and a missing label only drops that one field.
//! Numeric values accept an optional leading minus sign and a decimal point.

use once_cell::sync::Lazy;
use regex::Regex;

use audiopatch_core::{MbarHole, Position};

/// Signed decimal number, e.g. `-13.2`, `24`, `.5`.
const NUM: &str = r"(-?(?:\d+\.?\d*|\.\d+))";

fn number_after(re: &Regex, text: &str) -> Option<f64> {
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

fn line_after(re: &Regex, text: &str) -> Option<String> {
    let value = re.captures(text)?.get(1)?.as_str().trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Raw configuration text, e.g. `Vertical / Flown`.
pub fn configuration(text: &str) -> Option<String> {
    static RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Configuration:[ \t]*([^\n]*)").unwrap());
    line_after(&RE, text)
}

/// Raw bumper description, e.g. `K2-BUMP (hole A)`.
pub fn bumper(text: &str) -> Option<String> {
    static RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Bumper:[ \t]*([^\n]*)").unwrap());
    line_after(&RE, text)
}

pub fn motors(text: &str) -> Option<u32> {
    static RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"#\s*motors:\s*(\d+)").unwrap());
    RE.captures(text)?.get(1)?.as_str().parse().ok()
}

/// `Position (X; Y; Z) (ft.in): 12.04; -3.10; 40.00`.
pub fn position(text: &str) -> Option<Position> {
    static RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(&format!(
            r"Position\s*\(X;\s*Y;\s*Z[^)]*\)[^:\n]*:\s*{NUM};\s*{NUM};\s*{NUM}"
        ))
        .unwrap()
    });
    let caps = RE.captures(text)?;
    Some(Position {
        x: caps[1].parse().ok()?,
        y: caps[2].parse().ok()?,
        z: caps[3].parse().ok()?,
    })
}

/// First value after `label_re` that is immediately followed by one of the
/// degree `suffixes` (optionally separated by spaces).
fn angle_after(label_re: &Regex, text: &str, suffixes: &[String]) -> Option<f64> {
    label_re.captures_iter(text).find_map(|caps| {
        let value = caps.get(1)?;
        let rest = text[value.end()..].trim_start_matches([' ', '\t']);
        if suffixes.iter().any(|s| !s.is_empty() && rest.starts_with(s.as_str())) {
            value.as_str().parse().ok()
        } else {
            None
        }
    })
}

pub fn site(text: &str, suffixes: &[String]) -> Option<f64> {
    static RE: Lazy<Regex> = Lazy::new(|| Regex::new(&format!(r"\bSite:\s*{NUM}")).unwrap());
    angle_after(&RE, text, suffixes)
}

pub fn azimuth(text: &str, suffixes: &[String]) -> Option<f64> {
    static RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(&format!(r"\bAzimuth:\s*{NUM}")).unwrap());
    angle_after(&RE, text, suffixes)
}

pub fn top_site(text: &str, suffixes: &[String]) -> Option<f64> {
    static RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(&format!(r"\bTop site:\s*{NUM}")).unwrap());
    angle_after(&RE, text, suffixes)
}

pub fn bottom_site(text: &str, suffixes: &[String]) -> Option<f64> {
    static RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(&format!(r"\bBottom site:\s*{NUM}")).unwrap());
    angle_after(&RE, text, suffixes)
}

/// `Total weight (array + bumper): 2480.5 lb`.
pub fn total_weight(text: &str) -> Option<f64> {
    static RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(&format!(r"Total weight[^:\n]*:\s*{NUM}\s*lb")).unwrap());
    number_after(&RE, text)
}

pub fn enclosure_weight(text: &str) -> Option<f64> {
    static RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(&format!(r"Total enclosure weight:\s*{NUM}\s*lb")).unwrap());
    number_after(&RE, text)
}

pub fn front_motor_load(text: &str) -> Option<f64> {
    static RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(&format!(r"Front motor load:\s*{NUM}\s*lb")).unwrap());
    number_after(&RE, text)
}

pub fn rear_motor_load(text: &str) -> Option<f64> {
    static RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(&format!(r"Rear motor load:\s*{NUM}\s*lb")).unwrap());
    number_after(&RE, text)
}

pub fn bottom_elevation(text: &str) -> Option<f64> {
    static RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(&format!(r"Bottom elevation:\s*{NUM}")).unwrap());
    number_after(&RE, text)
}

/// Hole number from `Front pickup position (X; Y; Z): 1 (29.03; 8.09; 24.03)`.
pub fn front_pickup(text: &str) -> Option<u32> {
    static RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"Front pickup position[^:\n]*:\s*(\d+)").unwrap());
    RE.captures(text)?.get(1)?.as_str().parse().ok()
}

pub fn rear_pickup(text: &str) -> Option<u32> {
    static RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"Rear pickup position[^:\n]*:\s*(\d+)").unwrap());
    RE.captures(text)?.get(1)?.as_str().parse().ok()
}

/// MBar hole marker named in a bumper description (`... hole A`).
pub fn mbar_hole(bumper_text: &str) -> MbarHole {
    static RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bhole\s*([ab])\b").unwrap());
    RE.captures(bumper_text)
        .map(|caps| MbarHole::from_marker(&caps[1]))
        .unwrap_or_default()
}

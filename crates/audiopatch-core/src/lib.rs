use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub mod backend;
pub mod catalog;
pub mod config_file;

// Re-export for convenience
pub use backend::{BackendError, PdfBackend};
pub use catalog::{ArrayConfiguration, Catalog, ConfigurationRule, ListOverride, NO_BUMPER};

/// Distance unit the supported report format prints lengths in.
pub const DISTANCE_UNIT: &str = "ft.in";

/// Weight unit the supported report format prints loads in.
pub const WEIGHT_UNIT: &str = "lb";

/// Group name used when a source is declared before any group header.
pub const UNKNOWN_GROUP: &str = "UNKNOWN";

/// Document-level fields pulled from the report header.
///
/// Every parsed field is optional: a label missing from the header leaves the
/// field as `None` rather than an empty string. Units are not read from the
/// document; they are fixed by the report format version this crate targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub format_version: Option<String>,
    pub generated_date: Option<NaiveDate>,
    pub source_file_name: Option<String>,
    pub distance_unit: String,
    pub weight_unit: String,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            format_version: None,
            generated_date: None,
            source_file_name: None,
            distance_unit: DISTANCE_UNIT.to_string(),
            weight_unit: WEIGHT_UNIT.to_string(),
        }
    }
}

impl Metadata {
    /// True when no header label was found at all.
    pub fn is_empty(&self) -> bool {
        self.format_version.is_none()
            && self.generated_date.is_none()
            && self.source_file_name.is_none()
    }
}

/// MBar pickup hole marker derived from the bumper description.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MbarHole {
    A,
    B,
    #[default]
    #[serde(rename = "")]
    Unset,
}

impl MbarHole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MbarHole::A => "A",
            MbarHole::B => "B",
            MbarHole::Unset => "",
        }
    }

    /// Inverse of [`as_str`](Self::as_str); anything unrecognized is `Unset`.
    pub fn from_marker(marker: &str) -> Self {
        match marker.trim() {
            "A" | "a" => MbarHole::A,
            "B" | "b" => MbarHole::B,
            _ => MbarHole::Unset,
        }
    }
}

/// Array origin in the prediction's coordinate system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Array aiming angles, in degrees. Each one is independently optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Angles {
    pub site: Option<f64>,
    pub azimuth: Option<f64>,
    pub top_site: Option<f64>,
    pub bottom_site: Option<f64>,
}

impl Angles {
    pub fn is_empty(&self) -> bool {
        self.site.is_none()
            && self.azimuth.is_none()
            && self.top_site.is_none()
            && self.bottom_site.is_none()
    }
}

/// Weight breakdown in pounds. Each entry is independently optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Weight {
    pub total: Option<f64>,
    pub enclosure: Option<f64>,
    pub front_motor: Option<f64>,
    pub rear_motor: Option<f64>,
}

impl Weight {
    pub fn is_empty(&self) -> bool {
        self.total.is_none()
            && self.enclosure.is_none()
            && self.front_motor.is_none()
            && self.rear_motor.is_none()
    }
}

/// Bumper pickup hole numbers for the front and rear motor points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupPositions {
    pub front: Option<u32>,
    pub rear: Option<u32>,
}

/// One loudspeaker enclosure row from a source's cabinet table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedCabinet {
    /// 1-based slot number exactly as printed after `#`. Not renumbered.
    pub position: u32,
    pub model: String,
    /// Splay angle to the next enclosure; 0 when the row prints none.
    pub angle_to_next: f64,
    pub site_angle: f64,
    pub top_z: f64,
    pub bottom_z: f64,
    /// Directivity ratio such as `55/35`; empty for the standard table layout.
    pub panflex_setting: String,
}

/// One `Source:` declaration and everything parsed from its text span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedArray {
    pub source_name: String,
    pub array_base_name: String,
    pub symmetry_type: String,
    pub group_context: String,
    pub configuration_text: Option<String>,
    pub bumper_text: Option<String>,
    pub mbar_hole: MbarHole,
    pub num_motors: u32,
    pub position: Option<Position>,
    pub angles: Angles,
    pub weight: Weight,
    pub bottom_elevation: Option<f64>,
    pub pickup_positions: PickupPositions,
    pub cabinets: Vec<ParsedCabinet>,
}

impl ParsedArray {
    /// An array named `source_name` with every optional field absent.
    pub fn new(source_name: &str, group_context: &str) -> Self {
        let (array_base_name, symmetry_type) = split_source_name(source_name);
        Self {
            source_name: source_name.to_string(),
            array_base_name,
            symmetry_type,
            group_context: group_context.to_string(),
            configuration_text: None,
            bumper_text: None,
            mbar_hole: MbarHole::Unset,
            num_motors: 1,
            position: None,
            angles: Angles::default(),
            weight: Weight::default(),
            bottom_elevation: None,
            pickup_positions: PickupPositions::default(),
            cabinets: Vec::new(),
        }
    }

    pub fn is_single_point(&self) -> bool {
        self.num_motors == 1
    }

    /// Dual-point arrays need a bumper angle computed by the storage layer.
    pub fn is_dual_point(&self) -> bool {
        self.num_motors == 2
    }
}

/// Result of parsing one report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub metadata: Metadata,
    pub arrays: Vec<ParsedArray>,
}

impl ParsedDocument {
    pub fn cabinet_count(&self) -> usize {
        self.arrays.iter().map(|a| a.cabinets.len()).sum()
    }
}

/// Split a source name on its first underscore into `(base, symmetry)`.
///
/// `K2_Sym_Left` becomes `("K2", "Sym_Left")`; a name without an underscore
/// has an empty symmetry type.
pub fn split_source_name(source_name: &str) -> (String, String) {
    match source_name.split_once('_') {
        Some((base, rest)) => (base.trim().to_string(), rest.trim().to_string()),
        None => (source_name.trim().to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_with_symmetry() {
        assert_eq!(
            split_source_name("K2_Sym_Left"),
            ("K2".to_string(), "Sym_Left".to_string())
        );
    }

    #[test]
    fn test_split_without_underscore() {
        assert_eq!(split_source_name("K2"), ("K2".to_string(), String::new()));
    }

    #[test]
    fn test_split_trailing_underscore() {
        assert_eq!(split_source_name("KARA_"), ("KARA".to_string(), String::new()));
    }

    #[test]
    fn test_new_array_defaults() {
        let array = ParsedArray::new("KIVA_L", "Mains");
        assert_eq!(array.array_base_name, "KIVA");
        assert_eq!(array.symmetry_type, "L");
        assert_eq!(array.num_motors, 1);
        assert!(array.is_single_point());
        assert!(!array.is_dual_point());
        assert!(array.angles.is_empty());
        assert!(array.weight.is_empty());
        assert_eq!(array.mbar_hole, MbarHole::Unset);
    }

    #[test]
    fn test_metadata_default_units() {
        let meta = Metadata::default();
        assert!(meta.is_empty());
        assert_eq!(meta.distance_unit, "ft.in");
        assert_eq!(meta.weight_unit, "lb");
    }

    #[test]
    fn test_mbar_marker_round_trip() {
        assert_eq!(MbarHole::from_marker(MbarHole::A.as_str()), MbarHole::A);
        assert_eq!(MbarHole::from_marker(""), MbarHole::Unset);
        assert_eq!(MbarHole::from_marker("C"), MbarHole::Unset);
    }
}

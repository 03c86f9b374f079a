use std::fmt::Write as _;

use chrono::NaiveDate;
use serde::Serialize;

use audiopatch_core::{Angles, ArrayConfiguration, MbarHole, Position, Weight};

/// A stored prediction: one imported (or pending) Soundvision report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRecord {
    pub id: i64,
    pub name: String,
    /// User-set or report-provided file name. Import never overwrites a set value.
    pub file_name: Option<String>,
    pub version: Option<String>,
    pub date_generated: Option<NaiveDate>,
    /// JSON of the last parsed document.
    pub raw_data: Option<serde_json::Value>,
    pub created_at: String,
    pub updated_at: String,
}

/// Array row ready to insert, produced by the record builder.
#[derive(Debug, Clone, PartialEq)]
pub struct NewArray {
    pub source_name: String,
    pub array_base_name: String,
    pub symmetry_type: String,
    pub group_context: String,
    pub configuration: ArrayConfiguration,
    pub bumper_type: String,
    pub num_motors: u32,
    pub position: Option<Position>,
    pub angles: Angles,
    pub weight: Weight,
    pub bottom_elevation: Option<f64>,
    pub front_pickup_position: Option<String>,
    pub rear_pickup_position: Option<String>,
    pub mbar_hole: MbarHole,
    pub bumper_angle: Option<f64>,
    pub cabinets: Vec<NewCabinet>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCabinet {
    pub position_number: u32,
    pub speaker_model: String,
    pub angle_to_next: f64,
    pub site_angle: f64,
    pub top_z: f64,
    pub bottom_z: f64,
    pub panflex_setting: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrayRecord {
    pub id: i64,
    pub prediction_id: i64,
    pub source_name: String,
    pub array_base_name: String,
    pub symmetry_type: String,
    pub group_context: String,
    pub configuration: ArrayConfiguration,
    pub bumper_type: String,
    pub num_motors: u32,
    pub is_single_point: bool,
    pub position_x: Option<f64>,
    pub position_y: Option<f64>,
    pub position_z: Option<f64>,
    pub site_angle: Option<f64>,
    pub azimuth: Option<f64>,
    pub top_site: Option<f64>,
    pub bottom_site: Option<f64>,
    pub total_weight_lb: Option<f64>,
    pub enclosure_weight_lb: Option<f64>,
    pub front_motor_load_lb: Option<f64>,
    pub rear_motor_load_lb: Option<f64>,
    pub bottom_elevation: Option<f64>,
    pub front_pickup_position: Option<String>,
    pub rear_pickup_position: Option<String>,
    pub mbar_hole: MbarHole,
    pub bumper_angle: Option<f64>,
}

impl ArrayRecord {
    /// Front plus rear motor load, when either is known.
    pub fn total_motor_load(&self) -> Option<f64> {
        match (self.front_motor_load_lb, self.rear_motor_load_lb) {
            (None, None) => None,
            (front, rear) => Some(front.unwrap_or(0.0) + rear.unwrap_or(0.0)),
        }
    }

    /// Bottom trim as `F' I"`.
    pub fn trim_height_display(&self) -> Option<String> {
        self.bottom_elevation.map(trim_height)
    }

    pub fn rigging_display(&self) -> String {
        if self.is_single_point {
            return "Single point".to_string();
        }
        match self.bumper_angle {
            Some(angle) => format!("Dual point ({angle}°)"),
            None => "Dual point".to_string(),
        }
    }
}

/// Render a ft.in elevation (`24.06` is 24 ft 6 in) as `F' I"`.
///
/// The two fractional digits are the inch field, not a decimal fraction.
pub fn trim_height(value: f64) -> String {
    let feet = value.trunc();
    let inches = ((value - feet).abs() * 100.0).round();
    format!("{}' {}\"", feet as i64, inches as i64)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CabinetRecord {
    pub id: i64,
    pub array_id: i64,
    pub position_number: u32,
    pub speaker_model: String,
    pub angle_to_next: f64,
    pub site_angle: f64,
    pub top_z: f64,
    pub bottom_z: f64,
    pub panflex_setting: String,
}

impl CabinetRecord {
    /// `#3: KARA II → 2° [70/70]`
    pub fn summary_line(&self) -> String {
        let mut line = format!("#{}: {}", self.position_number, self.speaker_model);
        if self.angle_to_next != 0.0 {
            let _ = write!(line, " → {}°", self.angle_to_next);
        }
        if !self.panflex_setting.is_empty() {
            let _ = write!(line, " [{}]", self.panflex_setting);
        }
        line
    }
}

/// One summary line per cabinet, ordered by position number.
pub fn cabinet_summary(cabinets: &[CabinetRecord]) -> Vec<String> {
    let mut sorted: Vec<&CabinetRecord> = cabinets.iter().collect();
    sorted.sort_by_key(|c| c.position_number);
    sorted.into_iter().map(CabinetRecord::summary_line).collect()
}

/// An array together with its cabinets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrayWithCabinets {
    pub array: ArrayRecord,
    pub cabinets: Vec<CabinetRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PredictionSummary {
    pub prediction_id: i64,
    pub array_count: i64,
    pub cabinet_count: i64,
}

#[cfg(test)]
impl NewArray {
    pub(crate) fn for_test(source_name: &str) -> Self {
        let (array_base_name, symmetry_type) = audiopatch_core::split_source_name(source_name);
        Self {
            source_name: source_name.to_string(),
            array_base_name,
            symmetry_type,
            group_context: "Mains".to_string(),
            configuration: ArrayConfiguration::default(),
            bumper_type: audiopatch_core::NO_BUMPER.to_string(),
            num_motors: 1,
            position: None,
            angles: Angles::default(),
            weight: Weight::default(),
            bottom_elevation: None,
            front_pickup_position: None,
            rear_pickup_position: None,
            mbar_hole: MbarHole::Unset,
            bumper_angle: None,
            cabinets: Vec::new(),
        }
    }
}

#[cfg(test)]
impl NewCabinet {
    pub(crate) fn for_test(position_number: u32, model: &str) -> Self {
        Self {
            position_number,
            speaker_model: model.to_string(),
            angle_to_next: 0.0,
            site_angle: 0.0,
            top_z: 0.0,
            bottom_z: 0.0,
            panflex_setting: String::new(),
        }
    }
}

//! Record builder and the transactional replace-all import.

use rusqlite::Connection;
use serde::Serialize;

use audiopatch_core::{Catalog, ParsedArray, ParsedDocument};

use crate::records::{NewArray, NewCabinet};
use crate::{StoreError, db};

/// Computes the angle between the two hang points of a dual-point array.
///
/// Called by the record builder for every array with exactly two motors and
/// never otherwise. An error aborts the whole import.
pub trait BumperAngle {
    fn bumper_angle(&self, array: &ParsedArray) -> Result<Option<f64>, String>;
}

/// Leaves the bumper angle unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnspecifiedBumperAngle;

impl BumperAngle for UnspecifiedBumperAngle {
    fn bumper_angle(&self, _array: &ParsedArray) -> Result<Option<f64>, String> {
        Ok(None)
    }
}

/// Maps parsed arrays to storable rows, classifying configuration and bumper
/// text against a [`Catalog`].
pub struct RecordBuilder<'a> {
    catalog: &'a Catalog,
    bumper_angle: &'a dyn BumperAngle,
}

impl<'a> RecordBuilder<'a> {
    pub fn new(catalog: &'a Catalog, bumper_angle: &'a dyn BumperAngle) -> Self {
        Self {
            catalog,
            bumper_angle,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        self.catalog
    }

    pub fn build_array(&self, parsed: &ParsedArray) -> Result<NewArray, StoreError> {
        let bumper_angle = if parsed.is_dual_point() {
            self.bumper_angle
                .bumper_angle(parsed)
                .map_err(|e| StoreError::DerivedField(format!("{}: {e}", parsed.source_name)))?
        } else {
            None
        };

        Ok(NewArray {
            source_name: parsed.source_name.clone(),
            array_base_name: parsed.array_base_name.clone(),
            symmetry_type: parsed.symmetry_type.clone(),
            group_context: parsed.group_context.clone(),
            configuration: self
                .catalog
                .classify_configuration(parsed.configuration_text.as_deref()),
            bumper_type: self
                .catalog
                .classify_bumper(parsed.bumper_text.as_deref())
                .to_string(),
            num_motors: parsed.num_motors,
            position: parsed.position,
            angles: parsed.angles,
            weight: parsed.weight,
            bottom_elevation: parsed.bottom_elevation,
            front_pickup_position: parsed.pickup_positions.front.map(|n| n.to_string()),
            rear_pickup_position: parsed.pickup_positions.rear.map(|n| n.to_string()),
            mbar_hole: parsed.mbar_hole,
            bumper_angle,
            cabinets: parsed
                .cabinets
                .iter()
                .map(|c| NewCabinet {
                    position_number: c.position,
                    speaker_model: c.model.clone(),
                    angle_to_next: c.angle_to_next,
                    site_angle: c.site_angle,
                    top_z: c.top_z,
                    bottom_z: c.bottom_z,
                    panflex_setting: c.panflex_setting.clone(),
                })
                .collect(),
        })
    }
}

/// Counts from one completed import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportOutcome {
    pub prediction_id: i64,
    pub arrays_removed: usize,
    pub arrays_created: usize,
    pub cabinets_created: usize,
}

/// Replace every array and cabinet of a prediction with `document`'s, then
/// apply its metadata. Runs in one transaction: on any error nothing changes.
pub(crate) fn replace_prediction_contents(
    conn: &Connection,
    prediction_id: i64,
    document: &ParsedDocument,
    builder: &RecordBuilder<'_>,
) -> Result<ImportOutcome, StoreError> {
    let raw_data = serde_json::to_string(document)?;
    let tx = conn.unchecked_transaction()?;

    if !db::prediction_exists(&tx, prediction_id)? {
        return Err(StoreError::PredictionNotFound(prediction_id));
    }

    let mut outcome = ImportOutcome {
        prediction_id,
        arrays_removed: db::delete_arrays(&tx, prediction_id)?,
        ..Default::default()
    };

    for parsed in &document.arrays {
        let array = builder.build_array(parsed)?;
        let array_id = db::insert_array(&tx, prediction_id, &array)?;
        for cabinet in &array.cabinets {
            db::insert_cabinet(&tx, array_id, cabinet)?;
        }
        outcome.arrays_created += 1;
        outcome.cabinets_created += array.cabinets.len();
    }

    let meta = &document.metadata;
    db::update_prediction_metadata(
        &tx,
        prediction_id,
        meta.format_version.as_deref(),
        meta.generated_date,
        meta.source_file_name.as_deref(),
        &raw_data,
    )?;

    tx.commit()?;
    Ok(outcome)
}

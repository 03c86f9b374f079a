//! SQLite schema and row-level operations for predictions, arrays, and cabinets.

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};

use audiopatch_core::{ArrayConfiguration, MbarHole};

use crate::StoreError;
use crate::records::{ArrayRecord, CabinetRecord, NewArray, NewCabinet, PredictionRecord};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Initialize the database with the required schema.
pub fn init_database(conn: &Connection) -> Result<(), StoreError> {
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS predictions (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            file_name TEXT,
            version TEXT,
            date_generated TEXT,
            raw_data TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS speaker_arrays (
            id INTEGER PRIMARY KEY,
            prediction_id INTEGER NOT NULL REFERENCES predictions(id) ON DELETE CASCADE,
            source_name TEXT NOT NULL,
            array_base_name TEXT NOT NULL,
            symmetry_type TEXT NOT NULL DEFAULT '',
            group_context TEXT NOT NULL,
            configuration TEXT NOT NULL,
            bumper_type TEXT NOT NULL,
            num_motors INTEGER NOT NULL,
            is_single_point INTEGER NOT NULL,
            position_x REAL,
            position_y REAL,
            position_z REAL,
            site_angle REAL,
            azimuth REAL,
            top_site REAL,
            bottom_site REAL,
            total_weight_lb REAL,
            enclosure_weight_lb REAL,
            front_motor_load_lb REAL,
            rear_motor_load_lb REAL,
            bottom_elevation REAL,
            front_pickup_position TEXT,
            rear_pickup_position TEXT,
            mbar_hole TEXT NOT NULL DEFAULT '',
            bumper_angle REAL
        );

        CREATE TABLE IF NOT EXISTS speaker_cabinets (
            id INTEGER PRIMARY KEY,
            array_id INTEGER NOT NULL REFERENCES speaker_arrays(id) ON DELETE CASCADE,
            position_number INTEGER NOT NULL,
            speaker_model TEXT NOT NULL,
            angle_to_next REAL NOT NULL DEFAULT 0,
            site_angle REAL NOT NULL DEFAULT 0,
            top_z REAL NOT NULL DEFAULT 0,
            bottom_z REAL NOT NULL DEFAULT 0,
            panflex_setting TEXT NOT NULL DEFAULT ''
        );

        CREATE INDEX IF NOT EXISTS idx_arrays_prediction ON speaker_arrays(prediction_id);
        CREATE INDEX IF NOT EXISTS idx_cabinets_array ON speaker_cabinets(array_id);
        "#,
    )?;

    Ok(())
}

/// Current time as an RFC 3339 string.
pub fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

pub fn format_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format(DATE_FORMAT).to_string())
}

fn parse_date(idx: usize, value: Option<String>) -> rusqlite::Result<Option<NaiveDate>> {
    value
        .map(|v| {
            NaiveDate::parse_from_str(&v, DATE_FORMAT)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
        })
        .transpose()
}

fn parse_json(idx: usize, value: Option<String>) -> rusqlite::Result<Option<serde_json::Value>> {
    value
        .map(|v| {
            serde_json::from_str(&v)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
        })
        .transpose()
}

// ── Predictions ──

pub fn insert_prediction(conn: &Connection, name: &str, file_name: Option<&str>) -> Result<i64, StoreError> {
    let ts = now();
    conn.execute(
        "INSERT INTO predictions (name, file_name, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
        params![name, file_name, ts],
    )?;
    Ok(conn.last_insert_rowid())
}

const PREDICTION_COLUMNS: &str =
    "id, name, file_name, version, date_generated, raw_data, created_at, updated_at";

fn prediction_from_row(row: &Row<'_>) -> rusqlite::Result<PredictionRecord> {
    Ok(PredictionRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        file_name: row.get(2)?,
        version: row.get(3)?,
        date_generated: parse_date(4, row.get(4)?)?,
        raw_data: parse_json(5, row.get(5)?)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

pub fn get_prediction(conn: &Connection, id: i64) -> Result<Option<PredictionRecord>, StoreError> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {PREDICTION_COLUMNS} FROM predictions WHERE id = ?1"
    ))?;
    Ok(stmt.query_row(params![id], prediction_from_row).optional()?)
}

pub fn list_predictions(conn: &Connection) -> Result<Vec<PredictionRecord>, StoreError> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {PREDICTION_COLUMNS} FROM predictions ORDER BY id"
    ))?;
    let rows = stmt
        .query_map([], prediction_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn prediction_exists(conn: &Connection, id: i64) -> Result<bool, StoreError> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM predictions WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Apply parsed header fields. `file_name` only fills an unset value.
pub fn update_prediction_metadata(
    conn: &Connection,
    id: i64,
    version: Option<&str>,
    date_generated: Option<NaiveDate>,
    file_name: Option<&str>,
    raw_data: &str,
) -> Result<(), StoreError> {
    conn.execute(
        "UPDATE predictions SET \
             version = COALESCE(?2, version), \
             date_generated = COALESCE(?3, date_generated), \
             file_name = CASE WHEN file_name IS NULL OR file_name = '' THEN ?4 ELSE file_name END, \
             raw_data = ?5, \
             updated_at = ?6 \
         WHERE id = ?1",
        params![id, version, format_date(date_generated), file_name, raw_data, now()],
    )?;
    Ok(())
}

// ── Arrays and cabinets ──

/// Delete every array and cabinet owned by a prediction. Returns arrays removed.
pub fn delete_arrays(conn: &Connection, prediction_id: i64) -> Result<usize, StoreError> {
    conn.execute(
        "DELETE FROM speaker_cabinets WHERE array_id IN \
             (SELECT id FROM speaker_arrays WHERE prediction_id = ?1)",
        params![prediction_id],
    )?;
    let removed = conn.execute(
        "DELETE FROM speaker_arrays WHERE prediction_id = ?1",
        params![prediction_id],
    )?;
    Ok(removed)
}

pub fn insert_array(conn: &Connection, prediction_id: i64, a: &NewArray) -> Result<i64, StoreError> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO speaker_arrays (\
             prediction_id, source_name, array_base_name, symmetry_type, group_context, \
             configuration, bumper_type, num_motors, is_single_point, \
             position_x, position_y, position_z, \
             site_angle, azimuth, top_site, bottom_site, \
             total_weight_lb, enclosure_weight_lb, front_motor_load_lb, rear_motor_load_lb, \
             bottom_elevation, front_pickup_position, rear_pickup_position, mbar_hole, bumper_angle\
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, \
                   ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25)",
    )?;
    stmt.execute(params![
        prediction_id,
        a.source_name,
        a.array_base_name,
        a.symmetry_type,
        a.group_context,
        a.configuration.as_str(),
        a.bumper_type,
        a.num_motors,
        a.num_motors == 1,
        a.position.map(|p| p.x),
        a.position.map(|p| p.y),
        a.position.map(|p| p.z),
        a.angles.site,
        a.angles.azimuth,
        a.angles.top_site,
        a.angles.bottom_site,
        a.weight.total,
        a.weight.enclosure,
        a.weight.front_motor,
        a.weight.rear_motor,
        a.bottom_elevation,
        a.front_pickup_position,
        a.rear_pickup_position,
        a.mbar_hole.as_str(),
        a.bumper_angle,
    ])?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_cabinet(conn: &Connection, array_id: i64, c: &NewCabinet) -> Result<(), StoreError> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO speaker_cabinets (\
             array_id, position_number, speaker_model, angle_to_next, site_angle, \
             top_z, bottom_z, panflex_setting\
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    stmt.execute(params![
        array_id,
        c.position_number,
        c.speaker_model,
        c.angle_to_next,
        c.site_angle,
        c.top_z,
        c.bottom_z,
        c.panflex_setting,
    ])?;
    Ok(())
}

fn array_from_row(row: &Row<'_>) -> rusqlite::Result<ArrayRecord> {
    let configuration: String = row.get(6)?;
    let configuration = configuration
        .parse::<ArrayConfiguration>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, e.into()))?;
    let mbar_hole: String = row.get(24)?;
    Ok(ArrayRecord {
        id: row.get(0)?,
        prediction_id: row.get(1)?,
        source_name: row.get(2)?,
        array_base_name: row.get(3)?,
        symmetry_type: row.get(4)?,
        group_context: row.get(5)?,
        configuration,
        bumper_type: row.get(7)?,
        num_motors: row.get(8)?,
        is_single_point: row.get(9)?,
        position_x: row.get(10)?,
        position_y: row.get(11)?,
        position_z: row.get(12)?,
        site_angle: row.get(13)?,
        azimuth: row.get(14)?,
        top_site: row.get(15)?,
        bottom_site: row.get(16)?,
        total_weight_lb: row.get(17)?,
        enclosure_weight_lb: row.get(18)?,
        front_motor_load_lb: row.get(19)?,
        rear_motor_load_lb: row.get(20)?,
        bottom_elevation: row.get(21)?,
        front_pickup_position: row.get(22)?,
        rear_pickup_position: row.get(23)?,
        mbar_hole: MbarHole::from_marker(&mbar_hole),
        bumper_angle: row.get(25)?,
    })
}

/// Arrays for a prediction in import order.
pub fn arrays_for_prediction(conn: &Connection, prediction_id: i64) -> Result<Vec<ArrayRecord>, StoreError> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, prediction_id, source_name, array_base_name, symmetry_type, group_context, \
             configuration, bumper_type, num_motors, is_single_point, \
             position_x, position_y, position_z, site_angle, azimuth, top_site, bottom_site, \
             total_weight_lb, enclosure_weight_lb, front_motor_load_lb, rear_motor_load_lb, \
             bottom_elevation, front_pickup_position, rear_pickup_position, mbar_hole, bumper_angle \
         FROM speaker_arrays WHERE prediction_id = ?1 ORDER BY id",
    )?;
    let rows = stmt
        .query_map(params![prediction_id], array_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Cabinets for an array in table order.
pub fn cabinets_for_array(conn: &Connection, array_id: i64) -> Result<Vec<CabinetRecord>, StoreError> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, array_id, position_number, speaker_model, angle_to_next, site_angle, \
             top_z, bottom_z, panflex_setting \
         FROM speaker_cabinets WHERE array_id = ?1 ORDER BY id",
    )?;
    let rows = stmt
        .query_map(params![array_id], |row| {
            Ok(CabinetRecord {
                id: row.get(0)?,
                array_id: row.get(1)?,
                position_number: row.get(2)?,
                speaker_model: row.get(3)?,
                angle_to_next: row.get(4)?,
                site_angle: row.get(5)?,
                top_z: row.get(6)?,
                bottom_z: row.get(7)?,
                panflex_setting: row.get(8)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Count arrays and cabinets owned by a prediction.
pub fn get_counts(conn: &Connection, prediction_id: i64) -> Result<(i64, i64), StoreError> {
    let arrays: i64 = conn.query_row(
        "SELECT COUNT(*) FROM speaker_arrays WHERE prediction_id = ?1",
        params![prediction_id],
        |row| row.get(0),
    )?;
    let cabinets: i64 = conn.query_row(
        "SELECT COUNT(*) FROM speaker_cabinets c \
         JOIN speaker_arrays a ON a.id = c.array_id \
         WHERE a.prediction_id = ?1",
        params![prediction_id],
        |row| row.get(0),
    )?;
    Ok((arrays, cabinets))
}

//! SQLite storage for Soundvision predictions.
//!
//! A prediction owns speaker arrays, which own cabinets. Importing a parsed
//! report replaces the whole array/cabinet set of one prediction inside a
//! single transaction, so readers see either the old set or the new one.

mod db;
pub mod import;
pub mod records;

use std::path::{Path, PathBuf};

use rusqlite::Connection;
use thiserror::Error;

use audiopatch_core::ParsedDocument;

// Re-export for convenience
pub use import::{BumperAngle, ImportOutcome, RecordBuilder, UnspecifiedBumperAngle};
pub use records::{
    ArrayRecord, ArrayWithCabinets, CabinetRecord, PredictionRecord, PredictionSummary,
    cabinet_summary, trim_height,
};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("prediction {0} not found")]
    PredictionNotFound(i64),
    #[error("derived field computation failed: {0}")]
    DerivedField(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Handle to a prediction database.
pub struct PredictionStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl PredictionStore {
    /// Open (or create) a database file and ensure the schema exists.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        db::init_database(&conn)?;
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        db::init_database(&conn)?;
        Ok(Self { conn, path: None })
    }

    /// Database file path; `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Create an empty prediction. A `file_name` given here is user-set and
    /// survives every later import.
    pub fn create_prediction(&self, name: &str, file_name: Option<&str>) -> Result<i64, StoreError> {
        let id = db::insert_prediction(&self.conn, name, file_name)?;
        tracing::debug!(id, name, "created prediction");
        Ok(id)
    }

    pub fn get_prediction(&self, id: i64) -> Result<PredictionRecord, StoreError> {
        db::get_prediction(&self.conn, id)?.ok_or(StoreError::PredictionNotFound(id))
    }

    pub fn list_predictions(&self) -> Result<Vec<PredictionRecord>, StoreError> {
        db::list_predictions(&self.conn)
    }

    /// Arrays of a prediction in import order, each with its cabinets.
    pub fn list_arrays(&self, prediction_id: i64) -> Result<Vec<ArrayWithCabinets>, StoreError> {
        db::arrays_for_prediction(&self.conn, prediction_id)?
            .into_iter()
            .map(|array| {
                let cabinets = db::cabinets_for_array(&self.conn, array.id)?;
                Ok(ArrayWithCabinets { array, cabinets })
            })
            .collect()
    }

    pub fn list_cabinets(&self, array_id: i64) -> Result<Vec<CabinetRecord>, StoreError> {
        db::cabinets_for_array(&self.conn, array_id)
    }

    pub fn summary(&self, prediction_id: i64) -> Result<PredictionSummary, StoreError> {
        if !db::prediction_exists(&self.conn, prediction_id)? {
            return Err(StoreError::PredictionNotFound(prediction_id));
        }
        let (array_count, cabinet_count) = db::get_counts(&self.conn, prediction_id)?;
        Ok(PredictionSummary {
            prediction_id,
            array_count,
            cabinet_count,
        })
    }

    /// Replace a prediction's arrays and cabinets with `document`'s and apply
    /// its metadata, atomically.
    pub fn import_document(
        &self,
        prediction_id: i64,
        document: &ParsedDocument,
        builder: &RecordBuilder<'_>,
    ) -> Result<ImportOutcome, StoreError> {
        let outcome =
            import::replace_prediction_contents(&self.conn, prediction_id, document, builder)?;
        tracing::info!(
            prediction_id,
            removed = outcome.arrays_removed,
            arrays = outcome.arrays_created,
            cabinets = outcome.cabinets_created,
            "imported report"
        );
        Ok(outcome)
    }
}

//! Soundvision prediction report parsing.
//!
//! Pipeline:
//! 1. Extract text from the report via a [`PdfBackend`]
//! 2. Read the header metadata (version, date, file name)
//! 3. Segment the text into one span per `Source:` declaration, attributed to its `Group:`
//! 4. For each span, extract the labeled array fields and parse the cabinet table
//!
//! Classification of configuration and bumper text is not done here; see
//! [`audiopatch_core::Catalog`].

use std::path::Path;

use thiserror::Error;

pub mod cabinets;
pub mod config;
pub mod extractor;
pub mod fields;
pub mod metadata;
pub mod segment;
pub mod source;

pub use cabinets::{TableLayout, detect_layout, parse_cabinet_table};
pub use config::{ParsingConfig, ParsingConfigBuilder};
pub use extractor::SoundvisionExtractor;
pub use metadata::extract_metadata;
pub use segment::{SourceSpan, segment_arrays};
pub use source::parse_source;
// Re-export domain types from core (canonical definitions live there)
pub use audiopatch_core::{
    BackendError, MbarHole, Metadata, ParsedArray, ParsedCabinet, ParsedDocument, PdfBackend,
};

#[derive(Error, Debug)]
pub enum ParsingError {
    #[error("text extraction failed: {0}")]
    Backend(#[from] BackendError),
}

/// Parse a report file using the given backend for text extraction.
pub fn parse_report(path: &Path, backend: &dyn PdfBackend) -> Result<ParsedDocument, ParsingError> {
    SoundvisionExtractor::new().parse_pdf(path, backend)
}

/// Parse already-extracted report text with the default configuration.
pub fn parse_text(text: &str) -> ParsedDocument {
    SoundvisionExtractor::new().parse_document(text)
}

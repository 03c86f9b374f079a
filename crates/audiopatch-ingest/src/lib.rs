use std::path::Path;

use thiserror::Error;

use audiopatch_core::config_file::ConfigFile;
use audiopatch_core::{BackendError, PdfBackend};
use audiopatch_parsing::{ParsingError, SoundvisionExtractor};
use audiopatch_store::{ImportOutcome, PredictionStore, RecordBuilder, StoreError};

// Re-export domain types for convenience
pub use audiopatch_core::ParsedDocument;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("report extraction error: {0}")]
    Parsing(#[from] ParsingError),
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
    #[cfg(not(feature = "pdf"))]
    #[error("PDF support not compiled in (enable the `pdf` feature of audiopatch-ingest)")]
    NoPdfSupport,
}

/// Options for the PDF text extraction step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExtractionOptions {
    /// Fraction of page height dropped from the bottom of each page.
    pub footer_exclusion: Option<f32>,
}

impl ExtractionOptions {
    pub fn from_config(config: &ConfigFile) -> Self {
        Self {
            footer_exclusion: config.footer_exclusion(),
        }
    }
}

/// Reads a file that already holds extracted report text.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextBackend;

impl PdfBackend for PlainTextBackend {
    fn extract_text(&self, path: &Path) -> Result<String, BackendError> {
        Ok(std::fs::read_to_string(path)?)
    }
}

/// True for inputs that are treated as already-extracted text.
pub fn is_text_report(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("txt"))
}

/// Parse a report file into a [`ParsedDocument`].
///
/// Dispatches on file extension:
/// - `.txt` → read verbatim as extracted text
/// - anything else → PDF text extraction (requires `pdf` feature / mupdf)
///
/// `options` only affect PDF extraction.
pub fn parse_report(
    path: &Path,
    extractor: &SoundvisionExtractor,
    options: &ExtractionOptions,
) -> Result<ParsedDocument, IngestError> {
    if is_text_report(path) {
        return Ok(extractor.parse_pdf(path, &PlainTextBackend)?);
    }
    parse_pdf(path, extractor, options)
}

#[cfg(feature = "pdf")]
fn pdf_backend(options: &ExtractionOptions) -> audiopatch_pdf_mupdf::MupdfBackend {
    let backend = audiopatch_pdf_mupdf::MupdfBackend::new();
    match options.footer_exclusion {
        Some(ratio) => backend.with_footer_exclusion(ratio),
        None => backend,
    }
}

#[cfg(feature = "pdf")]
fn parse_pdf(
    path: &Path,
    extractor: &SoundvisionExtractor,
    options: &ExtractionOptions,
) -> Result<ParsedDocument, IngestError> {
    Ok(extractor.parse_pdf(path, &pdf_backend(options))?)
}

#[cfg(not(feature = "pdf"))]
fn parse_pdf(
    _path: &Path,
    _extractor: &SoundvisionExtractor,
    _options: &ExtractionOptions,
) -> Result<ParsedDocument, IngestError> {
    Err(IngestError::NoPdfSupport)
}

/// Parse a report and replace a prediction's arrays with its contents.
///
/// Either step failing leaves the prediction untouched.
pub fn import_report(
    store: &PredictionStore,
    prediction_id: i64,
    path: &Path,
    extractor: &SoundvisionExtractor,
    options: &ExtractionOptions,
    builder: &RecordBuilder<'_>,
) -> Result<ImportOutcome, IngestError> {
    let result = parse_report(path, extractor, options).and_then(|document| {
        Ok(store.import_document(prediction_id, &document, builder)?)
    });
    if let Err(e) = &result {
        tracing::error!(prediction_id, path = %path.display(), error = %e, "report import failed");
    }
    result
}

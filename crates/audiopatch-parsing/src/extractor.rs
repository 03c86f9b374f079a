use std::path::Path;

use audiopatch_core::{Metadata, ParsedArray, ParsedCabinet, ParsedDocument, PdfBackend};

use crate::config::ParsingConfig;
use crate::segment::SourceSpan;
use crate::{ParsingError, cabinets, metadata, segment, source};

/// A configurable report parsing pipeline.
///
/// Holds a [`ParsingConfig`] and exposes each pipeline step as a method.
/// The default constructor uses built-in defaults; use
/// [`SoundvisionExtractor::with_config`] to supply custom patterns.
pub struct SoundvisionExtractor {
    config: ParsingConfig,
}

impl Default for SoundvisionExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SoundvisionExtractor {
    /// Create an extractor with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParsingConfig::default(),
        }
    }

    /// Create an extractor with a custom configuration.
    pub fn with_config(config: ParsingConfig) -> Self {
        Self { config }
    }

    /// Get a reference to the current config.
    pub fn config(&self) -> &ParsingConfig {
        &self.config
    }

    /// Extract raw text from a report via `backend` (step 1).
    pub fn extract_text(
        &self,
        path: &Path,
        backend: &dyn PdfBackend,
    ) -> Result<String, ParsingError> {
        Ok(backend.extract_text(path)?)
    }

    /// Read the header fields (step 2).
    pub fn extract_metadata(&self, text: &str) -> Metadata {
        metadata::extract_metadata(text)
    }

    /// Split the document into per-source spans (step 3).
    pub fn segment_arrays<'a>(&self, text: &'a str) -> Vec<SourceSpan<'a>> {
        segment::segment_arrays_with_config(text, &self.config)
    }

    /// Parse one source span, cabinet table included (step 4).
    pub fn parse_source(&self, span: &SourceSpan<'_>) -> ParsedArray {
        source::parse_source_with_config(
            &span.source_name,
            span.text,
            &span.group_context,
            &self.config,
        )
    }

    pub fn parse_cabinet_table(&self, text: &str) -> Vec<ParsedCabinet> {
        cabinets::parse_cabinet_table_with_config(text, &self.config)
    }

    /// Run steps 2 to 4 on already-extracted text.
    pub fn parse_document(&self, text: &str) -> ParsedDocument {
        let metadata = self.extract_metadata(text);
        let spans = self.segment_arrays(text);
        tracing::debug!(
            sources = spans.len(),
            version = metadata.format_version.as_deref().unwrap_or("-"),
            "segmented report"
        );

        let arrays: Vec<ParsedArray> = spans.iter().map(|span| self.parse_source(span)).collect();
        let document = ParsedDocument { metadata, arrays };
        tracing::debug!(
            arrays = document.arrays.len(),
            cabinets = document.cabinet_count(),
            "parsed report"
        );
        document
    }

    /// Run the full pipeline on a report file.
    pub fn parse_pdf(
        &self,
        path: &Path,
        backend: &dyn PdfBackend,
    ) -> Result<ParsedDocument, ParsingError> {
        let text = self.extract_text(path, backend)?;
        Ok(self.parse_document(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParsingConfigBuilder;
    use audiopatch_core::BackendError;

    struct FixedText(&'static str);

    impl PdfBackend for FixedText {
        fn extract_text(&self, _path: &Path) -> Result<String, BackendError> {
            Ok(self.0.to_string())
        }
    }

    struct Unreadable;

    impl PdfBackend for Unreadable {
        fn extract_text(&self, path: &Path) -> Result<String, BackendError> {
            Err(BackendError::OpenError(path.display().to_string()))
        }
    }

    const REPORT: &str = "Version: 3.6\n\
        1. Group: Mains\n\
        1.1. Source: K2_L\n\
        # motors: 1\n\
        #1 K2 -1.0 30.00 29.02\n\
        #2 K2 2.5 -3.5 29.02 28.04\n\
        1.2. Source: K2_R\n\
        #1 K2 -1.0 30.00 29.02\n";

    #[test]
    fn test_parse_document() {
        let doc = SoundvisionExtractor::new().parse_document(REPORT);
        assert_eq!(doc.metadata.format_version.as_deref(), Some("3.6"));
        assert_eq!(doc.arrays.len(), 2);
        assert_eq!(doc.arrays[0].source_name, "K2_L");
        assert_eq!(doc.arrays[0].cabinets.len(), 2);
        assert_eq!(doc.arrays[1].symmetry_type, "R");
        assert_eq!(doc.cabinet_count(), 3);
    }

    #[test]
    fn test_parse_pdf_via_backend() {
        let doc = SoundvisionExtractor::new()
            .parse_pdf(Path::new("report.pdf"), &FixedText(REPORT))
            .unwrap();
        assert_eq!(doc.arrays.len(), 2);
    }

    #[test]
    fn test_extraction_failure_is_fatal() {
        let result = SoundvisionExtractor::new().parse_pdf(Path::new("missing.pdf"), &Unreadable);
        assert!(matches!(
            result,
            Err(ParsingError::Backend(BackendError::OpenError(_)))
        ));
    }

    #[test]
    fn test_custom_keyword_routes_table() {
        let config = ParsingConfigBuilder::new()
            .directivity_keyword("Directivity")
            .build()
            .unwrap();
        let extractor = SoundvisionExtractor::with_config(config);
        let text = "Directivity\n#1 KARA II 0 -2.0 24.00 23.02 55/35\n#2 KARA II -2.0 24.00 23.02\n";
        let cabinets = extractor.parse_cabinet_table(text);
        assert_eq!(cabinets.len(), 1);
        assert_eq!(cabinets[0].panflex_setting, "55/35");
    }
}

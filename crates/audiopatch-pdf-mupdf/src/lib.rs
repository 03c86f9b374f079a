use std::path::Path;

use mupdf::{Document, TextPageFlags};

use audiopatch_core::{BackendError, PdfBackend};

/// MuPDF-based implementation of [`PdfBackend`].
///
/// This crate isolates the mupdf dependency (AGPL-3.0) so that code paths
/// reading plain-text reports do not transitively depend on it.
///
/// Pages are emitted in order, one line of output per extracted text line,
/// and joined with a newline. The report header carries the document
/// metadata, so nothing is excluded by default. A footer band can be
/// dropped with [`with_footer_exclusion`](Self::with_footer_exclusion) when
/// page counters such as `3/12` would otherwise land inside a cabinet table;
/// the CLI reads the ratio from `[extraction] footer_exclusion`.
#[derive(Debug, Default)]
pub struct MupdfBackend {
    /// Fraction of page height from bottom to exclude (0.0–1.0).
    footer_exclusion_ratio: Option<f32>,
}

impl MupdfBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the footer exclusion ratio. Pass `0.0` to disable.
    pub fn with_footer_exclusion(mut self, ratio: f32) -> Self {
        self.footer_exclusion_ratio = if ratio > 0.0 { Some(ratio) } else { None };
        self
    }

    pub fn footer_exclusion(&self) -> Option<f32> {
        self.footer_exclusion_ratio
    }
}

fn extraction_error(e: impl std::fmt::Display) -> BackendError {
    BackendError::ExtractionError(e.to_string())
}

impl PdfBackend for MupdfBackend {
    fn extract_text(&self, path: &Path) -> Result<String, BackendError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| BackendError::OpenError("invalid path encoding".into()))?;

        let document =
            Document::open(path_str).map_err(|e| BackendError::OpenError(e.to_string()))?;

        let mut pages_text = Vec::new();
        for page_result in document.pages().map_err(extraction_error)? {
            let page = page_result.map_err(extraction_error)?;
            let text_page = page
                .to_text_page(TextPageFlags::empty())
                .map_err(extraction_error)?;

            let footer_threshold = match self.footer_exclusion_ratio {
                Some(ratio) => {
                    let bounds = page.bounds().map_err(extraction_error)?;
                    Some(bounds.y1 - (bounds.y1 - bounds.y0) * ratio)
                }
                None => None,
            };

            let mut page_text = String::new();
            for block in text_page.blocks() {
                if let Some(threshold) = footer_threshold {
                    if block.bounds().y0 >= threshold {
                        continue;
                    }
                }
                for line in block.lines() {
                    let line_text: String = line
                        .chars()
                        .map(|c| c.char().unwrap_or('\u{FFFD}'))
                        .collect();
                    page_text.push_str(&line_text);
                    page_text.push('\n');
                }
            }
            pages_text.push(page_text);
        }

        tracing::debug!(path = %path.display(), pages = pages_text.len(), "extracted report text");
        Ok(pages_text.join("\n"))
    }
}

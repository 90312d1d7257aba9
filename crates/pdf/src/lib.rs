//! PDF text extraction for the outliner.
//!
//! Turns PDF bytes into an [`outliner_core::DocumentText`]: per-page text
//! runs with position, size and boldness, page heights from the MediaBox,
//! and the information-dictionary title.

use std::path::Path;

use outliner_core::{DocumentText, ExtractionError};
use thiserror::Error;

use parser::backend::LopdfBackend;

pub mod parser;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PdfError> for ExtractionError {
    fn from(e: PdfError) -> Self {
        ExtractionError::Extraction(e.to_string())
    }
}

/// Parse PDF bytes and extract every page's text runs.
pub fn extract_document(bytes: &[u8]) -> Result<DocumentText, PdfError> {
    let backend = LopdfBackend::load_bytes(bytes)?;
    log::debug!("loaded PDF with {} pages", backend.page_count());
    parser::runs::extract_document_text(&backend)
}

/// Read and extract a PDF file.
pub fn extract_document_from_path(path: impl AsRef<Path>) -> Result<DocumentText, PdfError> {
    let bytes = std::fs::read(path.as_ref())?;
    extract_document(&bytes)
}

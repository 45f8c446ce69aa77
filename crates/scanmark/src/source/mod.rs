//! Page-text producers — the OCR/extraction side of the pipeline.
//!
//! The engine does not care whether text came from native PDF extraction
//! or a vision model; anything that can yield per-page text in page order
//! plugs in here.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::ProviderError;

/// Text of one source page, before classification.
#[derive(Debug, Clone)]
pub struct PageText {
    /// 1-based page number within the document.
    pub number: u32,
    pub text: String,
}

impl PageText {
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }
}

/// Produces per-page text for one document at a time, in ascending page
/// order. Implementations wrap OCR services, PDF text extraction, or
/// test fixtures.
pub trait PageSource: Send + Sync {
    fn pages(&self, document: &Path) -> Result<Vec<PageText>, ProviderError>;
}

/// Lists the PDF documents of an intake directory, sorted by path.
///
/// Top level only — archive and output subdirectories are not intake.
/// Extension matching is case-insensitive (`.pdf`, `.PDF`, ...).
pub fn scan_documents(dir: &Path) -> Result<Vec<PathBuf>, ProviderError> {
    let mut documents = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| ProviderError::Scan {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();

        if path.is_dir() {
            continue;
        }

        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        if is_pdf {
            log::debug!("Found document: {}", path.display());
            documents.push(path.to_path_buf());
        }
    }

    documents.sort();
    Ok(documents)
}

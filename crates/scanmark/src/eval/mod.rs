//! Text-to-evaluation consumers — the LLM side of the pipeline.
//!
//! Normalization and grading are sequential calls to an external model;
//! the engine only needs these two capabilities and records whatever
//! structured result comes back.

pub mod parse;

pub use parse::{derive_grade, extract_json_from_text};

use crate::error::ProviderError;

/// Cleans up OCR noise in essay text without changing its meaning.
pub trait Normalizer: Send + Sync {
    fn normalize(&self, text: &str) -> Result<String, ProviderError>;
}

/// Grades essay text against a rubric and context material.
///
/// The returned value is stored serialized; it should carry at least a
/// `score` (or `overall_score`) and free-form feedback.
pub trait Evaluator: Send + Sync {
    fn evaluate(
        &self,
        text: &str,
        rubric: &str,
        context: &str,
    ) -> Result<serde_json::Value, ProviderError>;
}

//! Submission reconstruction from per-page OCR text.
//!
//! Pages arrive one at a time, in page order, with no document structure
//! beyond what the text itself says. The classifier reads the header zone
//! of each page for an explicit name or continuation marker; the
//! aggregator folds the classified pages into per-student submissions.

pub mod aggregate;
pub mod classify;

pub use aggregate::{aggregate, PageResult, Submission};
pub use classify::{Classification, PageClassifier};

/// ASCII form feed, used as the page separator when a multi-page
/// submission is flattened to a single text blob. The scrubber splits on
/// it to apply per-page header budgets.
pub const PAGE_SEPARATOR: char = '\u{0c}';

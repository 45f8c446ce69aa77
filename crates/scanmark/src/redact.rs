//! Helpers for sanitizing data before it enters tracing span attributes.
//!
//! Traces are safe to share for debugging — these functions ensure no
//! student identity or filesystem layout leaks into spans.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;

/// Returns only the filename component of a path (no directory).
///
/// Safe for span fields — reveals file name without exposing the full path.
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Reduces a student label to its initials.
///
/// `"Ann Lee"` → `"A.L."` — enough to follow a submission through the
/// logs without writing the name itself into them.
pub fn redact_label(label: &str) -> String {
    let initials: String = label
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(|c| [c.to_ascii_uppercase(), '.'])
        .collect();

    if initials.is_empty() {
        "<unnamed>".to_string()
    } else {
        initials
    }
}

/// Returns a short deterministic hash of a label for correlation without
/// exposing the label itself.
pub fn hash_label(label: &str) -> String {
    let mut hasher = DefaultHasher::new();
    label.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

use std::sync::Arc;

use regex::Regex;

use crate::roster::{normalize_name, NameRegistry};
use crate::segment::aggregate::PageResult;

/// Headers never appear deep in a page; scanning further only invites
/// false positives from essay body text.
const HEADER_SCAN_LINES: usize = 10;

/// What the header zone of a single page said about its owner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// Name from an explicit `Name:`/`ID:` header, or a registry full-name
    /// line.
    pub detected_name: Option<String>,
    /// Free-text target of a `Continue:` marker. Independent of
    /// `detected_name`; both may be present.
    pub continuation_name: Option<String>,
}

/// Detects name and continuation headers in page text.
pub struct PageClassifier {
    name_pattern: Regex,
    continue_pattern: Regex,
    registry: Arc<NameRegistry>,
}

impl PageClassifier {
    pub fn new(registry: Arc<NameRegistry>) -> Self {
        // One or two words of Unicode letters, apostrophes, and hyphens
        // after a `Name:` / `ID:` label.
        let name_pattern =
            Regex::new(r"(?im)^\s*(?:name|id)\s*[:\-]\s*(\p{L}[\p{L}'\-]*(?:\s+\p{L}[\p{L}'\-]*)?)")
                .expect("name header pattern is valid");
        let continue_pattern = Regex::new(r"(?im)^\s*continue\s*[:\-]\s*(.+)$")
            .expect("continuation header pattern is valid");

        Self {
            name_pattern,
            continue_pattern,
            registry,
        }
    }

    /// Classifies one page's text. Only the first ten lines are examined.
    pub fn classify(&self, text: &str) -> Classification {
        let lines: Vec<&str> = text.lines().take(HEADER_SCAN_LINES).collect();
        let top_section = lines.join("\n");

        Classification {
            detected_name: self.detect_name(&lines, &top_section),
            continuation_name: self.detect_continuation(&top_section),
        }
    }

    /// Classifies and packages a page for aggregation.
    pub fn classify_page(&self, number: u32, text: &str) -> PageResult {
        let classification = self.classify(text);
        PageResult {
            number,
            text: text.to_string(),
            detected_name: classification.detected_name,
            continuation_name: classification.continuation_name,
        }
    }

    fn detect_name(&self, lines: &[&str], top_section: &str) -> Option<String> {
        // Explicit header rule first; top-down, first match wins.
        if let Some(captures) = self.name_pattern.captures(top_section) {
            let name = captures[1].trim().to_string();
            if !name.is_empty() {
                return Some(name);
            }
        }

        // Registry fallback: a header line that IS a known full name,
        // returned in its original casing.
        if !self.registry.is_empty() {
            for line in lines {
                let normalized = normalize_name(line);
                if !normalized.is_empty() && self.registry.contains_full_name(&normalized) {
                    return Some(line.trim().to_string());
                }
            }
        }

        None
    }

    fn detect_continuation(&self, top_section: &str) -> Option<String> {
        self.continue_pattern
            .captures(top_section)
            .map(|captures| captures[1].trim().to_string())
            .filter(|name| !name.is_empty())
    }
}

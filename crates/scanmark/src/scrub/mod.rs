//! Header-zone PII scrubbing.
//!
//! Student names live in the first lines of a page (cover headers, MLA
//! blocks, running headers), so only the header zone is rewritten; essay
//! body text is never touched. Scrubbing is a pure function of the text
//! and the registry, which keeps re-scrubs idempotent.

use regex::{Regex, RegexBuilder};

use crate::config::ScrubConfig;
use crate::roster::NameRegistry;
use crate::segment::PAGE_SEPARATOR;

pub struct Scrubber {
    pattern: Option<Regex>,
    replacement: String,
    line_limit: usize,
    header_lines: usize,
}

impl Scrubber {
    /// Compiles one whole-word alternation over all registry tokens,
    /// longest first so overlapping names ("ann lee" vs "ann") match the
    /// longer form. An empty registry produces a pass-through scrubber.
    pub fn new(registry: &NameRegistry, config: &ScrubConfig) -> Self {
        let mut tokens: Vec<&str> = registry.scrub_tokens().collect();
        tokens.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));

        let pattern = if tokens.is_empty() {
            None
        } else {
            let alternation = tokens
                .iter()
                .map(|t| regex::escape(t))
                .collect::<Vec<_>>()
                .join("|");
            let compiled = RegexBuilder::new(&format!(r"\b(?:{})\b", alternation))
                .case_insensitive(true)
                .build()
                .expect("escaped name alternation is a valid pattern");
            Some(compiled)
        };

        Self {
            pattern,
            replacement: config.replacement.clone(),
            line_limit: config.line_limit,
            header_lines: config.header_lines,
        }
    }

    /// Scrubs registry names from the header zone of `text`.
    ///
    /// Form feeds are page separators: the first page gets the full
    /// `line_limit` budget, every later page only `header_lines` (running
    /// headers are short). Budgets count non-empty lines only; blank
    /// lines pass through uncounted. Page structure and any trailing
    /// newline survive unchanged.
    pub fn scrub(&self, text: &str) -> String {
        if self.pattern.is_none() || text.is_empty() {
            return text.to_string();
        }

        let sections: Vec<String> = text
            .split(PAGE_SEPARATOR)
            .enumerate()
            .map(|(index, section)| {
                let budget = if index == 0 {
                    self.line_limit
                } else {
                    self.header_lines
                };
                self.scrub_section(section, budget)
            })
            .collect();

        sections.join(&PAGE_SEPARATOR.to_string())
    }

    fn scrub_section(&self, section: &str, budget: usize) -> String {
        let pattern = self.pattern.as_ref().expect("checked by caller");

        let mut scrubbed_count = 0;
        let lines: Vec<String> = section
            .split('\n')
            .map(|line| {
                if line.trim().is_empty() {
                    line.to_string()
                } else if scrubbed_count < budget {
                    scrubbed_count += 1;
                    pattern
                        .replace_all(line, regex::NoExpand(&self.replacement))
                        .into_owned()
                } else {
                    line.to_string()
                }
            })
            .collect();

        lines.join("\n")
    }
}

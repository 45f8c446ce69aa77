use std::collections::HashSet;

/// Collapses internal whitespace to single spaces, trims, and lowercases.
///
/// This is the one normalization used everywhere a name acts as a key:
/// registry membership, full-name header matching, and submission
/// aggregation. An empty result means "no usable name".
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Immutable set of known names used for detection and scrubbing.
///
/// `scrub_tokens` holds individual given/family names; `full_names` holds
/// normalized "first last" strings used by the classifier's registry
/// fallback. Names shorter than `min_length` characters are rejected at
/// construction so initials and stray single letters never enter the
/// scrub pattern.
#[derive(Debug, Default)]
pub struct NameRegistry {
    scrub_tokens: HashSet<String>,
    full_names: HashSet<String>,
    min_length: usize,
}

impl NameRegistry {
    pub fn new(min_length: usize) -> Self {
        Self {
            scrub_tokens: HashSet::new(),
            full_names: HashSet::new(),
            min_length,
        }
    }

    /// Builds a registry from pre-split name tokens and full names.
    /// Everything is normalized and length-filtered on the way in.
    pub fn from_parts<T, F>(tokens: T, full_names: F, min_length: usize) -> Self
    where
        T: IntoIterator,
        T::Item: AsRef<str>,
        F: IntoIterator,
        F::Item: AsRef<str>,
    {
        let mut registry = Self::new(min_length);
        for token in tokens {
            registry.add_scrub_token(token.as_ref());
        }
        for name in full_names {
            registry.add_full_name(name.as_ref());
        }
        registry
    }

    pub(crate) fn add_scrub_token(&mut self, raw: &str) {
        let normalized = normalize_name(raw);
        if self.is_valid(&normalized) {
            self.scrub_tokens.insert(normalized);
        }
    }

    pub(crate) fn add_full_name(&mut self, raw: &str) {
        let normalized = normalize_name(raw);
        if self.is_valid(&normalized) {
            self.full_names.insert(normalized);
        }
    }

    fn is_valid(&self, normalized: &str) -> bool {
        normalized.chars().count() >= self.min_length
    }

    pub fn contains_full_name(&self, normalized: &str) -> bool {
        self.full_names.contains(normalized)
    }

    pub fn scrub_tokens(&self) -> impl Iterator<Item = &str> {
        self.scrub_tokens.iter().map(|s| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.scrub_tokens.is_empty() && self.full_names.is_empty()
    }

    pub fn token_count(&self) -> usize {
        self.scrub_tokens.len()
    }
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    pub names_directory: String,
    pub jobs_directory: String,
    #[serde(default)]
    pub database_path: Option<String>,
    #[serde(default = "default_unknown_label")]
    pub unknown_label: String,
    #[serde(default)]
    pub scrub: ScrubConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
}

fn default_unknown_label() -> String {
    "Unknown Student".to_string()
}

/// Budgets for the header-zone scrubber.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrubConfig {
    /// Non-empty lines scrubbed on the first page of a submission.
    #[serde(default = "default_line_limit")]
    pub line_limit: usize,
    /// Non-empty lines scrubbed on each subsequent page. Later pages only
    /// carry short running headers, not full cover-page identification.
    #[serde(default = "default_header_lines")]
    pub header_lines: usize,
    #[serde(default = "default_replacement")]
    pub replacement: String,
    /// Shortest roster name admitted to the scrub set.
    #[serde(default = "default_min_name_length")]
    pub min_name_length: usize,
}

fn default_line_limit() -> usize {
    20
}

fn default_header_lines() -> usize {
    3
}

fn default_replacement() -> String {
    "[STUDENT_NAME]".to_string()
}

fn default_min_name_length() -> usize {
    2
}

impl Default for ScrubConfig {
    fn default() -> Self {
        Self {
            line_limit: default_line_limit(),
            header_lines: default_header_lines(),
            replacement: default_replacement(),
            min_name_length: default_min_name_length(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    #[serde(default = "default_retention_days")]
    pub days: u32,
}

fn default_retention_days() -> u32 {
    210
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            days: default_retention_days(),
        }
    }
}

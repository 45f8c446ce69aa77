use std::path::PathBuf;

use crate::config::{Config, ScrubConfig};

pub struct PipelineConfig {
    /// Base directory for per-job working directories (JSONL backups).
    pub jobs_directory: PathBuf,
    /// Label prefix for submissions with no detected student name.
    pub unknown_label: String,
    pub scrub: ScrubConfig,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            jobs_directory: PathBuf::from(&config.jobs_directory),
            unknown_label: config.unknown_label.clone(),
            scrub: config.scrub.clone(),
        }
    }
}

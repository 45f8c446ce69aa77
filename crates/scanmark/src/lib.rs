pub mod config;
pub mod db;
pub mod error;
pub mod eval;
pub mod jobs;
pub mod jsonl;
pub mod logging;
pub mod pipeline;
pub mod redact;
pub mod retention;
pub mod roster;
pub mod scrub;
pub mod segment;
pub mod source;

pub use config::{load_config, Config, RetentionConfig, ScrubConfig};
pub use error::{
    ConfigError, ProviderError, Result, RosterError, ScanmarkError, StorageError,
};
pub use eval::{Evaluator, Normalizer};
pub use jobs::JobManager;
pub use logging::init_logging;
pub use pipeline::{Pipeline, PipelineConfig, ProgressReporter};
pub use retention::RetentionSweeper;
pub use roster::{load_registry, NameRegistry, StudentRoster};
pub use scrub::Scrubber;
pub use segment::{aggregate, PageClassifier, PageResult, Submission};
pub use source::{scan_documents, PageSource, PageText};

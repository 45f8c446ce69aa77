use std::path::PathBuf;

use crate::segment::{PageResult, Submission};
use crate::source::PageText;

/// Working state for one document moving through ingest.
pub struct DocumentContext {
    pub job_id: String,
    pub document: PathBuf,

    // Step 1 result — guaranteed Some after step_fetch_pages
    pub pages: Option<Vec<PageText>>,

    // Step 2 result — guaranteed Some after step_classify
    pub classified: Option<Vec<PageResult>>,

    // Step 3 result — guaranteed Some after step_aggregate
    pub submissions: Option<Vec<Submission>>,

    // Step 4 result
    pub essay_ids: Vec<i64>,
}

impl DocumentContext {
    pub fn new(job_id: impl Into<String>, document: impl Into<PathBuf>) -> Self {
        Self {
            job_id: job_id.into(),
            document: document.into(),
            pages: None,
            classified: None,
            submissions: None,
            essay_ids: Vec::new(),
        }
    }
}

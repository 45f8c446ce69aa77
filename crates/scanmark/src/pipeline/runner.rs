use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info_span, warn};

use crate::db::essay_repo::{self, EssayMetadata};
use crate::db::{job_repo, Database};
use crate::eval::{derive_grade, Evaluator, Normalizer};
use crate::jsonl;
use crate::redact;
use crate::roster::NameRegistry;
use crate::scrub::Scrubber;
use crate::segment::{aggregate, PageClassifier};
use crate::source::PageSource;

use super::config::PipelineConfig;
use super::context::DocumentContext;
use super::error::PipelineError;
use super::progress::{JobPhase, ProgressEvent, ProgressReporter};

/// Name of the per-job ingest backup file.
const INGEST_BACKUP_FILE: &str = "ocr_results.jsonl";

/// Outcome of ingesting one document or a directory of them.
#[derive(Debug)]
pub struct IngestSummary {
    pub job_id: String,
    pub documents_processed: usize,
    pub submissions_found: usize,
    pub errors: Vec<String>,
}

/// Outcome of one batch stage over a job's essays.
#[derive(Debug)]
pub struct StageSummary {
    pub job_id: String,
    pub processed: usize,
    pub total: usize,
    pub errors: Vec<String>,
}

impl StageSummary {
    fn new(job_id: &str, total: usize) -> Self {
        Self {
            job_id: job_id.to_string(),
            processed: 0,
            total,
            errors: Vec::new(),
        }
    }
}

/// Drives submissions through the grading lifecycle: ingest → scrub →
/// normalize → evaluate. One essay at a time, blocking calls throughout;
/// batch stages collect per-essay errors and keep going.
pub struct Pipeline {
    config: Arc<PipelineConfig>,
    db: Database,
    classifier: PageClassifier,
    scrubber: Scrubber,
}

impl Pipeline {
    /// Production constructor — builds the classifier and scrubber from
    /// one shared registry.
    pub fn from_config(
        config: Arc<PipelineConfig>,
        registry: Arc<NameRegistry>,
        db: Database,
    ) -> Self {
        let scrubber = Scrubber::new(&registry, &config.scrub);
        let classifier = PageClassifier::new(registry);
        Self {
            config,
            db,
            classifier,
            scrubber,
        }
    }

    /// Ingests one document: fetch pages, classify, aggregate, persist
    /// one essay per submission plus a JSONL backup record.
    pub fn ingest_document(
        &self,
        job_id: &str,
        document: &Path,
        source: &dyn PageSource,
        progress: &dyn ProgressReporter,
    ) -> Result<IngestSummary, PipelineError> {
        if job_repo::find_by_id(&self.db, job_id)?.is_none() {
            return Err(PipelineError::JobNotFound(job_id.to_string()));
        }

        let filename = redact::redact_path(document);
        let _span = info_span!("ingest_document", job_id = %job_id, document = %filename).entered();
        progress.report(ProgressEvent::Phase {
            phase: JobPhase::Ingesting,
            message: format!("Reading pages from {}...", filename),
        });

        let mut ctx = DocumentContext::new(job_id, document);
        self.step_fetch_pages(&mut ctx, source)?;
        self.step_classify(&mut ctx);
        self.step_aggregate(&mut ctx);
        self.step_persist(&mut ctx)?;

        let submissions_found = ctx.essay_ids.len();
        progress.report(ProgressEvent::Completed {
            job_id: job_id.to_string(),
            processed: submissions_found,
            total: submissions_found,
        });

        Ok(IngestSummary {
            job_id: job_id.to_string(),
            documents_processed: 1,
            submissions_found,
            errors: Vec::new(),
        })
    }

    /// Ingests every PDF in an intake directory. One failing document is
    /// recorded and skipped; the batch continues.
    pub fn ingest_directory(
        &self,
        job_id: &str,
        intake_dir: &Path,
        source: &dyn PageSource,
        progress: &dyn ProgressReporter,
    ) -> Result<IngestSummary, PipelineError> {
        let documents = crate::source::scan_documents(intake_dir)
            .map_err(PipelineError::Provider)?;

        let mut summary = IngestSummary {
            job_id: job_id.to_string(),
            documents_processed: 0,
            submissions_found: 0,
            errors: Vec::new(),
        };

        for document in &documents {
            match self.ingest_document(job_id, document, source, progress) {
                Ok(one) => {
                    summary.documents_processed += 1;
                    summary.submissions_found += one.submissions_found;
                }
                // A missing job dooms every document; surface it.
                Err(PipelineError::JobNotFound(id)) => {
                    return Err(PipelineError::JobNotFound(id))
                }
                Err(e) => {
                    warn!("Failed to ingest {}: {}", redact::redact_path(document), e);
                    summary
                        .errors
                        .push(format!("{}: {}", redact::redact_path(document), e));
                }
            }
        }

        Ok(summary)
    }

    fn step_fetch_pages(
        &self,
        ctx: &mut DocumentContext,
        source: &dyn PageSource,
    ) -> Result<(), PipelineError> {
        let _step = info_span!("fetch_pages").entered();
        let pages = source.pages(&ctx.document)?;
        ctx.pages = Some(pages);
        Ok(())
    }

    fn step_classify(&self, ctx: &mut DocumentContext) {
        let _step = info_span!("classify_pages").entered();
        let pages = ctx.pages.as_ref().expect("step 1 completed");
        let classified = pages
            .iter()
            .map(|page| self.classifier.classify_page(page.number, &page.text))
            .collect();
        ctx.classified = Some(classified);
    }

    fn step_aggregate(&self, ctx: &mut DocumentContext) {
        let _step = info_span!("aggregate_pages").entered();
        let classified = ctx.classified.as_ref().expect("step 2 completed");
        let submissions = aggregate(classified, &self.config.unknown_label);
        debug!(
            pages = classified.len(),
            submissions = submissions.len(),
            "Aggregated pages into submissions"
        );
        ctx.submissions = Some(submissions);
    }

    fn step_persist(&self, ctx: &mut DocumentContext) -> Result<(), PipelineError> {
        let _step = info_span!("persist_submissions").entered();
        let submissions = ctx.submissions.as_ref().expect("step 3 completed");

        let mut backup_records = Vec::with_capacity(submissions.len());
        for submission in submissions {
            let metadata = EssayMetadata {
                source_file: Some(ctx.document.display().to_string()),
                start_page: Some(submission.start_page),
                end_page: Some(submission.end_page),
                page_count: Some(submission.page_count()),
                ..EssayMetadata::default()
            };
            let text = submission.joined_text();

            let essay_id = essay_repo::insert(
                &self.db,
                &ctx.job_id,
                Some(&submission.student_label),
                &text,
                Some(&metadata),
            )?;
            ctx.essay_ids.push(essay_id);

            debug!(
                essay_id,
                student = %redact::redact_label(&submission.student_label),
                pages = submission.pages.len(),
                "Stored submission"
            );

            backup_records.push(serde_json::json!({
                "job_id": ctx.job_id,
                "student_name": submission.student_label,
                "text": text,
                "metadata": metadata,
            }));
        }

        // Plain-text handoff copy next to the database rows.
        let job_dir = self.config.jobs_directory.join(&ctx.job_id);
        std::fs::create_dir_all(&job_dir).map_err(|e| {
            crate::error::StorageError::CreateDirectory {
                path: job_dir.clone(),
                source: e,
            }
        })?;
        jsonl::write_jsonl(&job_dir.join(INGEST_BACKUP_FILE), &backup_records, true)?;

        Ok(())
    }

    /// Scrubs the raw text of every essay in a job. Empty raw text still
    /// advances the essay to SCRUBBED, with empty scrubbed text.
    pub fn scrub_job(
        &self,
        job_id: &str,
        progress: &dyn ProgressReporter,
    ) -> Result<StageSummary, PipelineError> {
        let _span = info_span!("scrub_job", job_id = %job_id).entered();
        progress.report(ProgressEvent::Phase {
            phase: JobPhase::Scrubbing,
            message: "Scrubbing student names from headers...".to_string(),
        });

        let essays = essay_repo::list_for_job(&self.db, job_id)?;
        if essays.is_empty() {
            warn!("No essays found for job {}", job_id);
        }

        let mut summary = StageSummary::new(job_id, essays.len());
        for essay in &essays {
            let scrubbed = essay
                .raw_text
                .as_deref()
                .map(|raw| self.scrubber.scrub(raw))
                .unwrap_or_default();

            match essay_repo::update_scrubbed(&self.db, essay.id, &scrubbed) {
                Ok(true) => {
                    summary.processed += 1;
                    progress.report(ProgressEvent::EssayCompleted { essay_id: essay.id });
                }
                Ok(false) => {
                    summary
                        .errors
                        .push(format!("Essay {}: no longer exists", essay.id));
                }
                Err(e) => {
                    warn!("Error scrubbing essay {}: {}", essay.id, e);
                    summary.errors.push(format!("Essay {}: {}", essay.id, e));
                    progress.report(ProgressEvent::EssayFailed {
                        essay_id: essay.id,
                        error: e.to_string(),
                    });
                }
            }
        }

        progress.report(ProgressEvent::Completed {
            job_id: job_id.to_string(),
            processed: summary.processed,
            total: summary.total,
        });
        Ok(summary)
    }

    /// Normalizes every essay with usable text (scrubbed preferred over
    /// raw). Essays with nothing to normalize are skipped, not failed.
    pub fn normalize_job(
        &self,
        job_id: &str,
        normalizer: &dyn Normalizer,
        progress: &dyn ProgressReporter,
    ) -> Result<StageSummary, PipelineError> {
        let _span = info_span!("normalize_job", job_id = %job_id).entered();
        progress.report(ProgressEvent::Phase {
            phase: JobPhase::Normalizing,
            message: "Normalizing OCR text...".to_string(),
        });

        let essays = essay_repo::list_for_job(&self.db, job_id)?;
        let mut summary = StageSummary::new(job_id, essays.len());

        for essay in &essays {
            let input = essay
                .scrubbed_text
                .as_deref()
                .filter(|t| !t.is_empty())
                .or_else(|| essay.raw_text.as_deref().filter(|t| !t.is_empty()));
            let Some(input) = input else {
                continue;
            };

            let result = normalizer
                .normalize(input)
                .map_err(PipelineError::Provider)
                .and_then(|text| {
                    essay_repo::update_normalized(&self.db, essay.id, &text)
                        .map_err(PipelineError::Database)
                });

            match result {
                Ok(true) => {
                    summary.processed += 1;
                    progress.report(ProgressEvent::EssayCompleted { essay_id: essay.id });
                }
                Ok(false) => {
                    summary
                        .errors
                        .push(format!("Essay {}: no longer exists", essay.id));
                }
                Err(e) => {
                    warn!("Error normalizing essay {}: {}", essay.id, e);
                    summary.errors.push(format!("Essay {}: {}", essay.id, e));
                    progress.report(ProgressEvent::EssayFailed {
                        essay_id: essay.id,
                        error: e.to_string(),
                    });
                }
            }
        }

        progress.report(ProgressEvent::Completed {
            job_id: job_id.to_string(),
            processed: summary.processed,
            total: summary.total,
        });
        Ok(summary)
    }

    /// Evaluates every essay with usable text (normalized, else scrubbed,
    /// else raw) and records the serialized result plus derived grade.
    pub fn evaluate_job(
        &self,
        job_id: &str,
        evaluator: &dyn Evaluator,
        rubric: &str,
        context_material: &str,
        progress: &dyn ProgressReporter,
    ) -> Result<StageSummary, PipelineError> {
        let _span = info_span!("evaluate_job", job_id = %job_id).entered();
        progress.report(ProgressEvent::Phase {
            phase: JobPhase::Evaluating,
            message: "Evaluating essays against the rubric...".to_string(),
        });

        let essays = essay_repo::list_for_job(&self.db, job_id)?;
        let mut summary = StageSummary::new(job_id, essays.len());

        for essay in &essays {
            let Some(input) = essay.best_text() else {
                continue;
            };

            let result = evaluator
                .evaluate(input, rubric, context_material)
                .map_err(PipelineError::Provider)
                .and_then(|value| {
                    let grade = derive_grade(&value);
                    let serialized = value.to_string();
                    essay_repo::update_evaluation(
                        &self.db,
                        essay.id,
                        &serialized,
                        grade.as_deref(),
                    )
                    .map_err(PipelineError::Database)
                });

            match result {
                Ok(true) => {
                    summary.processed += 1;
                    progress.report(ProgressEvent::EssayCompleted { essay_id: essay.id });
                }
                Ok(false) => {
                    summary
                        .errors
                        .push(format!("Essay {}: no longer exists", essay.id));
                }
                Err(e) => {
                    warn!("Error evaluating essay {}: {}", essay.id, e);
                    summary.errors.push(format!("Essay {}: {}", essay.id, e));
                    progress.report(ProgressEvent::EssayFailed {
                        essay_id: essay.id,
                        error: e.to_string(),
                    });
                }
            }
        }

        progress.report(ProgressEvent::Completed {
            job_id: job_id.to_string(),
            processed: summary.processed,
            total: summary.total,
        });
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScrubConfig;
    use crate::db::essay_repo::EssayStatus;
    use crate::db::job_repo::JobMaterials;
    use crate::error::ProviderError;
    use crate::pipeline::progress::NoopProgress;
    use crate::source::PageText;
    use tempfile::TempDir;

    /// Page source that replays fixed pages for any document.
    struct FixedPages(Vec<PageText>);

    impl PageSource for FixedPages {
        fn pages(&self, _document: &Path) -> Result<Vec<PageText>, ProviderError> {
            Ok(self.0.clone())
        }
    }

    /// Page source that fails for documents whose name contains "bad".
    struct FlakyPages;

    impl PageSource for FlakyPages {
        fn pages(&self, document: &Path) -> Result<Vec<PageText>, ProviderError> {
            if document.to_string_lossy().contains("bad") {
                Err(ProviderError::PageExtraction {
                    path: document.to_path_buf(),
                    reason: "unreadable scan".to_string(),
                })
            } else {
                Ok(vec![PageText::new(1, "Name: Ann Lee\nessay body")])
            }
        }
    }

    struct UppercaseNormalizer;

    impl Normalizer for UppercaseNormalizer {
        fn normalize(&self, text: &str) -> Result<String, ProviderError> {
            Ok(text.to_uppercase())
        }
    }

    struct FixedEvaluator;

    impl Evaluator for FixedEvaluator {
        fn evaluate(
            &self,
            _text: &str,
            rubric: &str,
            _context: &str,
        ) -> Result<serde_json::Value, ProviderError> {
            Ok(serde_json::json!({"score": "A", "feedback": format!("per rubric: {}", rubric)}))
        }
    }

    struct OfflineEvaluator;

    impl Evaluator for OfflineEvaluator {
        fn evaluate(
            &self,
            _text: &str,
            _rubric: &str,
            _context: &str,
        ) -> Result<serde_json::Value, ProviderError> {
            Err(ProviderError::Evaluation("model offline".to_string()))
        }
    }

    struct Harness {
        _jobs_dir: TempDir,
        db: Database,
        pipeline: Pipeline,
        job_id: String,
    }

    fn harness() -> Harness {
        let jobs_dir = TempDir::new().unwrap();
        let db = Database::open_in_memory().unwrap();
        let registry = Arc::new(NameRegistry::from_parts(
            ["ann", "lee", "bo", "kim"],
            ["ann lee", "bo kim"],
            2,
        ));
        let config = Arc::new(PipelineConfig {
            jobs_directory: jobs_dir.path().to_path_buf(),
            unknown_label: "Unknown Student".to_string(),
            scrub: ScrubConfig::default(),
        });
        let pipeline = Pipeline::from_config(config, registry, db.clone());
        let job_id = job_repo::create(&db, &JobMaterials::default()).unwrap();

        Harness {
            _jobs_dir: jobs_dir,
            db,
            pipeline,
            job_id,
        }
    }

    #[test]
    fn test_ingest_document_persists_submissions() {
        let h = harness();
        let source = FixedPages(vec![
            PageText::new(1, "Name: Ann Lee\nHello"),
            PageText::new(2, "Continue: Ann Lee\nWorld"),
            PageText::new(3, "Name: Bo Kim\nHi"),
        ]);

        let summary = h
            .pipeline
            .ingest_document(&h.job_id, Path::new("scans/period3.pdf"), &source, &NoopProgress)
            .unwrap();
        assert_eq!(summary.submissions_found, 2);

        let essays = essay_repo::list_for_job(&h.db, &h.job_id).unwrap();
        assert_eq!(essays.len(), 2);

        let ann = &essays[0];
        assert_eq!(ann.student_name.as_deref(), Some("Ann Lee"));
        assert_eq!(ann.raw_text.as_deref(), Some("Name: Ann Lee\nHello\u{0c}Continue: Ann Lee\nWorld"));
        let metadata = ann.parsed_metadata().unwrap();
        assert_eq!(metadata.start_page, Some(1));
        assert_eq!(metadata.end_page, Some(2));
        assert_eq!(metadata.page_count, Some(2));
        assert_eq!(metadata.source_file.as_deref(), Some("scans/period3.pdf"));

        assert_eq!(essays[1].student_name.as_deref(), Some("Bo Kim"));
    }

    #[test]
    fn test_ingest_writes_jsonl_backup() {
        let h = harness();
        let source = FixedPages(vec![PageText::new(1, "Name: Ann Lee\nHello")]);

        h.pipeline
            .ingest_document(&h.job_id, Path::new("doc.pdf"), &source, &NoopProgress)
            .unwrap();

        let backup = h
            .pipeline
            .config
            .jobs_directory
            .join(&h.job_id)
            .join(INGEST_BACKUP_FILE);
        let records: Vec<serde_json::Value> = jsonl::read_jsonl(&backup).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["student_name"], "Ann Lee");
        assert_eq!(records[0]["job_id"], h.job_id.as_str());
    }

    #[test]
    fn test_ingest_unknown_job_is_an_error() {
        let h = harness();
        let source = FixedPages(vec![PageText::new(1, "text")]);

        let result =
            h.pipeline
                .ingest_document("job_missing", Path::new("doc.pdf"), &source, &NoopProgress);
        assert!(matches!(result, Err(PipelineError::JobNotFound(_))));
    }

    #[test]
    fn test_ingest_directory_collects_per_file_errors() {
        let h = harness();
        let intake = TempDir::new().unwrap();
        std::fs::write(intake.path().join("good.pdf"), b"x").unwrap();
        std::fs::write(intake.path().join("bad.pdf"), b"x").unwrap();

        let summary = h
            .pipeline
            .ingest_directory(&h.job_id, intake.path(), &FlakyPages, &NoopProgress)
            .unwrap();

        assert_eq!(summary.documents_processed, 1);
        assert_eq!(summary.submissions_found, 1);
        assert_eq!(summary.errors.len(), 1);
        assert!(summary.errors[0].contains("bad.pdf"));
    }

    #[test]
    fn test_scrub_job_scrubs_headers_and_advances_status() {
        let h = harness();
        let source = FixedPages(vec![PageText::new(1, "Name: Ann Lee\nEssay about Lee's topic")]);
        h.pipeline
            .ingest_document(&h.job_id, Path::new("doc.pdf"), &source, &NoopProgress)
            .unwrap();

        let summary = h.pipeline.scrub_job(&h.job_id, &NoopProgress).unwrap();
        assert_eq!(summary.processed, 1);
        assert!(summary.errors.is_empty());

        let essay = &essay_repo::list_for_job(&h.db, &h.job_id).unwrap()[0];
        assert_eq!(essay.parsed_status(), Some(EssayStatus::Scrubbed));
        let scrubbed = essay.scrubbed_text.as_deref().unwrap();
        assert!(scrubbed.contains("[STUDENT_NAME]"));
        assert!(!scrubbed.to_lowercase().contains("ann"));
    }

    #[test]
    fn test_scrub_job_with_no_essays() {
        let h = harness();
        let summary = h.pipeline.scrub_job(&h.job_id, &NoopProgress).unwrap();
        assert_eq!(summary.total, 0);
        assert_eq!(summary.processed, 0);
    }

    #[test]
    fn test_scrub_empty_raw_text_still_advances() {
        let h = harness();
        let id = essay_repo::insert(&h.db, &h.job_id, None, "", None).unwrap();

        let summary = h.pipeline.scrub_job(&h.job_id, &NoopProgress).unwrap();
        assert_eq!(summary.processed, 1);

        let essay = essay_repo::find_by_id(&h.db, id).unwrap().unwrap();
        assert_eq!(essay.parsed_status(), Some(EssayStatus::Scrubbed));
        assert_eq!(essay.scrubbed_text.as_deref(), Some(""));
    }

    #[test]
    fn test_normalize_job_prefers_scrubbed_text() {
        let h = harness();
        let id = essay_repo::insert(&h.db, &h.job_id, None, "raw words", None).unwrap();
        essay_repo::update_scrubbed(&h.db, id, "scrubbed words").unwrap();

        let summary = h
            .pipeline
            .normalize_job(&h.job_id, &UppercaseNormalizer, &NoopProgress)
            .unwrap();
        assert_eq!(summary.processed, 1);

        let essay = essay_repo::find_by_id(&h.db, id).unwrap().unwrap();
        assert_eq!(essay.normalized_text.as_deref(), Some("SCRUBBED WORDS"));
        assert_eq!(essay.parsed_status(), Some(EssayStatus::Normalized));
    }

    #[test]
    fn test_normalize_job_skips_textless_essays() {
        let h = harness();
        essay_repo::insert(&h.db, &h.job_id, None, "", None).unwrap();

        let summary = h
            .pipeline
            .normalize_job(&h.job_id, &UppercaseNormalizer, &NoopProgress)
            .unwrap();
        assert_eq!(summary.total, 1);
        assert_eq!(summary.processed, 0);
        assert!(summary.errors.is_empty());
    }

    #[test]
    fn test_evaluate_job_records_grade_and_evaluation() {
        let h = harness();
        let id = essay_repo::insert(&h.db, &h.job_id, Some("Ann Lee"), "essay text", None).unwrap();

        let summary = h
            .pipeline
            .evaluate_job(&h.job_id, &FixedEvaluator, "thesis and evidence", "", &NoopProgress)
            .unwrap();
        assert_eq!(summary.processed, 1);

        let essay = essay_repo::find_by_id(&h.db, id).unwrap().unwrap();
        assert_eq!(essay.parsed_status(), Some(EssayStatus::Graded));
        assert_eq!(essay.grade.as_deref(), Some("A"));
        let evaluation: serde_json::Value =
            serde_json::from_str(essay.evaluation.as_deref().unwrap()).unwrap();
        assert!(evaluation["feedback"]
            .as_str()
            .unwrap()
            .contains("thesis and evidence"));
    }

    #[test]
    fn test_evaluate_job_collects_provider_errors_and_continues() {
        let h = harness();
        essay_repo::insert(&h.db, &h.job_id, Some("Ann Lee"), "first", None).unwrap();
        essay_repo::insert(&h.db, &h.job_id, Some("Bo Kim"), "second", None).unwrap();

        let summary = h
            .pipeline
            .evaluate_job(&h.job_id, &OfflineEvaluator, "rubric", "", &NoopProgress)
            .unwrap();
        assert_eq!(summary.processed, 0);
        assert_eq!(summary.errors.len(), 2);
        assert!(summary.errors[0].contains("model offline"));

        // Nothing advanced.
        for essay in essay_repo::list_for_job(&h.db, &h.job_id).unwrap() {
            assert_eq!(essay.parsed_status(), Some(EssayStatus::Pending));
        }
    }
}

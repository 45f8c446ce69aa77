/// Stages a job moves through, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Ingesting,
    Scrubbing,
    Normalizing,
    Evaluating,
}

impl JobPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobPhase::Ingesting => "ingesting",
            JobPhase::Scrubbing => "scrubbing",
            JobPhase::Normalizing => "normalizing",
            JobPhase::Evaluating => "evaluating",
        }
    }
}

/// Events emitted by the pipeline during processing.
/// Essay text is never carried in events (it can be large, and it is PII
/// before scrubbing).
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    Phase {
        phase: JobPhase,
        message: String,
    },
    EssayCompleted {
        essay_id: i64,
    },
    EssayFailed {
        essay_id: i64,
        error: String,
    },
    Completed {
        job_id: String,
        processed: usize,
        total: usize,
    },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Reporter that writes progress into the tracing stream.
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Phase { phase, message } => {
                tracing::info!(phase = phase.as_str(), "{}", message);
            }
            ProgressEvent::EssayCompleted { essay_id } => {
                tracing::debug!(essay_id, "Essay processed");
            }
            ProgressEvent::EssayFailed { essay_id, error } => {
                tracing::warn!(essay_id, %error, "Essay failed");
            }
            ProgressEvent::Completed {
                job_id,
                processed,
                total,
            } => {
                tracing::info!(%job_id, processed, total, "Stage complete");
            }
        }
    }
}

//! Data lifecycle: deleting jobs past their retention window.
//!
//! The sweep is a pure read (which jobs are old) followed by independent
//! per-job deletions — working directory first, then the database rows.
//! One failed job never aborts the batch; its error is collected and the
//! sweep moves on.

use chrono::{Duration, Utc};

use crate::db::{job_repo, Database};
use crate::error::Result;
use crate::jobs::JobManager;

/// Outcome of one retention sweep.
#[derive(Debug)]
pub struct CleanupSummary {
    pub dry_run: bool,
    pub deleted_jobs: Vec<String>,
    pub errors: Vec<String>,
}

pub struct RetentionSweeper {
    db: Database,
    jobs: JobManager,
}

impl RetentionSweeper {
    pub fn new(db: Database, jobs: JobManager) -> Self {
        Self { db, jobs }
    }

    /// Deletes jobs created more than `retention_days` ago, cascading
    /// over their essays, reports, and working directories. With
    /// `dry_run` the sweep only lists what would be deleted.
    pub fn cleanup_old_jobs(&self, retention_days: u32, dry_run: bool) -> Result<CleanupSummary> {
        let cutoff = Utc::now() - Duration::days(i64::from(retention_days));
        let old_jobs = job_repo::old_job_ids(&self.db, cutoff)?;

        let mut summary = CleanupSummary {
            dry_run,
            deleted_jobs: Vec::new(),
            errors: Vec::new(),
        };

        if old_jobs.is_empty() {
            return Ok(summary);
        }

        tracing::info!(
            count = old_jobs.len(),
            retention_days,
            "Found jobs past retention"
        );

        for job_id in old_jobs {
            if dry_run {
                summary.deleted_jobs.push(job_id);
                continue;
            }

            match self.delete_one(&job_id) {
                Ok(()) => {
                    tracing::info!(%job_id, "Deleted job");
                    summary.deleted_jobs.push(job_id);
                }
                Err(e) => {
                    tracing::warn!(%job_id, error = %e, "Failed to delete job");
                    summary.errors.push(format!("{}: {}", job_id, e));
                }
            }
        }

        Ok(summary)
    }

    fn delete_one(&self, job_id: &str) -> Result<()> {
        self.jobs.remove_job_dir(job_id)?;
        job_repo::delete(&self.db, job_id)?;
        Ok(())
    }
}

//! Job lifecycle glue: the database row and the on-disk working
//! directory are created together.

use std::path::{Path, PathBuf};

use crate::db::job_repo::{self, JobMaterials};
use crate::db::Database;
use crate::error::{Result, StorageError};

/// Creates jobs and resolves their working directories.
pub struct JobManager {
    base_path: PathBuf,
    db: Database,
}

impl JobManager {
    pub fn new<P: AsRef<Path>>(base_path: P, db: Database) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            db,
        }
    }

    /// Creates the database record with its grading materials and the job
    /// directory on disk. Returns the job id.
    pub fn create_job(&self, materials: &JobMaterials) -> Result<String> {
        let job_id = job_repo::create(&self.db, materials)?;

        let job_dir = self.base_path.join(&job_id);
        std::fs::create_dir_all(&job_dir).map_err(|e| StorageError::CreateDirectory {
            path: job_dir.clone(),
            source: e,
        })?;

        tracing::info!(job_id = %job_id, "Created job");
        Ok(job_id)
    }

    /// Returns the path to the job's working directory.
    pub fn job_dir(&self, job_id: &str) -> PathBuf {
        self.base_path.join(job_id)
    }

    /// Removes the job's working directory if present. Used by retention
    /// cleanup before the database rows go.
    pub fn remove_job_dir(&self, job_id: &str) -> Result<()> {
        let job_dir = self.job_dir(job_id);
        if job_dir.exists() {
            std::fs::remove_dir_all(&job_dir).map_err(|e| StorageError::RemoveDirectory {
                path: job_dir.clone(),
                source: e,
            })?;
        }
        Ok(())
    }
}

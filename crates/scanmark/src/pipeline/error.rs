use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Provider failed: {0}")]
    Provider(#[from] crate::error::ProviderError),

    #[error("Database failed: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Backup write failed: {0}")]
    Storage(#[from] crate::error::StorageError),

    #[error("Job not found: {0}")]
    JobNotFound(String),
}

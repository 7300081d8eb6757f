//! Persistence boundary for jobs, answers and metric records.
//!
//! The orchestrator only talks to [`Storage`]; two backends are provided, an
//! in-process map store and a JSON-file store rooted at a data directory.

pub mod file;
pub mod memory;

pub use file::JsonFileStorage;
pub use memory::InMemoryStorage;

use crate::job::{Answer, Job, JobId, JobStatus, MetricRecord, NewAnswer, NewJob, NewMetricRecord};
use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Job not found: {0}")]
    JobNotFound(JobId),
    #[error("Invalid status transition for job {job_id}: {from} -> {to}")]
    InvalidTransition {
        job_id: JobId,
        from: JobStatus,
        to: JobStatus,
    },
    #[error("Answer from provider '{provider}' already recorded for job {job_id}")]
    DuplicateAnswer { job_id: JobId, provider: String },
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Row-level operations the orchestrator needs. Each call is atomic.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn create_job(&self, new_job: NewJob) -> Result<Job, StorageError>;

    async fn get_job(&self, id: JobId) -> Result<Option<Job>, StorageError>;

    /// Move a job to `status`. Unknown jobs yield `Ok(false)`; transitions
    /// that break the lifecycle order are rejected.
    async fn set_job_status(&self, id: JobId, status: JobStatus) -> Result<bool, StorageError>;

    /// Record a provider's answer; one per (job, provider)
    async fn create_answer(&self, answer: NewAnswer) -> Result<Answer, StorageError>;

    /// Answers in insertion order
    async fn get_answers(&self, job_id: JobId) -> Result<Vec<Answer>, StorageError>;

    async fn create_metric(&self, record: NewMetricRecord) -> Result<MetricRecord, StorageError>;

    async fn get_metrics(&self, job_id: JobId) -> Result<Vec<MetricRecord>, StorageError>;

    /// Jobs newest first
    async fn list_jobs(&self, limit: usize, offset: usize) -> Result<Vec<Job>, StorageError>;
}

/// Apply a status change in place, enforcing the lifecycle order
pub(crate) fn apply_transition(job: &mut Job, status: JobStatus) -> Result<(), StorageError> {
    if !job.status.can_transition_to(status) {
        return Err(StorageError::InvalidTransition {
            job_id: job.id,
            from: job.status,
            to: status,
        });
    }
    job.status = status;
    job.updated_at = Utc::now();
    Ok(())
}

pub(crate) fn ensure_unique_provider(
    existing: &[Answer],
    answer: &NewAnswer,
) -> Result<(), StorageError> {
    if existing.iter().any(|a| a.provider == answer.provider) {
        return Err(StorageError::DuplicateAnswer {
            job_id: answer.job_id,
            provider: answer.provider.clone(),
        });
    }
    Ok(())
}

/// Newest first, ties broken by id so paging is stable
pub(crate) fn page_newest_first(mut jobs: Vec<Job>, limit: usize, offset: usize) -> Vec<Job> {
    jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
    jobs.into_iter().skip(offset).take(limit).collect()
}

#[cfg(test)]
mod tests;

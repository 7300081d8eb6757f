use crate::job::{Answer, Job, JobId, JobStatus, MetricRecord, NewAnswer, NewJob, NewMetricRecord};
use crate::storage::{
    Storage, StorageError, apply_transition, ensure_unique_provider, page_newest_first,
};
use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

/// Process-local store backed by concurrent maps
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    jobs: DashMap<JobId, Job>,
    answers: DashMap<JobId, Vec<Answer>>,
    metrics: DashMap<JobId, Vec<MetricRecord>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_job(&self, new_job: NewJob) -> Result<Job, StorageError> {
        let job = new_job.into_job();
        self.jobs.insert(job.id, job.clone());
        debug!(job_id = %job.id, "created job");
        Ok(job)
    }

    async fn get_job(&self, id: JobId) -> Result<Option<Job>, StorageError> {
        Ok(self.jobs.get(&id).map(|entry| entry.value().clone()))
    }

    async fn set_job_status(&self, id: JobId, status: JobStatus) -> Result<bool, StorageError> {
        let Some(mut job) = self.jobs.get_mut(&id) else {
            return Ok(false);
        };
        apply_transition(&mut job, status)?;
        Ok(true)
    }

    async fn create_answer(&self, answer: NewAnswer) -> Result<Answer, StorageError> {
        if !self.jobs.contains_key(&answer.job_id) {
            return Err(StorageError::JobNotFound(answer.job_id));
        }

        let mut answers = self.answers.entry(answer.job_id).or_default();
        ensure_unique_provider(&answers, &answer)?;
        let stored = answer.into_answer();
        answers.push(stored.clone());
        Ok(stored)
    }

    async fn get_answers(&self, job_id: JobId) -> Result<Vec<Answer>, StorageError> {
        Ok(self
            .answers
            .get(&job_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }

    async fn create_metric(&self, record: NewMetricRecord) -> Result<MetricRecord, StorageError> {
        if !self.jobs.contains_key(&record.job_id) {
            return Err(StorageError::JobNotFound(record.job_id));
        }

        let stored = record.into_record();
        self.metrics
            .entry(stored.job_id)
            .or_default()
            .push(stored.clone());
        Ok(stored)
    }

    async fn get_metrics(&self, job_id: JobId) -> Result<Vec<MetricRecord>, StorageError> {
        Ok(self
            .metrics
            .get(&job_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }

    async fn list_jobs(&self, limit: usize, offset: usize) -> Result<Vec<Job>, StorageError> {
        let jobs = self
            .jobs
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        Ok(page_newest_first(jobs, limit, offset))
    }
}

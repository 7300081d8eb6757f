//! # Job Orchestration
//!
//! Drives one job from submission to evaluated results:
//!
//! ```text
//! submit ─► pending ─► processing ─► fan-out (one task per provider)
//!                │                         │
//!                │ no usable provider      ▼
//!                └──────────► failed   join all ─► completed | failed ─► evaluate
//! ```
//!
//! Providers are resolved through a [`ProviderRegistry`] built once from
//! configuration; there is no global client state. Each provider branch writes
//! only its own answer row, and the final status is set by the orchestrator
//! after every branch has joined.

use crate::evaluation::{AnswerInput, evaluate_all};
use crate::job::analytics::{self, JobAnalytics};
use crate::job::{
    Answer, Job, JobId, JobResults, JobStatus, JobStatusReport, NewAnswer, NewJob,
    NewMetricRecord,
};
use crate::llm::{
    LLMProvider, LLMProviderFactory, ProviderKind, ProviderResponse, ProvidersConfig,
    QueryOptions, RetryExecutor,
};
use crate::storage::{Storage, StorageError};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("Job not found: {0}")]
    JobNotFound(JobId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Provider clients available to the orchestrator, keyed by provider name
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn LLMProvider>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiate every vendor that has a usable credential
    pub fn from_config(config: &ProvidersConfig, request_timeout: Duration) -> Self {
        let mut registry = Self::new();
        for kind in ProviderKind::ALL {
            match LLMProviderFactory::create_provider(kind, config.get(kind), request_timeout) {
                Ok(provider) => {
                    debug!(provider = %kind, model = provider.model(), "provider available");
                    registry.register(provider);
                }
                Err(e) => info!(provider = %kind, reason = %e, "provider unavailable"),
            }
        }
        registry
    }

    pub fn with_provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.register(provider);
        self
    }

    pub fn register(&mut self, provider: Arc<dyn LLMProvider>) {
        self.providers
            .insert(provider.provider_name().to_string(), provider);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn LLMProvider>> {
        self.providers.get(name.trim())
    }

    pub fn names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// Owns the end-to-end job lifecycle
pub struct Orchestrator {
    registry: ProviderRegistry,
    storage: Arc<dyn Storage>,
    retry: RetryExecutor,
    options: QueryOptions,
}

impl Orchestrator {
    pub fn new(
        registry: ProviderRegistry,
        storage: Arc<dyn Storage>,
        retry: RetryExecutor,
        options: QueryOptions,
    ) -> Self {
        Self {
            registry,
            storage,
            retry,
            options,
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Create a pending job. An empty provider set means every registered provider.
    ///
    /// A job is returned even when none of its providers is available; it
    /// fails once processed.
    pub async fn submit(&self, new_job: NewJob) -> Result<Job, OrchestratorError> {
        let new_job = if new_job.providers.is_empty() {
            let all = self.registry.names();
            new_job.with_providers(all)
        } else {
            new_job
        };

        let job = self.storage.create_job(new_job).await?;
        info!(
            job_id = %job.id,
            providers = ?job.providers,
            category = %job.category,
            "job submitted"
        );
        Ok(job)
    }

    /// Fan the job's prompt out to `providers`, record every outcome, set the
    /// final status and store one metric record per successful answer.
    ///
    /// Only a pending job is processed. A job already claimed by another call
    /// yields [`StorageError::InvalidTransition`] and is left untouched.
    pub async fn process(
        &self,
        job_id: JobId,
        providers: &[String],
    ) -> Result<JobStatus, OrchestratorError> {
        let job = self
            .storage
            .get_job(job_id)
            .await?
            .ok_or(OrchestratorError::JobNotFound(job_id))?;
        if job.status != JobStatus::Pending {
            return Err(StorageError::InvalidTransition {
                job_id,
                from: job.status,
                to: JobStatus::Processing,
            }
            .into());
        }

        let selected = self.select_providers(providers);
        if selected.is_empty() {
            warn!(job_id = %job_id, requested = ?providers, "no available provider for job");
            return match self.storage.set_job_status(job_id, JobStatus::Failed).await {
                Ok(_) => Ok(JobStatus::Failed),
                Err(e @ StorageError::InvalidTransition { .. }) => Err(e.into()),
                Err(e) => {
                    self.mark_failed(job_id).await;
                    Err(e.into())
                }
            };
        }

        // Claim the job; compensating writes are only ours to make once it is claimed
        match self.storage.set_job_status(job_id, JobStatus::Processing).await {
            Ok(true) => {}
            Ok(false) => return Err(OrchestratorError::JobNotFound(job_id)),
            Err(e @ StorageError::InvalidTransition { .. }) => {
                warn!(job_id = %job_id, error = %e, "job is not pending, not processing it");
                return Err(e.into());
            }
            Err(e) => {
                self.mark_failed(job_id).await;
                return Err(e.into());
            }
        }

        match self.run(&job, selected).await {
            Ok(status) => Ok(status),
            Err(e) => {
                error!(job_id = %job_id, error = %e, "job processing failed");
                self.mark_failed(job_id).await;
                Err(e)
            }
        }
    }

    /// Submit and process in one call, using the job's own provider set
    pub async fn submit_and_process(&self, new_job: NewJob) -> Result<Job, OrchestratorError> {
        let job = self.submit(new_job).await?;
        self.process(job.id, &job.providers).await?;
        self.storage
            .get_job(job.id)
            .await?
            .ok_or(OrchestratorError::JobNotFound(job.id))
    }

    /// Requested providers that have a client, in request order, without duplicates
    fn select_providers(&self, requested: &[String]) -> Vec<(String, Arc<dyn LLMProvider>)> {
        let mut selected: Vec<(String, Arc<dyn LLMProvider>)> = Vec::new();
        for name in requested {
            let name = name.trim();
            if selected.iter().any(|(n, _)| n == name) {
                continue;
            }
            match self.registry.get(name) {
                Some(provider) => selected.push((name.to_string(), provider.clone())),
                None => warn!(provider = name, "requested provider is not available"),
            }
        }
        selected
    }

    async fn run(
        &self,
        job: &Job,
        selected: Vec<(String, Arc<dyn LLMProvider>)>,
    ) -> Result<JobStatus, OrchestratorError> {
        info!(job_id = %job.id, providers = selected.len(), "fan-out started");

        let branches = selected.into_iter().map(|(name, provider)| {
            let model = provider.model().to_string();
            let retry = self.retry.clone();
            let storage = self.storage.clone();
            let prompt = job.prompt.clone();
            let options = self.options.clone();
            let job_id = job.id;
            let (task_name, task_model) = (name.clone(), model.clone());

            let handle = tokio::spawn(async move {
                let response = retry
                    .execute_with_retry(provider.as_ref(), &prompt, &options)
                    .await;
                if let Some(e) = &response.error {
                    warn!(job_id = %job_id, provider = %task_name, error = %e, "provider failed");
                }
                let answer = NewAnswer::from_response(job_id, task_name, task_model, response);
                storage.create_answer(answer).await
            });
            async move { (name, model, handle.await) }
        });

        let mut answers = Vec::new();
        let mut storage_error = None;
        for (name, model, outcome) in join_all(branches).await {
            match outcome {
                Ok(Ok(answer)) => answers.push(answer),
                Ok(Err(e)) => {
                    error!(
                        job_id = %job.id,
                        provider = %name,
                        error = %e,
                        "failed to store answer"
                    );
                    storage_error.get_or_insert(e);
                }
                Err(join_error) => {
                    error!(
                        job_id = %job.id,
                        provider = %name,
                        error = %join_error,
                        "provider task aborted"
                    );
                    let response =
                        ProviderResponse::failure(format!("provider task aborted: {}", join_error));
                    let answer = self
                        .storage
                        .create_answer(NewAnswer::from_response(job.id, name, model, response))
                        .await?;
                    answers.push(answer);
                }
            }
        }
        if let Some(e) = storage_error {
            return Err(e.into());
        }

        let successful: Vec<&Answer> = answers.iter().filter(|a| a.is_successful()).collect();
        let status = if successful.is_empty() {
            JobStatus::Failed
        } else {
            JobStatus::Completed
        };
        self.transition(job.id, status).await?;
        info!(
            job_id = %job.id,
            status = %status,
            successful = successful.len(),
            total = answers.len(),
            "fan-out finished"
        );

        self.evaluate(job, &successful).await?;
        Ok(status)
    }

    async fn evaluate(&self, job: &Job, answers: &[&Answer]) -> Result<(), OrchestratorError> {
        if answers.is_empty() {
            return Ok(());
        }

        let inputs: Vec<AnswerInput> = answers
            .iter()
            .map(|a| AnswerInput {
                id: a.id,
                provider: a.provider.clone(),
                model: a.model.clone(),
                text: a.text.clone(),
            })
            .collect();

        let category = Some(job.category.as_str()).filter(|c| !c.trim().is_empty());
        let report = evaluate_all(&inputs, category);

        for metrics in &report.answers {
            self.storage
                .create_metric(NewMetricRecord::from_evaluation(job.id, metrics, &report))
                .await?;
        }
        debug!(
            job_id = %job.id,
            metrics = report.answers.len(),
            skipped = report.failures.len(),
            average_similarity = report.average_similarity,
            "evaluation stored"
        );
        Ok(())
    }

    async fn transition(&self, job_id: JobId, status: JobStatus) -> Result<(), OrchestratorError> {
        if self.storage.set_job_status(job_id, status).await? {
            Ok(())
        } else {
            Err(OrchestratorError::JobNotFound(job_id))
        }
    }

    /// Best-effort compensating write; a second failure is only logged
    async fn mark_failed(&self, job_id: JobId) {
        match self.storage.set_job_status(job_id, JobStatus::Failed).await {
            Ok(_) => {}
            Err(StorageError::InvalidTransition { from, .. }) if from.is_terminal() => {
                debug!(job_id = %job_id, status = %from, "job already terminal");
            }
            Err(e) => error!(job_id = %job_id, error = %e, "failed to mark job as failed"),
        }
    }

    pub async fn get_job(&self, job_id: JobId) -> Result<Job, OrchestratorError> {
        self.storage
            .get_job(job_id)
            .await?
            .ok_or(OrchestratorError::JobNotFound(job_id))
    }

    pub async fn get_status(&self, job_id: JobId) -> Result<JobStatusReport, OrchestratorError> {
        let job = self.get_job(job_id).await?;
        let answers = self.storage.get_answers(job_id).await?;

        Ok(JobStatusReport {
            job_id,
            status: job.status,
            completed_providers: answers
                .iter()
                .filter(|a| a.is_successful())
                .map(|a| a.provider.clone())
                .collect(),
            total_providers: job.providers.len(),
            message: job.status.message().to_string(),
        })
    }

    /// Stored job, answers and metrics; reading never regenerates anything
    pub async fn get_results(&self, job_id: JobId) -> Result<JobResults, OrchestratorError> {
        let job = self.get_job(job_id).await?;
        let answers = self.storage.get_answers(job_id).await?;
        let metrics = self.storage.get_metrics(job_id).await?;
        Ok(JobResults {
            job,
            answers,
            metrics,
        })
    }

    pub async fn get_analytics(&self, job_id: JobId) -> Result<JobAnalytics, OrchestratorError> {
        self.get_job(job_id).await?;
        let answers = self.storage.get_answers(job_id).await?;
        Ok(analytics::compute(job_id, &answers))
    }

    pub async fn list_jobs(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Job>, OrchestratorError> {
        Ok(self.storage.list_jobs(limit, offset).await?)
    }
}

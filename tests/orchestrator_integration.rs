use async_trait::async_trait;
use futures::future::BoxFuture;
use lea::job::{
    Answer, Job, JobId, JobStatus, MetricRecord, NewAnswer, NewJob, NewMetricRecord,
};
use lea::llm::{LLMError, LLMProvider, ProviderReply, QueryOptions, RetryConfig, RetryExecutor};
use lea::orchestrator::{Orchestrator, OrchestratorError, ProviderRegistry};
use lea::storage::{InMemoryStorage, JsonFileStorage, Storage, StorageError};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

/// Provider that always answers the same way and counts its calls
struct StubProvider {
    name: String,
    outcome: Result<String, String>,
    delay: Duration,
    calls: AtomicUsize,
}

impl StubProvider {
    fn answering(name: &str, text: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            outcome: Ok(text.to_string()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }

    fn slow(name: &str, text: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            outcome: Ok(text.to_string()),
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(name: &str, message: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            outcome: Err(message.to_string()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LLMProvider for StubProvider {
    fn query<'a>(
        &'a self,
        _prompt: &'a str,
        _options: &'a QueryOptions,
    ) -> BoxFuture<'a, Result<ProviderReply, LLMError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match &self.outcome {
                Ok(text) => Ok(ProviderReply {
                    text: text.clone(),
                    tokens_used: 10,
                    metadata: HashMap::new(),
                }),
                Err(message) => Err(LLMError::Network(message.clone())),
            }
        })
    }

    fn provider_name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        "stub-model"
    }

    fn available_models(&self) -> Vec<String> {
        vec!["stub-model".to_string()]
    }
}

/// Provider whose query task panics
struct PanickingProvider;

impl PanickingProvider {
    fn reply(&self) -> Result<ProviderReply, LLMError> {
        panic!("client state corrupted")
    }
}

impl LLMProvider for PanickingProvider {
    fn query<'a>(
        &'a self,
        _prompt: &'a str,
        _options: &'a QueryOptions,
    ) -> BoxFuture<'a, Result<ProviderReply, LLMError>> {
        Box::pin(async move { self.reply() })
    }

    fn provider_name(&self) -> &str {
        "panicky"
    }

    fn model(&self) -> &str {
        "stub-model"
    }

    fn available_models(&self) -> Vec<String> {
        vec!["stub-model".to_string()]
    }
}

fn fast_retry() -> RetryExecutor {
    RetryExecutor::new(RetryConfig {
        timeout_seconds: 5,
        max_retries: 3,
        retry_delay_seconds: 0,
    })
}

fn orchestrator_with(
    providers: Vec<Arc<StubProvider>>,
    storage: Arc<dyn Storage>,
) -> Orchestrator {
    let mut registry = ProviderRegistry::new();
    for provider in providers {
        registry.register(provider);
    }
    Orchestrator::new(registry, storage, fast_retry(), QueryOptions::default())
}

#[tokio::test]
async fn test_one_success_one_failure_completes_job() {
    let stub_a = StubProvider::answering("stub-a", "Use Google Analytics to measure traffic.");
    let stub_b = StubProvider::failing("stub-b", "timeout");
    let orchestrator = orchestrator_with(
        vec![stub_a.clone(), stub_b.clone()],
        Arc::new(InMemoryStorage::new()),
    );

    let job = orchestrator
        .submit(
            NewJob::new("How do I track visitors?", "analytics")
                .with_providers(["stub-a", "stub-b"]),
        )
        .await
        .unwrap();
    assert_eq!(job.status, JobStatus::Pending);

    let status = orchestrator.process(job.id, &job.providers).await.unwrap();
    assert_eq!(status, JobStatus::Completed);
    assert_eq!(stub_a.calls(), 1);
    assert_eq!(stub_b.calls(), 3);

    let results = orchestrator.get_results(job.id).await.unwrap();
    assert_eq!(results.job.status, JobStatus::Completed);
    assert_eq!(results.answers.len(), 2);

    let failed = results
        .answers
        .iter()
        .find(|a| a.provider == "stub-b")
        .unwrap();
    assert!(failed.text.is_empty());
    let error = failed.error.as_deref().unwrap();
    assert!(error.contains("Failed after 3 attempts"));
    assert!(error.contains("timeout"));

    assert_eq!(results.metrics.len(), 1);
    let metric = &results.metrics[0];
    assert_eq!(metric.provider, "stub-a");
    assert_eq!(metric.originality_score, 1.0);
    assert_eq!(metric.average_similarity, 1.0);
    assert!(metric.tool_mentions.contains(&"google analytics".to_string()));
    assert!(metric.domain_terms.contains(&"traffic".to_string()));
}

#[tokio::test]
async fn test_identical_answers_are_not_original() {
    let text = "Compress images and enable caching to improve page speed.";
    let orchestrator = orchestrator_with(
        vec![
            StubProvider::answering("stub-a", text),
            StubProvider::answering("stub-b", text),
        ],
        Arc::new(InMemoryStorage::new()),
    );

    let job = orchestrator
        .submit_and_process(NewJob::new("Speed tips?", "technical"))
        .await
        .unwrap();
    assert_eq!(job.status, JobStatus::Completed);

    let metrics = orchestrator.get_results(job.id).await.unwrap().metrics;
    assert_eq!(metrics.len(), 2);
    for metric in &metrics {
        assert_eq!(metric.average_similarity, 1.0);
        assert_eq!(metric.originality_score, 0.0);
        assert_eq!(metric.similarity_matrix, vec![vec![1.0, 1.0], vec![1.0, 1.0]]);
    }
}

#[tokio::test]
async fn test_empty_provider_set_uses_every_registered_provider() {
    let orchestrator = orchestrator_with(
        vec![
            StubProvider::answering("stub-b", "second answer"),
            StubProvider::answering("stub-a", "first answer"),
        ],
        Arc::new(InMemoryStorage::new()),
    );

    let job = orchestrator
        .submit(NewJob::new("Anything?", "content"))
        .await
        .unwrap();
    assert_eq!(job.providers, vec!["stub-a".to_string(), "stub-b".to_string()]);
}

#[tokio::test]
async fn test_no_available_provider_fails_without_calls() {
    let stub = StubProvider::answering("stub-a", "never asked");
    let orchestrator = orchestrator_with(vec![stub.clone()], Arc::new(InMemoryStorage::new()));

    let job = orchestrator
        .submit(NewJob::new("Anyone there?", "technical").with_providers(["missing"]))
        .await
        .unwrap();
    let status = orchestrator.process(job.id, &job.providers).await.unwrap();

    assert_eq!(status, JobStatus::Failed);
    assert_eq!(stub.calls(), 0);
    let results = orchestrator.get_results(job.id).await.unwrap();
    assert_eq!(results.job.status, JobStatus::Failed);
    assert!(results.answers.is_empty());
    assert!(results.metrics.is_empty());
}

#[tokio::test]
async fn test_all_providers_failing_marks_job_failed() {
    let orchestrator = orchestrator_with(
        vec![StubProvider::failing("stub-a", "invalid key")],
        Arc::new(InMemoryStorage::new()),
    );

    let job = orchestrator
        .submit_and_process(NewJob::new("Hello?", "technical"))
        .await
        .unwrap();
    assert_eq!(job.status, JobStatus::Failed);

    let results = orchestrator.get_results(job.id).await.unwrap();
    assert_eq!(results.answers.len(), 1);
    assert!(results.metrics.is_empty());
}

#[tokio::test]
async fn test_duplicate_requested_providers_are_queried_once() {
    let stub = StubProvider::answering("stub-a", "only once");
    let orchestrator = orchestrator_with(vec![stub.clone()], Arc::new(InMemoryStorage::new()));

    let job = orchestrator
        .submit(NewJob::new("Once?", "technical"))
        .await
        .unwrap();
    orchestrator
        .process(job.id, &["stub-a".to_string(), " stub-a ".to_string()])
        .await
        .unwrap();

    assert_eq!(stub.calls(), 1);
    assert_eq!(orchestrator.get_results(job.id).await.unwrap().answers.len(), 1);
}

#[tokio::test]
async fn test_status_report_and_results_are_stable() {
    let orchestrator = orchestrator_with(
        vec![
            StubProvider::answering("stub-a", "Build quality backlinks from relevant sites."),
            StubProvider::failing("stub-b", "rate limited"),
        ],
        Arc::new(InMemoryStorage::new()),
    );

    let job = orchestrator
        .submit_and_process(NewJob::new("Link building?", "content"))
        .await
        .unwrap();

    let report = orchestrator.get_status(job.id).await.unwrap();
    assert_eq!(report.status, JobStatus::Completed);
    assert_eq!(report.completed_providers, vec!["stub-a".to_string()]);
    assert_eq!(report.total_providers, 2);
    assert_eq!(report.message, JobStatus::Completed.message());

    let first = orchestrator.get_results(job.id).await.unwrap();
    let second = orchestrator.get_results(job.id).await.unwrap();
    assert_eq!(first, second);

    let analytics = orchestrator.get_analytics(job.id).await.unwrap();
    assert_eq!(analytics.total_responses, 2);
    assert_eq!(analytics.successful_responses, 1);
}

#[tokio::test]
async fn test_unknown_job_is_reported() {
    let orchestrator = orchestrator_with(Vec::new(), Arc::new(InMemoryStorage::new()));
    let missing = uuid::Uuid::new_v4();

    assert!(matches!(
        orchestrator.get_status(missing).await,
        Err(OrchestratorError::JobNotFound(id)) if id == missing
    ));
    assert!(matches!(
        orchestrator.process(missing, &[]).await,
        Err(OrchestratorError::JobNotFound(_))
    ));
}

#[tokio::test]
async fn test_concurrent_process_leaves_running_job_alone() {
    let slow = StubProvider::slow(
        "slow",
        "Compress images and lazy-load them.",
        Duration::from_millis(200),
    );
    let orchestrator = orchestrator_with(vec![slow.clone()], Arc::new(InMemoryStorage::new()));
    let job = orchestrator
        .submit(NewJob::new("How do I speed up my pages?", "technical").with_providers(["slow"]))
        .await
        .unwrap();

    let (first, second) = tokio::join!(orchestrator.process(job.id, &job.providers), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        orchestrator.process(job.id, &job.providers).await
    });

    assert!(matches!(
        second,
        Err(OrchestratorError::Storage(StorageError::InvalidTransition {
            from: JobStatus::Processing,
            ..
        }))
    ));
    assert_eq!(first.unwrap(), JobStatus::Completed);
    assert_eq!(slow.calls(), 1);

    let report = orchestrator.get_status(job.id).await.unwrap();
    assert_eq!(report.status, JobStatus::Completed);
    let results = orchestrator.get_results(job.id).await.unwrap();
    assert_eq!(results.answers.len(), 1);
    assert_eq!(results.metrics.len(), 1);
}

#[tokio::test]
async fn test_reprocessing_finished_job_is_rejected() {
    let stub = StubProvider::answering("stub-a", "Write descriptive title tags.");
    let orchestrator = orchestrator_with(vec![stub.clone()], Arc::new(InMemoryStorage::new()));
    let job = orchestrator
        .submit_and_process(NewJob::new("What helps on-page SEO?", "content"))
        .await
        .unwrap();
    assert_eq!(job.status, JobStatus::Completed);

    assert!(matches!(
        orchestrator.process(job.id, &job.providers).await,
        Err(OrchestratorError::Storage(StorageError::InvalidTransition {
            from: JobStatus::Completed,
            ..
        }))
    ));
    assert_eq!(stub.calls(), 1);
    let report = orchestrator.get_status(job.id).await.unwrap();
    assert_eq!(report.status, JobStatus::Completed);
}

#[tokio::test]
async fn test_panicking_provider_is_recorded_as_failure() {
    let healthy = StubProvider::answering("healthy", "Submit an XML sitemap to Search Console.");
    let mut registry = ProviderRegistry::new();
    registry.register(healthy.clone());
    registry.register(Arc::new(PanickingProvider));
    let orchestrator = Orchestrator::new(
        registry,
        Arc::new(InMemoryStorage::new()),
        fast_retry(),
        QueryOptions::default(),
    );

    let job = orchestrator
        .submit_and_process(
            NewJob::new("How do I get pages indexed?", "technical")
                .with_providers(["healthy", "panicky"]),
        )
        .await
        .unwrap();
    assert_eq!(job.status, JobStatus::Completed);

    let results = orchestrator.get_results(job.id).await.unwrap();
    assert_eq!(results.answers.len(), 2);
    let panicky = results
        .answers
        .iter()
        .find(|a| a.provider == "panicky")
        .unwrap();
    assert!(!panicky.is_successful());
    assert!(panicky
        .error
        .as_deref()
        .unwrap()
        .contains("provider task aborted"));
    assert_eq!(results.metrics.len(), 1);
    assert_eq!(results.metrics[0].provider, "healthy");
    assert_eq!(healthy.calls(), 1);
}

/// Delegates to an in-memory store but refuses to record answers
struct AnswerRejectingStorage {
    inner: InMemoryStorage,
}

#[async_trait]
impl Storage for AnswerRejectingStorage {
    async fn create_job(&self, new_job: NewJob) -> Result<Job, StorageError> {
        self.inner.create_job(new_job).await
    }

    async fn get_job(&self, id: JobId) -> Result<Option<Job>, StorageError> {
        self.inner.get_job(id).await
    }

    async fn set_job_status(&self, id: JobId, status: JobStatus) -> Result<bool, StorageError> {
        self.inner.set_job_status(id, status).await
    }

    async fn create_answer(&self, _answer: NewAnswer) -> Result<Answer, StorageError> {
        Err(StorageError::Backend("disk full".to_string()))
    }

    async fn get_answers(&self, job_id: JobId) -> Result<Vec<Answer>, StorageError> {
        self.inner.get_answers(job_id).await
    }

    async fn create_metric(&self, record: NewMetricRecord) -> Result<MetricRecord, StorageError> {
        self.inner.create_metric(record).await
    }

    async fn get_metrics(&self, job_id: JobId) -> Result<Vec<MetricRecord>, StorageError> {
        self.inner.get_metrics(job_id).await
    }

    async fn list_jobs(&self, limit: usize, offset: usize) -> Result<Vec<Job>, StorageError> {
        self.inner.list_jobs(limit, offset).await
    }
}

#[tokio::test]
async fn test_storage_failure_marks_job_failed() {
    let storage = Arc::new(AnswerRejectingStorage {
        inner: InMemoryStorage::new(),
    });
    let orchestrator = orchestrator_with(
        vec![StubProvider::answering("stub-a", "lost answer")],
        storage.clone(),
    );

    let job = orchestrator
        .submit(NewJob::new("Will it persist?", "technical"))
        .await
        .unwrap();
    let result = orchestrator.process(job.id, &job.providers).await;

    assert!(matches!(
        result,
        Err(OrchestratorError::Storage(StorageError::Backend(_)))
    ));
    let stored = storage.get_job(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
}

#[tokio::test]
async fn test_file_storage_end_to_end() {
    let dir = TempDir::new().unwrap();
    let job_id = {
        let storage = JsonFileStorage::open(dir.path()).await.unwrap();
        let orchestrator = orchestrator_with(
            vec![
                StubProvider::answering("stub-a", "Write descriptive meta titles for every page."),
                StubProvider::answering("stub-b", "Use schema markup and structured data."),
            ],
            Arc::new(storage),
        );
        orchestrator
            .submit_and_process(NewJob::new("On-page tips?", "technical").with_tags(["onpage"]))
            .await
            .unwrap()
            .id
    };

    let reopened = JsonFileStorage::open(dir.path()).await.unwrap();
    let job = reopened.get_job(job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.tags, vec!["onpage".to_string()]);
    assert_eq!(reopened.get_answers(job_id).await.unwrap().len(), 2);

    let metrics = reopened.get_metrics(job_id).await.unwrap();
    assert_eq!(metrics.len(), 2);
    assert!(metrics[0].average_similarity < 1.0);

    let listed = reopened.list_jobs(10, 0).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, job_id);
}

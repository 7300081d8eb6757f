use crate::evaluation::{ANALYSIS_VERSION, AnswerMetrics, EvaluationReport};
use crate::llm::ProviderResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Unique identifier for jobs
pub type JobId = Uuid;

/// Unique identifier for answers
pub type AnswerId = Uuid;

/// One prompt dispatched to a set of providers
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Job {
    pub id: JobId,
    pub prompt: String,
    /// Selects the domain-term dictionary used during evaluation
    pub category: String,
    pub tags: Vec<String>,
    /// Requested providers in submission order, without duplicates
    pub providers: Vec<String>,
    pub user_id: Option<String>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Job lifecycle. Moves forward only: pending, processing, then a terminal state.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Created, fan-out not started yet
    Pending,
    /// Provider calls in flight
    Processing,
    /// At least one provider answered
    Completed,
    /// No provider answered, none was available, or processing broke down
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Processing)
                | (JobStatus::Pending, JobStatus::Failed)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Failed)
        )
    }

    /// Fixed human-readable description reported by status queries
    pub fn message(&self) -> &'static str {
        match self {
            JobStatus::Pending => "Query is waiting to be processed",
            JobStatus::Processing => "Query is being processed by LLM providers",
            JobStatus::Completed => "Query processing completed successfully",
            JobStatus::Failed => "Query processing failed",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for creating a job
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct NewJob {
    pub prompt: String,
    pub category: String,
    pub tags: Vec<String>,
    pub providers: Vec<String>,
    pub user_id: Option<String>,
}

impl NewJob {
    pub fn new(prompt: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            category: category.into(),
            ..Default::default()
        }
    }

    pub fn with_providers<I, S>(mut self, providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.providers = providers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Materialize the job in `pending` state. Duplicate providers are dropped.
    pub fn into_job(self) -> Job {
        let now = Utc::now();
        Job {
            id: Uuid::new_v4(),
            prompt: self.prompt,
            category: self.category,
            tags: self.tags,
            providers: dedup_preserving_order(self.providers),
            user_id: self.user_id,
            status: JobStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty() && seen.insert(p.clone()))
        .collect()
}

/// One provider's terminal outcome for a job. Written once, never mutated.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Answer {
    pub id: AnswerId,
    pub job_id: JobId,
    pub provider: String,
    pub model: String,
    /// Empty when the provider failed
    pub text: String,
    pub metadata: HashMap<String, serde_json::Value>,
    pub tokens_used: Option<u64>,
    pub latency_ms: Option<u64>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Answer {
    pub fn is_successful(&self) -> bool {
        self.error.is_none() && !self.text.trim().is_empty()
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    pub fn character_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Parameters for recording an answer
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NewAnswer {
    pub job_id: JobId,
    pub provider: String,
    pub model: String,
    pub text: String,
    pub metadata: HashMap<String, serde_json::Value>,
    pub tokens_used: Option<u64>,
    pub latency_ms: Option<u64>,
    pub error: Option<String>,
}

impl NewAnswer {
    pub fn from_response(
        job_id: JobId,
        provider: impl Into<String>,
        model: impl Into<String>,
        response: ProviderResponse,
    ) -> Self {
        Self {
            job_id,
            provider: provider.into(),
            model: model.into(),
            text: response.text,
            metadata: response.metadata,
            tokens_used: response.tokens_used,
            latency_ms: response.latency_ms,
            error: response.error,
        }
    }

    pub fn into_answer(self) -> Answer {
        Answer {
            id: Uuid::new_v4(),
            job_id: self.job_id,
            provider: self.provider,
            model: self.model,
            text: self.text,
            metadata: self.metadata,
            tokens_used: self.tokens_used,
            latency_ms: self.latency_ms,
            error: self.error,
            created_at: Utc::now(),
        }
    }
}

/// Evaluation output stored for one answer
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MetricRecord {
    pub id: Uuid,
    pub job_id: JobId,
    pub answer_id: AnswerId,
    pub provider: String,
    pub model: String,
    /// Job-wide matrix, rows ordered as `similarity_answer_ids`
    pub similarity_matrix: Vec<Vec<f64>>,
    pub similarity_answer_ids: Vec<AnswerId>,
    pub average_similarity: f64,
    pub originality_score: f64,
    pub factuality_score: f64,
    pub readability_score: f64,
    pub keywords: Vec<String>,
    pub tool_mentions: Vec<String>,
    pub domain_terms: Vec<String>,
    pub response_length: usize,
    pub response_complexity: f64,
    pub analysis_version: String,
    pub computed_at: DateTime<Utc>,
}

/// Parameters for recording a metric
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NewMetricRecord {
    pub job_id: JobId,
    pub answer_id: AnswerId,
    pub provider: String,
    pub model: String,
    pub similarity_matrix: Vec<Vec<f64>>,
    pub similarity_answer_ids: Vec<AnswerId>,
    pub average_similarity: f64,
    pub originality_score: f64,
    pub factuality_score: f64,
    pub readability_score: f64,
    pub keywords: Vec<String>,
    pub tool_mentions: Vec<String>,
    pub domain_terms: Vec<String>,
    pub response_length: usize,
    pub response_complexity: f64,
}

impl NewMetricRecord {
    pub fn from_evaluation(
        job_id: JobId,
        metrics: &AnswerMetrics,
        report: &EvaluationReport,
    ) -> Self {
        Self {
            job_id,
            answer_id: metrics.answer_id,
            provider: metrics.provider.clone(),
            model: metrics.model.clone(),
            similarity_matrix: report.similarity_matrix.clone(),
            similarity_answer_ids: report.answer_ids.clone(),
            average_similarity: report.average_similarity,
            originality_score: metrics.originality_score,
            factuality_score: metrics.factuality_score,
            readability_score: metrics.readability_score,
            keywords: metrics.keywords.clone(),
            tool_mentions: metrics.tool_mentions.clone(),
            domain_terms: metrics.domain_terms.clone(),
            response_length: metrics.response_length,
            response_complexity: metrics.response_complexity,
        }
    }

    pub fn into_record(self) -> MetricRecord {
        MetricRecord {
            id: Uuid::new_v4(),
            job_id: self.job_id,
            answer_id: self.answer_id,
            provider: self.provider,
            model: self.model,
            similarity_matrix: self.similarity_matrix,
            similarity_answer_ids: self.similarity_answer_ids,
            average_similarity: self.average_similarity,
            originality_score: self.originality_score,
            factuality_score: self.factuality_score,
            readability_score: self.readability_score,
            keywords: self.keywords,
            tool_mentions: self.tool_mentions,
            domain_terms: self.domain_terms,
            response_length: self.response_length,
            response_complexity: self.response_complexity,
            analysis_version: ANALYSIS_VERSION.to_string(),
            computed_at: Utc::now(),
        }
    }
}

/// Answer to a status query
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct JobStatusReport {
    pub job_id: JobId,
    pub status: JobStatus,
    /// Providers whose answer succeeded
    pub completed_providers: Vec<String>,
    pub total_providers: usize,
    pub message: String,
}

/// Everything recorded for one job
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct JobResults {
    pub job: Job,
    pub answers: Vec<Answer>,
    pub metrics: Vec<MetricRecord>,
}

//! Response statistics for a single job.

use crate::job::types::{Answer, AnswerId, JobId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct JobAnalytics {
    pub job_id: JobId,
    pub total_responses: usize,
    pub successful_responses: usize,
    pub failed_responses: usize,
    /// Mean over answers that reported a latency
    pub avg_latency_ms: f64,
    /// Mean over answers that reported a token count
    pub avg_tokens_used: f64,
    pub avg_word_count: f64,
    pub providers: BTreeMap<String, ProviderStats>,
    pub responses: Vec<ResponseDetail>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ProviderStats {
    pub total_responses: usize,
    pub successful_responses: usize,
    pub avg_latency_ms: f64,
    pub avg_tokens_used: f64,
    pub avg_word_count: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ResponseDetail {
    pub answer_id: AnswerId,
    pub provider: String,
    pub model: String,
    pub successful: bool,
    pub latency_ms: Option<u64>,
    pub tokens_used: Option<u64>,
    pub word_count: usize,
    pub character_count: usize,
    pub error: Option<String>,
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

fn stats_for<'a>(answers: impl Iterator<Item = &'a Answer> + Clone) -> ProviderStats {
    ProviderStats {
        total_responses: answers.clone().count(),
        successful_responses: answers.clone().filter(|a| a.is_successful()).count(),
        avg_latency_ms: mean(answers.clone().filter_map(|a| a.latency_ms).map(|v| v as f64)),
        avg_tokens_used: mean(answers.clone().filter_map(|a| a.tokens_used).map(|v| v as f64)),
        avg_word_count: mean(answers.map(|a| a.word_count() as f64)),
    }
}

/// Summarize the stored answers of `job_id`
pub fn compute(job_id: JobId, answers: &[Answer]) -> JobAnalytics {
    let overall = stats_for(answers.iter());

    let mut providers = BTreeMap::new();
    for answer in answers {
        providers
            .entry(answer.provider.clone())
            .or_insert_with(|| stats_for(answers.iter().filter(|a| a.provider == answer.provider)));
    }

    let responses = answers
        .iter()
        .map(|a| ResponseDetail {
            answer_id: a.id,
            provider: a.provider.clone(),
            model: a.model.clone(),
            successful: a.is_successful(),
            latency_ms: a.latency_ms,
            tokens_used: a.tokens_used,
            word_count: a.word_count(),
            character_count: a.character_count(),
            error: a.error.clone(),
        })
        .collect();

    JobAnalytics {
        job_id,
        total_responses: overall.total_responses,
        successful_responses: overall.successful_responses,
        failed_responses: overall.total_responses - overall.successful_responses,
        avg_latency_ms: overall.avg_latency_ms,
        avg_tokens_used: overall.avg_tokens_used,
        avg_word_count: overall.avg_word_count,
        providers,
        responses,
    }
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One collected answer handed to the evaluator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerInput {
    pub id: Uuid,
    pub provider: String,
    pub model: String,
    pub text: String,
}

/// Scores and extractions computed for a single answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerMetrics {
    pub answer_id: Uuid,
    pub provider: String,
    pub model: String,
    pub originality_score: f64,
    pub factuality_score: f64,
    pub readability_score: f64,
    pub keywords: Vec<String>,
    pub tool_mentions: Vec<String>,
    pub domain_terms: Vec<String>,
    /// Length of the answer in characters
    pub response_length: usize,
    /// Words per sentence
    pub response_complexity: f64,
}

/// Aggregates across every evaluated answer of a job
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverallMetrics {
    pub avg_originality: f64,
    pub avg_factuality: f64,
    pub avg_readability: f64,
    pub total_keywords: usize,
    pub total_tools: usize,
    pub total_domain_terms: usize,
}

/// Full output of one evaluation run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Row/column order of `similarity_matrix`
    pub answer_ids: Vec<Uuid>,
    pub similarity_matrix: Vec<Vec<f64>>,
    pub average_similarity: f64,
    pub answers: Vec<AnswerMetrics>,
    pub overall: OverallMetrics,
    /// Answers that could not be scored, with the cause
    pub failures: Vec<EvaluationFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationFailure {
    pub answer_id: Uuid,
    pub reason: String,
}

impl EvaluationReport {
    pub fn metrics_for(&self, answer_id: Uuid) -> Option<&AnswerMetrics> {
        self.answers.iter().find(|m| m.answer_id == answer_id)
    }
}

/// Errors raised while scoring a single answer
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error("Score '{metric}' is not a finite number: {value}")]
    NonFiniteScore { metric: &'static str, value: f64 },
    #[error("Invalid extraction pattern: {0}")]
    InvalidPattern(String),
    #[error("Scoring panicked: {0}")]
    Panicked(String),
}

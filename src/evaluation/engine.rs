use crate::evaluation::keywords::{
    distinct_count, extract_domain_terms, extract_keywords, extract_tools,
};
use crate::evaluation::scores::{factuality, originality, readability};
use crate::evaluation::similarity::similarity_matrix;
use crate::evaluation::text::words_per_sentence;
use crate::evaluation::types::{
    AnswerInput, AnswerMetrics, EvaluationError, EvaluationFailure, EvaluationReport,
    OverallMetrics,
};
use std::panic::{AssertUnwindSafe, catch_unwind};
use tracing::{debug, warn};

/// Version tag stored alongside every metric record
pub const ANALYSIS_VERSION: &str = "1.0";

/// Score every answer against the whole set.
///
/// Scoring is best-effort per answer: a failure is logged and recorded in
/// [`EvaluationReport::failures`] while the remaining answers are still scored.
pub fn evaluate_all(answers: &[AnswerInput], category: Option<&str>) -> EvaluationReport {
    if answers.is_empty() {
        return EvaluationReport {
            similarity_matrix: Vec::new(),
            ..Default::default()
        };
    }

    let texts: Vec<&str> = answers.iter().map(|a| a.text.as_str()).collect();
    let (matrix, average_similarity) = similarity_matrix(&texts);

    let mut metrics = Vec::with_capacity(answers.len());
    let mut failures = Vec::new();

    for (index, answer) in answers.iter().enumerate() {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            evaluate_one(index, answer, &texts, category)
        }))
        .unwrap_or_else(|panic| Err(EvaluationError::Panicked(panic_message(panic.as_ref()))));

        match outcome {
            Ok(m) => metrics.push(m),
            Err(e) => {
                warn!(
                    answer_id = %answer.id,
                    provider = %answer.provider,
                    error = %e,
                    "skipping answer during evaluation"
                );
                failures.push(EvaluationFailure {
                    answer_id: answer.id,
                    reason: e.to_string(),
                });
            }
        }
    }

    let overall = overall_metrics(&metrics);
    debug!(
        answers = answers.len(),
        scored = metrics.len(),
        average_similarity,
        "evaluation finished"
    );

    EvaluationReport {
        answer_ids: answers.iter().map(|a| a.id).collect(),
        similarity_matrix: matrix,
        average_similarity,
        answers: metrics,
        overall,
        failures,
    }
}

fn evaluate_one(
    index: usize,
    answer: &AnswerInput,
    texts: &[&str],
    category: Option<&str>,
) -> Result<AnswerMetrics, EvaluationError> {
    let text = answer.text.as_str();

    let originality_score = finite("originality", originality(index, texts))?;
    let factuality_score = finite("factuality", factuality(text))?;
    let readability_score = finite("readability", readability(text))?;
    let response_complexity = finite("response_complexity", words_per_sentence(text))?;

    Ok(AnswerMetrics {
        answer_id: answer.id,
        provider: answer.provider.clone(),
        model: answer.model.clone(),
        originality_score,
        factuality_score,
        readability_score,
        keywords: extract_keywords(text)?,
        tool_mentions: extract_tools(text),
        domain_terms: extract_domain_terms(text, category),
        response_length: text.chars().count(),
        response_complexity,
    })
}

fn finite(metric: &'static str, value: f64) -> Result<f64, EvaluationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvaluationError::NonFiniteScore { metric, value })
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

fn overall_metrics(metrics: &[AnswerMetrics]) -> OverallMetrics {
    if metrics.is_empty() {
        return OverallMetrics::default();
    }

    let mean = |f: fn(&AnswerMetrics) -> f64| {
        metrics.iter().map(f).sum::<f64>() / metrics.len() as f64
    };

    OverallMetrics {
        avg_originality: mean(|m| m.originality_score),
        avg_factuality: mean(|m| m.factuality_score),
        avg_readability: mean(|m| m.readability_score),
        total_keywords: distinct_count(metrics.iter().map(|m| &m.keywords)),
        total_tools: distinct_count(metrics.iter().map(|m| &m.tool_mentions)),
        total_domain_terms: distinct_count(metrics.iter().map(|m| &m.domain_terms)),
    }
}

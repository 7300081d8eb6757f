//! Comparative scoring of the answers collected for one job.
//!
//! Everything here is a pure function of the answer texts and the job's
//! category; no I/O happens in this module.

pub mod engine;
pub mod keywords;
pub mod scores;
pub mod similarity;
pub mod text;
pub mod types;

pub use engine::{ANALYSIS_VERSION, evaluate_all};
pub use types::{
    AnswerInput, AnswerMetrics, EvaluationError, EvaluationFailure, EvaluationReport,
    OverallMetrics,
};

//! # LLM Evaluation Agent
//!
//! Sends one prompt to several LLM providers in parallel, stores every
//! provider's outcome and scores the successful answers against each other.
//!
//! ## Architecture Overview
//!
//! - **[`llm`]**: Provider-agnostic client trait, one adapter per vendor and the
//!   timeout/retry executor every outbound call goes through
//! - **[`evaluation`]**: Pure comparative scoring (similarity, originality,
//!   factuality, readability, keyword and domain-term extraction)
//! - **[`job`]**: Job, answer and metric records plus per-job analytics
//! - **[`storage`]**: Persistence boundary with in-memory and JSON-file backends
//! - **[`orchestrator`]**: Job lifecycle, provider fan-out and evaluation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lea::job::NewJob;
//! use lea::llm::{ProvidersConfig, QueryOptions, RetryConfig, RetryExecutor};
//! use lea::orchestrator::{Orchestrator, ProviderRegistry};
//! use lea::storage::InMemoryStorage;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut providers = ProvidersConfig::default();
//!     providers.apply_env_overrides();
//!
//!     let orchestrator = Orchestrator::new(
//!         ProviderRegistry::from_config(&providers, Duration::from_secs(30)),
//!         Arc::new(InMemoryStorage::new()),
//!         RetryExecutor::new(RetryConfig::default()),
//!         QueryOptions::default(),
//!     );
//!
//!     let job = orchestrator
//!         .submit_and_process(NewJob::new("How do I improve page speed?", "technical"))
//!         .await?;
//!     let results = orchestrator.get_results(job.id).await?;
//!     println!("{} answers, {} metric records", results.answers.len(), results.metrics.len());
//!     Ok(())
//! }
//! ```

/// Provider-agnostic LLM interface.
///
/// Adapters for OpenAI, Anthropic, Google and Perplexity share one trait and
/// one retry executor.
pub mod llm;

/// Comparative answer scoring.
pub mod evaluation;

/// Job records and analytics.
pub mod job;

/// Persistence of jobs, answers and metrics.
pub mod storage;

/// Job lifecycle and provider fan-out.
pub mod orchestrator;

/// Environment constants and path utilities.
///
/// Centralizes all hardcoded paths and directory names used throughout
/// the application.
pub mod env;

// CLI module for command-line interface
pub mod cli;

pub use evaluation::{EvaluationReport, evaluate_all};
pub use job::{Answer, Job, JobId, JobStatus, MetricRecord, NewJob};
pub use llm::{LLMError, LLMProvider, ProviderKind, ProviderResponse, QueryOptions};
pub use orchestrator::{Orchestrator, OrchestratorError, ProviderRegistry};
pub use storage::{InMemoryStorage, JsonFileStorage, Storage, StorageError};

use crate::llm::provider::LLMProvider;
use crate::llm::types::{LLMError, ProviderResponse, QueryOptions};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Extra time the HTTP client gets beyond one attempt, so the attempt timeout
/// always fires first and surfaces as [`LLMError::Timeout`]
const TRANSPORT_TIMEOUT_SLACK: Duration = Duration::from_secs(5);

/// Retry policy applied uniformly to every provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Wall-clock budget for a single attempt
    pub timeout_seconds: u64,
    /// Total number of attempts, including the first
    pub max_retries: u32,
    /// Base backoff; the wait after attempt `n` is `n * retry_delay_seconds`
    pub retry_delay_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            max_retries: 3,
            retry_delay_seconds: 1,
        }
    }
}

impl RetryConfig {
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Timeout for the underlying HTTP client
    pub fn transport_timeout(&self) -> Duration {
        self.attempt_timeout() + TRANSPORT_TIMEOUT_SLACK
    }

    /// Backoff before the attempt following `attempt` (1-based)
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        Duration::from_secs(self.retry_delay_seconds.saturating_mul(attempt as u64))
    }
}

/// Suspension primitive used between attempts
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()>;
}

/// Sleeps on the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Runs one provider call under the retry policy and normalizes the outcome
#[derive(Clone)]
pub struct RetryExecutor {
    config: RetryConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl std::fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RetryExecutor {
    pub fn new(config: RetryConfig) -> Self {
        Self::with_sleeper(config, Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(config: RetryConfig, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { config, sleeper }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Query `provider` until it succeeds or the attempt budget runs out.
    ///
    /// Never fails: exhaustion is reported as a [`ProviderResponse`] whose
    /// `error` names the attempt count and the last cause. Latency covers the
    /// successful attempt only.
    pub async fn execute_with_retry(
        &self,
        provider: &dyn LLMProvider,
        prompt: &str,
        options: &QueryOptions,
    ) -> ProviderResponse {
        let max_attempts = self.config.max_retries.max(1);
        let timeout = self.config.attempt_timeout();
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            let started = Instant::now();
            let outcome = match tokio::time::timeout(timeout, provider.query(prompt, options)).await
            {
                // Blank text is a failure whichever client produced it
                Ok(Ok(reply)) if reply.text.trim().is_empty() => Err(LLMError::EmptyCompletion),
                Ok(result) => result,
                Err(_) => Err(LLMError::Timeout(self.config.timeout_seconds)),
            };

            match outcome {
                Ok(reply) => {
                    let latency_ms = started.elapsed().as_millis() as u64;
                    debug!(
                        provider = provider.provider_name(),
                        attempt, latency_ms, "provider call succeeded"
                    );
                    return ProviderResponse::success(reply, latency_ms);
                }
                Err(error) => {
                    warn!(
                        provider = provider.provider_name(),
                        attempt,
                        max_attempts,
                        error = %error,
                        "provider call failed"
                    );
                    last_error = Some(error);

                    if attempt < max_attempts {
                        self.sleeper.sleep(self.config.backoff_after(attempt)).await;
                    }
                }
            }
        }

        let cause = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown error".to_string());
        ProviderResponse::failure(format!("Failed after {} attempts: {}", max_attempts, cause))
    }
}

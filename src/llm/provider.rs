use crate::llm::types::{LLMError, ProviderConfig, ProviderKind, ProviderReply, QueryOptions};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;

/// Generic LLM Provider trait implemented once per vendor
pub trait LLMProvider: Send + Sync {
    /// Send one prompt and return one normalized completion
    ///
    /// Exactly one outbound call is made; retries belong to
    /// [`RetryExecutor`](crate::llm::retry::RetryExecutor). An empty completion is an error.
    fn query<'a>(
        &'a self,
        prompt: &'a str,
        options: &'a QueryOptions,
    ) -> BoxFuture<'a, Result<ProviderReply, LLMError>>;

    /// Get provider name/identifier
    fn provider_name(&self) -> &str;

    /// Model this client sends requests to
    fn model(&self) -> &str;

    /// Get supported models
    fn available_models(&self) -> Vec<String>;
}

/// Factory for creating vendor clients from configuration
pub struct LLMProviderFactory;

impl LLMProviderFactory {
    /// Build the client for `kind`, or fail when it has no usable credential
    pub fn create_provider(
        kind: ProviderKind,
        config: &ProviderConfig,
        request_timeout: Duration,
    ) -> Result<Arc<dyn LLMProvider>, LLMError> {
        let api_key = config.usable_api_key().ok_or_else(|| {
            LLMError::ProviderUnavailable(format!("no usable API key configured for {}", kind))
        })?;

        let model = config.model_or_default(kind);
        let base_url = crate::llm::http::resolve_base_url(kind, config.base_url.as_deref())?;
        let client = crate::llm::http::build_client(request_timeout)?;

        let provider: Arc<dyn LLMProvider> = match kind {
            ProviderKind::OpenAI => Arc::new(crate::llm::openai_provider::OpenAIProvider::new(
                client, base_url, api_key, model,
            )),
            ProviderKind::Anthropic => Arc::new(
                crate::llm::anthropic_provider::AnthropicProvider::new(
                    client, base_url, api_key, model,
                ),
            ),
            ProviderKind::Google => Arc::new(crate::llm::google_provider::GoogleProvider::new(
                client, base_url, api_key, model,
            )),
            ProviderKind::Perplexity => Arc::new(
                crate::llm::perplexity_provider::PerplexityProvider::new(
                    client, base_url, api_key, model,
                ),
            ),
        };

        Ok(provider)
    }
}

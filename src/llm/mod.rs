pub mod anthropic_provider;
pub mod google_provider;
pub mod http;
pub mod openai_provider;
pub mod perplexity_provider;
pub mod provider;
pub mod retry;
pub mod types;

pub use anthropic_provider::AnthropicProvider;
pub use google_provider::GoogleProvider;
pub use openai_provider::OpenAIProvider;
pub use perplexity_provider::PerplexityProvider;
pub use provider::{LLMProvider, LLMProviderFactory};
pub use retry::{RetryConfig, RetryExecutor, Sleeper, TokioSleeper};
pub use types::*;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Multiplier applied to a word count when a provider does not report token usage.
pub const TOKENS_PER_WORD_ESTIMATE: f64 = 1.3;

/// Persona every provider is asked to adopt before answering.
pub const SYSTEM_INSTRUCTION: &str = "You are an expert SEO consultant. \
    Provide detailed, actionable advice for SEO questions. \
    Focus on practical, implementable strategies and current best practices.";

/// Sampling options shared by every provider request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

/// Successful completion as reported by a single provider call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderReply {
    pub text: String,
    pub tokens_used: u64,
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Terminal outcome of one provider for one job, after retries.
///
/// Exactly one of `text` (non-empty) or `error` is authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub text: String,
    pub tokens_used: Option<u64>,
    pub latency_ms: Option<u64>,
    pub metadata: HashMap<String, serde_json::Value>,
    pub error: Option<String>,
}

/// Supported LLM vendors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAI,
    Anthropic,
    Google,
    Perplexity,
}

/// Credentials and model selection for one vendor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

/// Mapping from vendor to its configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub openai: ProviderConfig,
    pub anthropic: ProviderConfig,
    pub google: ProviderConfig,
    pub perplexity: ProviderConfig,
}

/// Generic LLM errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LLMError {
    #[error("Authentication failed: {0}")]
    Authentication(String),
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Model not available: {0}")]
    ModelUnavailable(String),
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timeout after {0} seconds")]
    Timeout(u64),
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Provider returned an empty completion")]
    EmptyCompletion,
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            max_tokens: 2000,
            temperature: 0.7,
            top_p: 1.0,
        }
    }
}

impl ProviderResponse {
    pub fn success(reply: ProviderReply, latency_ms: u64) -> Self {
        Self {
            text: reply.text,
            tokens_used: Some(reply.tokens_used),
            latency_ms: Some(latency_ms),
            metadata: reply.metadata,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            tokens_used: None,
            latency_ms: None,
            metadata: HashMap::new(),
            error: Some(message.into()),
        }
    }

    pub fn is_successful(&self) -> bool {
        self.error.is_none() && !self.text.trim().is_empty()
    }
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::OpenAI,
        ProviderKind::Anthropic,
        ProviderKind::Google,
        ProviderKind::Perplexity,
    ];

    /// Identifier used in provider sets and stored answers
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Google => "google",
            ProviderKind::Perplexity => "perplexity",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "gpt-4",
            ProviderKind::Anthropic => "claude-3-5-sonnet-20241022",
            ProviderKind::Google => "gemini-1.5-pro",
            ProviderKind::Perplexity => "sonar-pro",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "https://api.openai.com",
            ProviderKind::Anthropic => "https://api.anthropic.com",
            ProviderKind::Google => "https://generativelanguage.googleapis.com",
            ProviderKind::Perplexity => "https://api.perplexity.ai",
        }
    }

    /// Environment variable that overrides the configured key
    pub fn api_key_env_var(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => crate::env::vars::OPENAI_API_KEY,
            ProviderKind::Anthropic => crate::env::vars::ANTHROPIC_API_KEY,
            ProviderKind::Google => crate::env::vars::GOOGLE_API_KEY,
            ProviderKind::Perplexity => crate::env::vars::PERPLEXITY_API_KEY,
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ProviderConfig {
    /// Key usable for outbound calls, ignoring blanks and template placeholders
    pub fn usable_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !is_placeholder_credential(key))
    }

    pub fn model_or_default(&self, kind: ProviderKind) -> String {
        self.model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| kind.default_model().to_string())
    }
}

impl ProvidersConfig {
    pub fn get(&self, kind: ProviderKind) -> &ProviderConfig {
        match kind {
            ProviderKind::OpenAI => &self.openai,
            ProviderKind::Anthropic => &self.anthropic,
            ProviderKind::Google => &self.google,
            ProviderKind::Perplexity => &self.perplexity,
        }
    }

    pub fn get_mut(&mut self, kind: ProviderKind) -> &mut ProviderConfig {
        match kind {
            ProviderKind::OpenAI => &mut self.openai,
            ProviderKind::Anthropic => &mut self.anthropic,
            ProviderKind::Google => &mut self.google,
            ProviderKind::Perplexity => &mut self.perplexity,
        }
    }

    /// Apply `*_API_KEY` environment variables on top of file values
    pub fn apply_env_overrides(&mut self) {
        for kind in ProviderKind::ALL {
            if let Ok(key) = std::env::var(kind.api_key_env_var())
                && !key.trim().is_empty()
            {
                self.get_mut(kind).api_key = Some(key);
            }
        }
    }
}

/// True for empty keys and values copied verbatim from config templates
pub fn is_placeholder_credential(key: &str) -> bool {
    let key = key.trim();
    if key.is_empty() {
        return true;
    }
    let lower = key.to_ascii_lowercase();
    (lower.starts_with("your_") && lower.ends_with("_here"))
        || (key.starts_with('[') && key.ends_with(']'))
        || (key.starts_with('<') && key.ends_with('>'))
}

/// Token count estimate used when a provider omits usage accounting
pub fn estimate_tokens_from_words(text: &str) -> u64 {
    let words = text.split_whitespace().count();
    (words as f64 * TOKENS_PER_WORD_ESTIMATE).floor() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_credentials() {
        assert!(is_placeholder_credential(""));
        assert!(is_placeholder_credential("   "));
        assert!(is_placeholder_credential("your_openai_api_key_here"));
        assert!(is_placeholder_credential("[YOUR-SUPABASE-ANON-KEY]"));
        assert!(is_placeholder_credential("<api key>"));
        assert!(!is_placeholder_credential("sk-live-123"));
    }

    #[test]
    fn test_usable_api_key() {
        let config = ProviderConfig {
            api_key: Some("  sk-test  ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.usable_api_key(), Some("sk-test"));

        let missing = ProviderConfig::default();
        assert_eq!(missing.usable_api_key(), None);
    }

    #[test]
    fn test_token_estimate() {
        assert_eq!(estimate_tokens_from_words(""), 0);
        assert_eq!(
            estimate_tokens_from_words("one two three four five six seven eight nine ten"),
            13
        );
        assert_eq!(estimate_tokens_from_words("one two"), 2);
    }

    #[test]
    fn test_provider_kind_parse() {
        assert_eq!(ProviderKind::parse("OpenAI"), Some(ProviderKind::OpenAI));
        assert_eq!(ProviderKind::parse(" google "), Some(ProviderKind::Google));
        assert_eq!(ProviderKind::parse("stubA"), None);
    }

    #[test]
    fn test_response_success_flag() {
        let failed = ProviderResponse::failure("timeout");
        assert!(!failed.is_successful());
        assert_eq!(failed.error.as_deref(), Some("timeout"));

        let ok = ProviderResponse::success(
            ProviderReply {
                text: "hello".to_string(),
                tokens_used: 1,
                metadata: HashMap::new(),
            },
            12,
        );
        assert!(ok.is_successful());
        assert_eq!(ok.latency_ms, Some(12));
    }
}

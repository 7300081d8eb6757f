use crate::llm::http::{require_text, send_json};
use crate::llm::provider::LLMProvider;
use crate::llm::types::{
    LLMError, ProviderReply, QueryOptions, SYSTEM_INSTRUCTION, estimate_tokens_from_words,
};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const PROVIDER_NAME: &str = "anthropic";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    messages: Vec<UserMessage>,
}

#[derive(Debug, Serialize)]
struct UserMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: Option<MessagesUsage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
struct MessagesUsage {
    input_tokens: u64,
    output_tokens: u64,
}

/// Anthropic Claude provider (Messages API)
pub struct AnthropicProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl AnthropicProvider {
    pub fn new(
        client: reqwest::Client,
        base_url: String,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url,
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// The persona is inlined into the single user turn
    fn build_prompt(prompt: &str) -> String {
        format!("{}\n\nQuestion: {}", SYSTEM_INSTRUCTION, prompt)
    }

    fn into_reply(&self, response: MessagesResponse) -> Result<ProviderReply, LLMError> {
        let joined: String = response
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text.as_deref())
            .collect::<Vec<_>>()
            .join("");
        let text = require_text(Some(joined))?;

        let tokens_used = response
            .usage
            .as_ref()
            .map(|u| u.input_tokens + u.output_tokens)
            .unwrap_or_else(|| estimate_tokens_from_words(&text));

        let mut metadata = HashMap::new();
        metadata.insert("model".to_string(), serde_json::json!(self.model));
        metadata.insert(
            "stop_reason".to_string(),
            serde_json::json!(response.stop_reason),
        );
        metadata.insert(
            "usage".to_string(),
            response
                .usage
                .as_ref()
                .map(|u| {
                    serde_json::json!({
                        "input_tokens": u.input_tokens,
                        "output_tokens": u.output_tokens,
                        "total_tokens": u.input_tokens + u.output_tokens,
                    })
                })
                .unwrap_or(serde_json::Value::Null),
        );

        Ok(ProviderReply {
            text,
            tokens_used,
            metadata,
        })
    }
}

impl LLMProvider for AnthropicProvider {
    fn query<'a>(
        &'a self,
        prompt: &'a str,
        options: &'a QueryOptions,
    ) -> BoxFuture<'a, Result<ProviderReply, LLMError>> {
        Box::pin(async move {
            let body = MessagesRequest {
                model: &self.model,
                max_tokens: options.max_tokens,
                temperature: options.temperature,
                top_p: options.top_p,
                messages: vec![UserMessage {
                    role: "user",
                    content: Self::build_prompt(prompt),
                }],
            };

            let request = self
                .client
                .post(format!("{}/v1/messages", self.base_url))
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&body);

            let response: MessagesResponse = send_json(PROVIDER_NAME, request).await?;
            self.into_reply(response)
        })
    }

    fn provider_name(&self) -> &str {
        PROVIDER_NAME
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn available_models(&self) -> Vec<String> {
        vec![
            "claude-3-5-sonnet-20241022".to_string(),
            "claude-3-5-haiku-20241022".to_string(),
            "claude-3-opus-20240229".to_string(),
            "claude-3-sonnet-20240229".to_string(),
            "claude-3-haiku-20240307".to_string(),
        ]
    }
}

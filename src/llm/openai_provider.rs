use crate::llm::http::{require_text, send_json};
use crate::llm::provider::LLMProvider;
use crate::llm::types::{
    LLMError, ProviderReply, QueryOptions, SYSTEM_INSTRUCTION, estimate_tokens_from_words,
};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const PROVIDER_NAME: &str = "openai";

/// Chat Completions request body, shared with other OpenAI-compatible vendors
#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    pub usage: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: Option<ChatChoiceMessage>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoiceMessage {
    pub content: Option<String>,
}

impl<'a> ChatCompletionRequest<'a> {
    /// System persona followed by the user's prompt
    pub fn with_persona(model: &'a str, prompt: &'a str, options: &QueryOptions) -> Self {
        Self {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_INSTRUCTION,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            top_p: options.top_p,
        }
    }
}

impl ChatCompletionResponse {
    /// Normalize into a [`ProviderReply`], estimating tokens when usage is absent
    pub fn into_reply(self, model: &str) -> Result<ProviderReply, LLMError> {
        let choice = self.choices.into_iter().next().ok_or_else(|| {
            LLMError::MalformedResponse("response contained no choices".to_string())
        })?;

        let text = require_text(choice.message.and_then(|m| m.content))?;

        let tokens_used = self
            .usage
            .as_ref()
            .and_then(|u| u.get("total_tokens"))
            .and_then(|v| v.as_u64())
            .unwrap_or_else(|| estimate_tokens_from_words(&text));

        let mut metadata = HashMap::new();
        metadata.insert("model".to_string(), serde_json::json!(model));
        metadata.insert(
            "finish_reason".to_string(),
            serde_json::json!(choice.finish_reason),
        );
        metadata.insert(
            "usage".to_string(),
            self.usage.unwrap_or(serde_json::Value::Null),
        );

        Ok(ProviderReply {
            text,
            tokens_used,
            metadata,
        })
    }
}

/// OpenAI GPT provider (Chat Completions API)
pub struct OpenAIProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAIProvider {
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

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

impl LLMProvider for OpenAIProvider {
    fn query<'a>(
        &'a self,
        prompt: &'a str,
        options: &'a QueryOptions,
    ) -> BoxFuture<'a, Result<ProviderReply, LLMError>> {
        Box::pin(async move {
            let body = ChatCompletionRequest::with_persona(&self.model, prompt, options);
            let request = self
                .client
                .post(self.endpoint())
                .bearer_auth(&self.api_key)
                .json(&body);

            let response: ChatCompletionResponse = send_json(PROVIDER_NAME, request).await?;
            response.into_reply(&self.model)
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
            "gpt-4".to_string(),
            "gpt-4-turbo-preview".to_string(),
            "gpt-3.5-turbo".to_string(),
            "gpt-3.5-turbo-16k".to_string(),
        ]
    }
}

use crate::llm::http::{require_text, send_json};
use crate::llm::provider::LLMProvider;
use crate::llm::types::{
    LLMError, ProviderReply, QueryOptions, SYSTEM_INSTRUCTION, estimate_tokens_from_words,
};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const PROVIDER_NAME: &str = "google";

/// Kept out of the query string so the key never shows up in URLs or errors
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u64>,
    candidates_token_count: Option<u64>,
    total_token_count: Option<u64>,
}

/// Google Gemini provider (generateContent API)
pub struct GoogleProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GoogleProvider {
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

    fn into_reply(&self, response: GenerateContentResponse) -> Result<ProviderReply, LLMError> {
        let candidate = response.candidates.into_iter().next().ok_or_else(|| {
            LLMError::MalformedResponse("response contained no candidates".to_string())
        })?;

        let joined: String = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();
        let text = require_text(Some(joined))?;

        // Gemini does not always report usage
        let tokens_used = response
            .usage_metadata
            .as_ref()
            .and_then(|u| u.total_token_count)
            .unwrap_or_else(|| estimate_tokens_from_words(&text));

        let mut metadata = HashMap::new();
        metadata.insert("model".to_string(), serde_json::json!(self.model));
        metadata.insert(
            "finish_reason".to_string(),
            serde_json::json!(candidate.finish_reason),
        );
        metadata.insert(
            "usage".to_string(),
            response
                .usage_metadata
                .map(|u| {
                    serde_json::json!({
                        "prompt_tokens": u.prompt_token_count,
                        "completion_tokens": u.candidates_token_count,
                        "total_tokens": u.total_token_count,
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

impl LLMProvider for GoogleProvider {
    fn query<'a>(
        &'a self,
        prompt: &'a str,
        options: &'a QueryOptions,
    ) -> BoxFuture<'a, Result<ProviderReply, LLMError>> {
        Box::pin(async move {
            let body = GenerateContentRequest {
                contents: vec![Content {
                    parts: vec![Part {
                        text: Some(format!("{}\n\nQuestion: {}", SYSTEM_INSTRUCTION, prompt)),
                    }],
                }],
                generation_config: GenerationConfig {
                    max_output_tokens: options.max_tokens,
                    temperature: options.temperature,
                    top_p: options.top_p,
                },
            };

            let request = self
                .client
                .post(format!(
                    "{}/v1beta/models/{}:generateContent",
                    self.base_url, self.model
                ))
                .header(API_KEY_HEADER, &self.api_key)
                .json(&body);

            let response: GenerateContentResponse = send_json(PROVIDER_NAME, request).await?;
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
            "gemini-pro".to_string(),
            "gemini-pro-vision".to_string(),
            "gemini-1.5-pro".to_string(),
            "gemini-1.5-flash".to_string(),
        ]
    }
}

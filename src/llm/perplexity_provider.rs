use crate::llm::http::send_json;
use crate::llm::openai_provider::{ChatCompletionRequest, ChatCompletionResponse};
use crate::llm::provider::LLMProvider;
use crate::llm::types::{LLMError, ProviderReply, QueryOptions};
use futures::future::BoxFuture;

const PROVIDER_NAME: &str = "perplexity";

/// Perplexity provider. The API is OpenAI-compatible but rooted without `/v1`.
pub struct PerplexityProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl PerplexityProvider {
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
}

impl LLMProvider for PerplexityProvider {
    fn query<'a>(
        &'a self,
        prompt: &'a str,
        options: &'a QueryOptions,
    ) -> BoxFuture<'a, Result<ProviderReply, LLMError>> {
        Box::pin(async move {
            let body = ChatCompletionRequest::with_persona(&self.model, prompt, options);
            let request = self
                .client
                .post(format!("{}/chat/completions", self.base_url))
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
            "sonar".to_string(),
            "sonar-pro".to_string(),
            "sonar-reasoning".to_string(),
            "sonar-reasoning-pro".to_string(),
            "sonar-deep-research".to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::http::build_client;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_query_uses_unversioned_path() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer pplx-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{
                    "message": {"content": "Use internal linking."},
                    "finish_reason": "stop"
                }],
                "usage": {"total_tokens": 42}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = PerplexityProvider::new(
            build_client(Duration::from_secs(5)).unwrap(),
            server.uri(),
            "pplx-key",
            "sonar-pro",
        );
        let reply = provider
            .query("How do I rank?", &QueryOptions::default())
            .await
            .unwrap();

        assert_eq!(reply.text, "Use internal linking.");
        assert_eq!(reply.tokens_used, 42);
        assert_eq!(reply.metadata["model"], "sonar-pro");
    }

    #[tokio::test]
    async fn test_server_error_maps_to_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let provider = PerplexityProvider::new(
            build_client(Duration::from_secs(5)).unwrap(),
            server.uri(),
            "pplx-key",
            "sonar-pro",
        );
        let err = provider
            .query("anything", &QueryOptions::default())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            LLMError::Api {
                status: 503,
                message: "overloaded".to_string()
            }
        );
    }
}

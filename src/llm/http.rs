//! HTTP plumbing shared by the vendor clients.
//!
//! Status codes are interpreted here and nowhere else; the vendor modules only
//! build request bodies and pick fields out of the decoded JSON.

use crate::llm::types::{LLMError, ProviderKind};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

const USER_AGENT_VALUE: &str = concat!("lea/", env!("CARGO_PKG_VERSION"));

/// Longest slice of an error body carried into an error message
const MAX_ERROR_BODY_CHARS: usize = 300;

pub fn build_client(timeout: Duration) -> Result<reqwest::Client, LLMError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT_VALUE)
        .build()
        .map_err(|e| LLMError::Network(format!("failed to create HTTP client: {}", e)))
}

/// Validate a configured base URL, falling back to the vendor default
pub fn resolve_base_url(kind: ProviderKind, configured: Option<&str>) -> Result<String, LLMError> {
    let raw = configured
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(kind.default_base_url());

    let parsed = Url::parse(raw).map_err(|e| {
        LLMError::InvalidRequest(format!("invalid base URL '{}' for {}: {}", raw, kind, e))
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(LLMError::InvalidRequest(format!(
            "base URL for {} must be http(s), got '{}'",
            kind,
            parsed.scheme()
        )));
    }

    Ok(raw.trim_end_matches('/').to_string())
}

/// Send a prepared request and decode the JSON body into `R`, mapping failures to [`LLMError`]
pub async fn send_json<R: DeserializeOwned>(
    provider: &str,
    request: reqwest::RequestBuilder,
) -> Result<R, LLMError> {
    // Drop the URL from transport errors; it can carry credentials
    let response = request.send().await.map_err(|e| {
        let e = e.without_url();
        if e.is_timeout() {
            LLMError::Network(format!("{} request timed out: {}", provider, e))
        } else {
            LLMError::Network(format!("{} request failed: {}", provider, e))
        }
    })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| {
        LLMError::Network(format!(
            "failed to read {} response body: {}",
            provider,
            e.without_url()
        ))
    })?;

    debug!(provider, status = status.as_u16(), bytes = body.len(), "received provider response");

    if !status.is_success() {
        return Err(map_status(status, &body));
    }

    serde_json::from_str(&body).map_err(|e| {
        LLMError::MalformedResponse(format!("{} returned an unexpected payload: {}", provider, e))
    })
}

fn map_status(status: StatusCode, body: &str) -> LLMError {
    let message = error_message_from_body(body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LLMError::Authentication(message),
        StatusCode::TOO_MANY_REQUESTS => LLMError::RateLimit(message),
        StatusCode::NOT_FOUND => LLMError::ModelUnavailable(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            LLMError::InvalidRequest(message)
        }
        _ => LLMError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

/// Prefer the vendor's `error.message` field, else a truncated raw body
fn error_message_from_body(body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            json.pointer("/error/message")
                .or_else(|| json.get("message"))
                .or_else(|| json.get("error"))
                .and_then(|v| v.as_str().map(str::to_string))
        });

    from_json.unwrap_or_else(|| body.chars().take(MAX_ERROR_BODY_CHARS).collect())
}

/// Reject blank completions so they never surface as empty successes
pub fn require_text(text: Option<String>) -> Result<String, LLMError> {
    match text {
        Some(t) if !t.trim().is_empty() => Ok(t),
        _ => Err(LLMError::EmptyCompletion),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_base_url_defaults_and_trims() {
        assert_eq!(
            resolve_base_url(ProviderKind::OpenAI, None).unwrap(),
            "https://api.openai.com"
        );
        assert_eq!(
            resolve_base_url(ProviderKind::OpenAI, Some("http://localhost:8080/")).unwrap(),
            "http://localhost:8080"
        );
        assert!(resolve_base_url(ProviderKind::Google, Some("not a url")).is_err());
        assert!(resolve_base_url(ProviderKind::Google, Some("ftp://example.com")).is_err());
    }

    #[test]
    fn test_status_mapping() {
        let body = r#"{"error": {"message": "bad key"}}"#;
        assert_eq!(
            map_status(StatusCode::UNAUTHORIZED, body),
            LLMError::Authentication("bad key".to_string())
        );
        assert!(matches!(
            map_status(StatusCode::TOO_MANY_REQUESTS, "slow down"),
            LLMError::RateLimit(m) if m == "slow down"
        ));
        assert!(matches!(
            map_status(StatusCode::BAD_GATEWAY, "upstream"),
            LLMError::Api { status: 502, .. }
        ));
    }

    #[test]
    fn test_require_text() {
        assert_eq!(require_text(Some("hi".to_string())).unwrap(), "hi");
        assert_eq!(require_text(Some("  ".to_string())), Err(LLMError::EmptyCompletion));
        assert_eq!(require_text(None), Err(LLMError::EmptyCompletion));
    }
}

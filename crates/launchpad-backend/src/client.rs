//! HTTP client for an OpenAI-compatible `responses` endpoint.
//!
//! Requests JSON-object output, extracts the response text, and retries
//! transient failures with back-off. Schema validation of the returned text
//! is left to the caller (see [`crate::schema`]).

use std::time::Duration;

use async_trait::async_trait;
use launchpad_core::BackendSettings;
use reqwest::{Client, Url};
use serde::Serialize;
use serde_json::Value;

use crate::error::BackendError;
use crate::retry::retry_with_backoff;
use crate::GenerativeBackend;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4.1-mini";

/// Maximum number of bytes of an error body kept in [`BackendError::UnexpectedStatus`].
const ERROR_BODY_LIMIT: usize = 512;

#[derive(Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: &'a str,
    text: TextOptions,
}

#[derive(Serialize)]
struct TextOptions {
    format: FormatSpec,
}

#[derive(Serialize)]
struct FormatSpec {
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Client for an OpenAI-compatible generative backend.
///
/// Use [`OpenAiBackend::new`] for production or [`OpenAiBackend::with_base_url`]
/// to point at a mock server in tests.
pub struct OpenAiBackend {
    client: Client,
    api_key: String,
    model: String,
    endpoint: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl std::fmt::Debug for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiBackend")
            .field("api_key", &"[redacted]")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint.as_str())
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl OpenAiBackend {
    /// Creates a client pointed at the production API with the default model.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, BackendError> {
        Self::with_base_url(api_key, DEFAULT_MODEL, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL and model.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`BackendError::InvalidBaseUrl`] if `base_url` is not
    /// a valid URL.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("launchpad/0.1 (workflow-studio)")
            .build()?;

        let endpoint = Url::parse(&format!("{}/responses", base_url.trim_end_matches('/')))
            .map_err(|e| BackendError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            endpoint,
            max_retries: 0,
            backoff_base_ms: 0,
        })
    }

    /// Sets the retry policy for transient failures.
    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Builds a client from settings, or `None` when no credential is configured.
    ///
    /// # Errors
    ///
    /// Propagates construction errors from [`OpenAiBackend::with_base_url`].
    pub fn from_settings(settings: &BackendSettings) -> Result<Option<Self>, BackendError> {
        let Some(api_key) = settings.api_key.as_deref() else {
            return Ok(None);
        };
        let backend = Self::with_base_url(
            api_key,
            &settings.model,
            settings.timeout_secs,
            &settings.base_url,
        )?
        .with_retry(settings.max_retries, settings.retry_backoff_base_ms);
        Ok(Some(backend))
    }

    async fn request_once(&self, prompt: &str) -> Result<String, BackendError> {
        let body = ResponsesRequest {
            model: &self.model,
            input: prompt,
            text: TextOptions {
                format: FormatSpec {
                    kind: "json_object",
                },
            },
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let mut text = response.text().await.unwrap_or_default();
            if text.len() > ERROR_BODY_LIMIT {
                let cut = (0..=ERROR_BODY_LIMIT)
                    .rev()
                    .find(|i| text.is_char_boundary(*i))
                    .unwrap_or(0);
                text.truncate(cut);
            }
            return Err(BackendError::UnexpectedStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        let text = response.text().await?;
        let payload: Value = serde_json::from_str(&text).map_err(|e| {
            BackendError::malformed("responses envelope", format!("invalid JSON: {e}"))
        })?;

        extract_output_text(&payload).ok_or_else(|| {
            BackendError::malformed("responses envelope", "no output_text in response")
        })
    }
}

/// Pulls the generated text out of a `responses` payload.
///
/// Prefers a top-level `output_text` string; otherwise concatenates every
/// `output[].content[]` item of type `output_text`.
fn extract_output_text(payload: &Value) -> Option<String> {
    if let Some(text) = payload.get("output_text").and_then(Value::as_str) {
        return Some(text.to_string());
    }

    let parts: Vec<&str> = payload
        .get("output")?
        .as_array()?
        .iter()
        .filter_map(|item| item.get("content").and_then(Value::as_array))
        .flatten()
        .filter(|c| c.get("type").and_then(Value::as_str) == Some("output_text"))
        .filter_map(|c| c.get("text").and_then(Value::as_str))
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.concat())
    }
}

#[async_trait]
impl GenerativeBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete_json(&self, prompt: &str) -> Result<String, BackendError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.request_once(prompt)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn endpoint_strips_trailing_slash() {
        let backend =
            OpenAiBackend::with_base_url("k", "m", 5, "https://api.example.com/v1/").unwrap();
        assert_eq!(
            backend.endpoint.as_str(),
            "https://api.example.com/v1/responses"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = OpenAiBackend::with_base_url("k", "m", 5, "not a url").unwrap_err();
        assert!(matches!(err, BackendError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn debug_redacts_api_key() {
        let backend = OpenAiBackend::new("sk-secret", 5).unwrap();
        assert!(!format!("{backend:?}").contains("sk-secret"));
    }

    #[test]
    fn extracts_top_level_output_text() {
        let payload = json!({ "output_text": "{\"angles\":[]}" });
        assert_eq!(
            extract_output_text(&payload).as_deref(),
            Some("{\"angles\":[]}")
        );
    }

    #[test]
    fn extracts_nested_output_text() {
        let payload = json!({
            "output": [
                { "type": "reasoning", "summary": [] },
                {
                    "type": "message",
                    "content": [
                        { "type": "output_text", "text": "{\"a\":" },
                        { "type": "output_text", "text": "1}" }
                    ]
                }
            ]
        });
        assert_eq!(extract_output_text(&payload).as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn missing_output_text_yields_none() {
        assert!(extract_output_text(&json!({ "output": [] })).is_none());
        assert!(extract_output_text(&json!({ "id": "resp_1" })).is_none());
    }

    #[test]
    fn from_settings_without_key_is_none() {
        let settings = BackendSettings {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: 5,
            max_retries: 1,
            retry_backoff_base_ms: 10,
        };
        assert!(OpenAiBackend::from_settings(&settings).unwrap().is_none());
    }
}

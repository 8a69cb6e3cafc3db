//! OpenAI-compatible chat-completions backend

use crate::LlmError;
use async_trait::async_trait;
use examiner_config::OpenAiSettings;
use examiner_core::{ChatMessage, CompletionRequest, LanguageModel, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for OpenAI-compatible backends
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API base (OpenAI: https://api.openai.com/v1)
    pub endpoint: String,
    /// API key
    pub api_key: String,
    /// Request timeout
    pub timeout: Duration,
    /// Organization ID (OpenAI specific)
    pub organization: Option<String>,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(60),
            organization: None,
        }
    }
}

impl OpenAIConfig {
    /// Create config for a local OpenAI-compatible server
    pub fn local(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: "not-needed".to_string(),
            ..Default::default()
        }
    }

    pub fn from_settings(settings: &OpenAiSettings, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: settings.base_url.clone(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(settings.timeout_seconds),
            organization: None,
        }
    }

    /// Full URL for an API path such as `chat/completions`
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), path)
    }

    /// Build an HTTP client honouring the configured timeout
    pub fn client(&self) -> std::result::Result<Client, LlmError> {
        if self.api_key.is_empty() && !self.is_local() {
            return Err(LlmError::Configuration(
                "API key required for remote endpoints".to_string(),
            ));
        }

        Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| LlmError::Network(e.to_string()))
    }

    /// Authorization and organization headers
    pub fn auth_headers(&self) -> reqwest::header::HeaderMap {
        use reqwest::header::HeaderValue;

        let mut headers = reqwest::header::HeaderMap::new();

        let auth_value = format!("Bearer {}", self.api_key);
        if let Ok(val) = HeaderValue::from_str(&auth_value) {
            headers.insert(reqwest::header::AUTHORIZATION, val);
        }

        if let Some(ref org) = self.organization {
            if let Ok(val) = HeaderValue::from_str(org) {
                headers.insert("OpenAI-Organization", val);
            }
        }

        headers
    }

    fn is_local(&self) -> bool {
        self.endpoint.starts_with("http://localhost") || self.endpoint.starts_with("http://127.0.0.1")
    }
}

/// Extract a readable message from an upstream error body
///
/// OpenAI-style bodies carry `{"error": {"message": ...}}`; anything else is
/// returned as-is, or the status reason when the body is empty.
pub fn api_error_message(status: reqwest::StatusCode, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorEnvelope {
        error: ErrorDetail,
    }

    #[derive(Deserialize)]
    struct ErrorDetail {
        message: String,
    }

    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        return envelope.error.message;
    }

    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Upstream request failed")
            .to_string()
    } else {
        body.to_string()
    }
}

/// OpenAI-compatible backend
///
/// Works with OpenAI and local servers exposing `/chat/completions`.
pub struct OpenAIBackend {
    config: OpenAIConfig,
    client: Client,
    default_model: String,
}

impl OpenAIBackend {
    /// Create new OpenAI backend
    pub fn new(config: OpenAIConfig, default_model: impl Into<String>) -> std::result::Result<Self, LlmError> {
        let client = config.client()?;
        Ok(Self {
            config,
            client,
            default_model: default_model.into(),
        })
    }

    async fn chat(&self, request: CompletionRequest) -> std::result::Result<String, LlmError> {
        let start = std::time::Instant::now();

        let model = if request.model.trim().is_empty() {
            self.default_model.clone()
        } else {
            request.model
        };

        let body = OpenAIChatRequest {
            model,
            messages: request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        tracing::debug!(
            model = %body.model,
            messages = body.messages.len(),
            max_tokens = ?body.max_tokens,
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(self.config.url("chat/completions"))
            .headers(self.config.auth_headers())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = api_error_message(status, &error_text);
            tracing::warn!(status = status.as_u16(), error = %message, "Chat completion failed");
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let response: OpenAIChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();

        tracing::debug!(
            model = %body.model,
            elapsed_ms = start.elapsed().as_millis() as u64,
            chars = text.len(),
            "Chat completion received"
        );

        Ok(text)
    }
}

#[async_trait]
impl LanguageModel for OpenAIBackend {
    /// Returns the trimmed first choice; an empty string when the engine
    /// produced no content
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        Ok(self.chat(request).await?)
    }

    fn model_name(&self) -> &str {
        &self.default_model
    }
}

#[derive(Debug, Serialize)]
struct OpenAIChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChatResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

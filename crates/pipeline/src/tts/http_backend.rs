//! HTTP TTS Backend - OpenAI-compatible `/audio/speech`

use crate::PipelineError;
use async_trait::async_trait;
use examiner_config::SpeechSettings;
use examiner_core::{AudioClip, Result, TextToSpeech};
use examiner_llm::{api_error_message, OpenAIConfig};
use serde::Serialize;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct HttpTtsConfig {
    /// Upstream connection
    pub api: OpenAIConfig,
    /// Speech model (e.g., "tts-1")
    pub model: String,
    pub voice: String,
    /// Encoded output format; "mp3" yields `audio/mpeg`
    pub response_format: String,
}

impl HttpTtsConfig {
    pub fn new(api: OpenAIConfig, settings: &SpeechSettings) -> Self {
        Self {
            api,
            model: settings.model.clone(),
            voice: settings.voice.clone(),
            response_format: settings.response_format.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

/// HTTP TTS Backend
pub struct HttpTtsBackend {
    config: HttpTtsConfig,
    client: reqwest::Client,
}

impl HttpTtsBackend {
    pub fn new(config: HttpTtsConfig) -> std::result::Result<Self, PipelineError> {
        let client = config.api.client()?;

        tracing::info!(
            endpoint = %config.api.endpoint,
            model = %config.model,
            voice = %config.voice,
            "HTTP TTS backend configured"
        );

        Ok(Self { config, client })
    }

    fn failure(status: Option<u16>, message: impl Into<String>) -> PipelineError {
        PipelineError::Speech {
            status,
            message: message.into(),
        }
    }

    async fn speak(&self, text: &str) -> std::result::Result<AudioClip, PipelineError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PipelineError::InvalidInput(
                "No text provided to speak".to_string(),
            ));
        }

        let start = Instant::now();
        let request = SpeechRequest {
            model: &self.config.model,
            input: text,
            voice: &self.config.voice,
            response_format: &self.config.response_format,
        };

        let response = self
            .client
            .post(self.config.api.url("audio/speech"))
            .headers(self.config.api.auth_headers())
            .json(&request)
            .send()
            .await
            .map_err(|e| Self::failure(e.status().map(|s| s.as_u16()), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = api_error_message(status, &body);
            tracing::warn!(status = status.as_u16(), error = %message, "Speech request failed");
            return Err(Self::failure(Some(status.as_u16()), message));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Self::failure(None, format!("Failed to read speech audio: {}", e)))?;

        if bytes.is_empty() {
            return Err(Self::failure(None, "Speech endpoint returned no audio"));
        }

        tracing::debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            bytes = bytes.len(),
            "Speech synthesized"
        );

        Ok(AudioClip::speech(bytes))
    }
}

#[async_trait]
impl TextToSpeech for HttpTtsBackend {
    async fn synthesize(&self, text: &str) -> Result<AudioClip> {
        Ok(self.speak(text).await?)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

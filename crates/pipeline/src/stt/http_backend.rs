//! HTTP STT Backend - OpenAI-compatible `/audio/transcriptions`
//!
//! Uploads one complete clip as multipart form data. The upload file name
//! carries an extension derived from the clip's MIME type, since the
//! upstream service sniffs the container from it.

use crate::PipelineError;
use async_trait::async_trait;
use examiner_config::TranscriptionSettings;
use examiner_core::{AudioClip, Result, SpeechToText};
use examiner_llm::{api_error_message, OpenAIConfig};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Instant;

/// HTTP STT Backend configuration
#[derive(Debug, Clone)]
pub struct HttpSttConfig {
    /// Upstream connection
    pub api: OpenAIConfig,
    /// Transcription model (e.g., "whisper-1")
    pub model: String,
}

impl HttpSttConfig {
    pub fn new(api: OpenAIConfig, settings: &TranscriptionSettings) -> Self {
        Self {
            api,
            model: settings.model.clone(),
        }
    }
}

/// Response from the transcription endpoint
#[derive(Debug, Deserialize)]
struct SttResponse {
    text: String,
}

/// HTTP STT Backend
pub struct HttpSttBackend {
    config: HttpSttConfig,
    client: reqwest::Client,
}

impl HttpSttBackend {
    /// Create a new HTTP STT backend
    pub fn new(config: HttpSttConfig) -> std::result::Result<Self, PipelineError> {
        let client = config.api.client()?;

        tracing::info!(
            endpoint = %config.api.endpoint,
            model = %config.model,
            "HTTP STT backend configured"
        );

        Ok(Self { config, client })
    }

    fn failure(status: Option<u16>, message: impl Into<String>) -> PipelineError {
        PipelineError::Transcription {
            status,
            message: message.into(),
        }
    }

    async fn transcribe_clip(&self, audio: &AudioClip) -> std::result::Result<String, PipelineError> {
        if audio.is_empty() {
            return Err(PipelineError::InvalidInput(
                "No audio file provided".to_string(),
            ));
        }

        let start = Instant::now();
        let file_name = audio.file_name();

        let mut part = Part::bytes(audio.data.to_vec()).file_name(file_name.clone());
        if !audio.mime_type.is_empty() {
            part = part
                .mime_str(&audio.mime_type)
                .map_err(|e| PipelineError::InvalidInput(format!("Invalid audio type: {}", e)))?;
        }

        let form = Form::new()
            .part("file", part)
            .text("model", self.config.model.clone());

        tracing::debug!(file = %file_name, bytes = audio.len(), "Sending audio for transcription");

        let response = self
            .client
            .post(self.config.api.url("audio/transcriptions"))
            .headers(self.config.api.auth_headers())
            .multipart(form)
            .send()
            .await
            .map_err(|e| Self::failure(e.status().map(|s| s.as_u16()), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = api_error_message(status, &body);
            tracing::warn!(status = status.as_u16(), error = %message, "Transcription request failed");
            return Err(Self::failure(Some(status.as_u16()), message));
        }

        let result: SttResponse = response
            .json()
            .await
            .map_err(|e| Self::failure(None, format!("Failed to parse STT response: {}", e)))?;

        tracing::debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            chars = result.text.len(),
            "Transcription received"
        );

        Ok(result.text.trim().to_string())
    }
}

#[async_trait]
impl SpeechToText for HttpSttBackend {
    async fn transcribe(&self, audio: &AudioClip) -> Result<String> {
        Ok(self.transcribe_clip(audio).await?)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    fn backend_for(server: &MockServer) -> HttpSttBackend {
        let api = OpenAIConfig {
            endpoint: server.uri(),
            api_key: "test-key".to_string(),
            ..Default::default()
        };
        HttpSttBackend::new(HttpSttConfig::new(api, &TranscriptionSettings::default())).unwrap()
    }

    /// Echoes the uploaded file name back as the transcript
    struct EchoFileName;

    impl Respond for EchoFileName {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            let body = String::from_utf8_lossy(&request.body);
            let name = body
                .split("filename=\"")
                .nth(1)
                .and_then(|rest| rest.split('"').next())
                .unwrap_or("missing")
                .to_string();
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "text": name }))
        }
    }

    #[tokio::test]
    async fn test_upload_uses_mime_extension() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(EchoFileName)
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        let mp4 = AudioClip::new(vec![1u8, 2, 3], "audio/mp4");
        assert_eq!(backend.transcribe(&mp4).await.unwrap(), "audio.mp4");

        let unknown = AudioClip::new(vec![1u8, 2, 3], "");
        assert_eq!(backend.transcribe(&unknown).await.unwrap(), "audio.webm");
    }

    #[tokio::test]
    async fn test_transcript_is_trimmed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "text": " I'm from Lyon. " })),
            )
            .mount(&server)
            .await;

        let text = backend_for(&server)
            .transcribe(&AudioClip::new(vec![0u8; 8], "audio/webm"))
            .await
            .unwrap();
        assert_eq!(text, "I'm from Lyon.");
    }

    #[tokio::test]
    async fn test_upstream_status_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(413).set_body_json(serde_json::json!({
                "error": {"message": "Maximum content size limit exceeded"}
            })))
            .mount(&server)
            .await;

        let err = backend_for(&server)
            .transcribe(&AudioClip::new(vec![0u8; 8], "audio/wav"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 413);
        assert_eq!(
            err.to_string(),
            "Transcription failed: Maximum content size limit exceeded"
        );
    }

    #[tokio::test]
    async fn test_empty_clip_rejected() {
        let server = MockServer::start().await;
        let err = backend_for(&server)
            .transcribe(&AudioClip::new(Vec::<u8>::new(), "audio/webm"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}

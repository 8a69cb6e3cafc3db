//! Speech gateway traits

use crate::{AudioClip, Result};
use async_trait::async_trait;

/// Speech-to-Text gateway
///
/// Turns one complete recorded clip into text. Implementations pick an
/// upload file type from the clip's MIME type.
///
/// # Example
///
/// ```ignore
/// let stt: Arc<dyn SpeechToText> = Arc::new(WhisperHttpStt::new(config)?);
/// let text = stt.transcribe(&clip).await?;
/// ```
#[async_trait]
pub trait SpeechToText: Send + Sync + 'static {
    /// Transcribe a complete clip
    async fn transcribe(&self, audio: &AudioClip) -> Result<String>;

    /// Get model name for logging
    fn model_name(&self) -> &str;
}

/// Text-to-Speech gateway
#[async_trait]
pub trait TextToSpeech: Send + Sync + 'static {
    /// Synthesize text into a playable clip
    ///
    /// Empty or whitespace-only text must fail with `Error::InvalidInput`.
    async fn synthesize(&self, text: &str) -> Result<AudioClip>;

    /// Get model name for logging
    fn model_name(&self) -> &str;
}

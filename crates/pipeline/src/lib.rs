//! Transcription and speech gateways
//!
//! Thin HTTP wrappers around OpenAI-compatible `/audio/transcriptions` and
//! `/audio/speech` endpoints, exposed through the core `SpeechToText` and
//! `TextToSpeech` traits.

pub mod stt;
pub mod tts;

pub use stt::{HttpSttBackend, HttpSttConfig};
pub use tts::{HttpTtsBackend, HttpTtsConfig};

use thiserror::Error;

/// Pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{message}")]
    Transcription { status: Option<u16>, message: String },

    #[error("{message}")]
    Speech { status: Option<u16>, message: String },

    #[error("{0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<PipelineError> for examiner_core::Error {
    fn from(err: PipelineError) -> Self {
        use examiner_core::Error;

        match err {
            PipelineError::Transcription { status, message } => {
                let err = Error::transcription(message);
                match status {
                    Some(code) => err.with_status(code),
                    None => err,
                }
            }
            PipelineError::Speech { status, message } => {
                let err = Error::speech(message);
                match status {
                    Some(code) => err.with_status(code),
                    None => err,
                }
            }
            PipelineError::InvalidInput(message) => Error::InvalidInput(message),
            PipelineError::Configuration(message) => Error::Configuration(message),
        }
    }
}

impl From<examiner_llm::LlmError> for PipelineError {
    fn from(err: examiner_llm::LlmError) -> Self {
        PipelineError::Configuration(err.to_string())
    }
}

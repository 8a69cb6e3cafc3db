//! Completion gateway for the speaking examiner
//!
//! Features:
//! - OpenAI-compatible chat-completions backend
//! - Upstream status propagation for caller-side error messages
//! - Conversation summarizer used by context assembly

pub mod backend;
pub mod summarizer;

pub use backend::{api_error_message, OpenAIBackend, OpenAIConfig};
pub use summarizer::{strip_summary_preamble, LlmSummarizer};

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for examiner_core::Error {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Api { status, message } => {
                examiner_core::Error::completion(message).with_status(status)
            }
            LlmError::Configuration(message) => examiner_core::Error::Configuration(message),
            other => examiner_core::Error::completion(other.to_string()),
        }
    }
}

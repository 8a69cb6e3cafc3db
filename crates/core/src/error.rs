//! Error types shared by every examiner crate

use thiserror::Error;

/// Reason a recording could not be captured
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureFailure {
    #[error("Microphone permission denied.")]
    PermissionDenied,

    #[error("No microphone found.")]
    NoDevice,

    #[error("Audio recording is not supported in this browser.")]
    Unsupported,

    #[error("{0}")]
    Other(String),
}

/// Core error type
///
/// Gateway variants carry the upstream HTTP status when one was available so
/// callers can surface it unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Transcription failed: {message}")]
    Transcription { message: String, status: Option<u16> },

    #[error("Speech synthesis failed: {message}")]
    Speech { message: String, status: Option<u16> },

    #[error("Completion failed: {message}")]
    Completion { message: String, status: Option<u16> },

    #[error("Microphone Error: {0}")]
    Capture(CaptureFailure),

    #[error("{0}")]
    Playback(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    EmptyResult(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Error {
    pub fn transcription(message: impl Into<String>) -> Self {
        Error::Transcription {
            message: message.into(),
            status: None,
        }
    }

    pub fn speech(message: impl Into<String>) -> Self {
        Error::Speech {
            message: message.into(),
            status: None,
        }
    }

    pub fn completion(message: impl Into<String>) -> Self {
        Error::Completion {
            message: message.into(),
            status: None,
        }
    }

    /// Attach an upstream status to a gateway error. No-op for other variants.
    pub fn with_status(mut self, code: u16) -> Self {
        match &mut self {
            Error::Transcription { status, .. }
            | Error::Speech { status, .. }
            | Error::Completion { status, .. } => *status = Some(code),
            _ => {}
        }
        self
    }

    /// HTTP-equivalent status for this failure
    ///
    /// Validation errors map to 400, gateway errors to their upstream status,
    /// everything else to 500.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::InvalidInput(_) => 400,
            Error::Transcription { status, .. }
            | Error::Speech { status, .. }
            | Error::Completion { status, .. } => status.unwrap_or(500),
            _ => 500,
        }
    }

    /// Message without the category prefix
    pub fn detail(&self) -> String {
        match self {
            Error::Transcription { message, .. }
            | Error::Speech { message, .. }
            | Error::Completion { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<CaptureFailure> for Error {
    fn from(failure: CaptureFailure) -> Self {
        Error::Capture(failure)
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

//! Speaking Examiner Server
//!
//! HTTP endpoints for the transcription, question, speech, summary and
//! feedback gateways, plus health and metrics.

pub mod error;
pub mod gateway;
pub mod http;
pub mod metrics;
pub mod state;

pub use error::{ApiError, ApiJson};
pub use http::create_router;
pub use metrics::{
    init_metrics, record_error, record_llm_latency, record_request, record_stt_latency,
    record_tts_latency,
};
pub use state::{AppState, Upstreams};

use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<ServerError> for axum::http::StatusCode {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::Config(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<examiner_config::ConfigError> for ServerError {
    fn from(err: examiner_config::ConfigError) -> Self {
        ServerError::Config(err.to_string())
    }
}

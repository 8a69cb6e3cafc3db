//! Configuration management for the speaking examiner
//!
//! Supports loading configuration from:
//! - TOML/YAML files under `config/`
//! - Environment variables (`EXAMINER__` prefix)
//! - YAML catalog overrides for topics and rubrics

pub mod catalog;
pub mod constants;
pub mod settings;

pub use catalog::{
    load_catalogs, OutputContract, PromptSpec, RubricCatalog, RubricSpec, Topic, TopicCatalog,
    TRANSCRIPT_PLACEHOLDER,
};
pub use settings::{
    load_settings, CatalogPaths, CompletionSettings, ContextMode, FeedbackSettings,
    InterviewSettings, ObservabilityConfig, OpenAiSettings, ServerConfig, Settings,
    SpeechSettings, SummarizerSettings, TranscriptionSettings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

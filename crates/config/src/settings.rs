//! Main settings structure

use crate::constants::{context, endpoints, generation, models, timeouts};
use crate::ConfigError;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream OpenAI-compatible API
    #[serde(default)]
    pub openai: OpenAiSettings,

    #[serde(default)]
    pub transcription: TranscriptionSettings,

    #[serde(default)]
    pub speech: SpeechSettings,

    /// Scripted question generation
    #[serde(default)]
    pub completion: CompletionSettings,

    /// Rubric passes
    #[serde(default)]
    pub feedback: FeedbackSettings,

    #[serde(default)]
    pub summarizer: SummarizerSettings,

    /// Interview flow
    #[serde(default)]
    pub interview: InterviewSettings,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Optional YAML catalog overrides
    #[serde(default)]
    pub catalogs: CatalogPaths,
}

impl Settings {
    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_generation()?;
        self.validate_interview()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if self.openai.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "openai.timeout_seconds".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        if self.openai.base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "openai.base_url".to_string(),
                message: "Base URL cannot be empty".to_string(),
            });
        }

        Ok(())
    }

    fn validate_generation(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("feedback.temperature", self.feedback.temperature),
            ("summarizer.temperature", self.summarizer.temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: format!("Must be between 0.0 and 2.0, got {}", value),
                });
            }
        }

        for (field, value) in [
            ("completion.ask_max_tokens", self.completion.ask_max_tokens),
            ("feedback.max_tokens", self.feedback.max_tokens),
            ("summarizer.max_tokens", self.summarizer.max_tokens),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: "Must be greater than 0".to_string(),
                });
            }
        }

        Ok(())
    }

    fn validate_interview(&self) -> Result<(), ConfigError> {
        if self.interview.context_mode == ContextMode::Summarized
            && self.interview.keep_recent_messages == 0
        {
            return Err(ConfigError::InvalidValue {
                field: "interview.keep_recent_messages".to_string(),
                message: "Summarized context must keep at least one recent message".to_string(),
            });
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins, empty means localhost dev origins
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Upper bound on multipart audio uploads
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_true() -> bool {
    true
}
fn default_max_upload_bytes() -> usize {
    25 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: true,
            cors_origins: Vec::new(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Upstream API connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_upstream_timeout")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    endpoints::OPENAI_DEFAULT.to_string()
}
fn default_api_key_env() -> String {
    endpoints::API_KEY_ENV.to_string()
}
fn default_upstream_timeout() -> u64 {
    timeouts::UPSTREAM_REQUEST_SECS
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            timeout_seconds: default_upstream_timeout(),
        }
    }
}

impl OpenAiSettings {
    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Result<String, ConfigError> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(ConfigError::MissingField(self.api_key_env.clone())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionSettings {
    #[serde(default = "default_transcription_model")]
    pub model: String,
}

fn default_transcription_model() -> String {
    models::TRANSCRIPTION_DEFAULT.to_string()
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model: default_transcription_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechSettings {
    #[serde(default = "default_speech_model")]
    pub model: String,

    #[serde(default = "default_voice")]
    pub voice: String,

    #[serde(default = "default_speech_format")]
    pub response_format: String,
}

fn default_speech_model() -> String {
    models::SPEECH_DEFAULT.to_string()
}
fn default_voice() -> String {
    models::SPEECH_VOICE_DEFAULT.to_string()
}
fn default_speech_format() -> String {
    models::SPEECH_FORMAT_DEFAULT.to_string()
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            model: default_speech_model(),
            voice: default_voice(),
            response_format: default_speech_format(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionSettings {
    /// Used when a prompt does not name a model
    #[serde(default = "default_completion_model")]
    pub default_model: String,

    #[serde(default = "default_ask_max_tokens")]
    pub ask_max_tokens: u32,
}

fn default_completion_model() -> String {
    models::COMPLETION_DEFAULT.to_string()
}
fn default_ask_max_tokens() -> u32 {
    generation::ASK_MAX_TOKENS
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            default_model: default_completion_model(),
            ask_max_tokens: default_ask_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackSettings {
    /// Used when a rubric does not name a model
    #[serde(default = "default_completion_model")]
    pub default_model: String,

    #[serde(default = "default_feedback_temperature")]
    pub temperature: f32,

    #[serde(default = "default_feedback_max_tokens")]
    pub max_tokens: u32,
}

fn default_feedback_temperature() -> f32 {
    generation::FEEDBACK_TEMPERATURE
}
fn default_feedback_max_tokens() -> u32 {
    generation::FEEDBACK_MAX_TOKENS
}

impl Default for FeedbackSettings {
    fn default() -> Self {
        Self {
            default_model: default_completion_model(),
            temperature: default_feedback_temperature(),
            max_tokens: default_feedback_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerSettings {
    #[serde(default = "default_completion_model")]
    pub model: String,

    #[serde(default = "default_summary_temperature")]
    pub temperature: f32,

    #[serde(default = "default_summary_max_tokens")]
    pub max_tokens: u32,
}

fn default_summary_temperature() -> f32 {
    generation::SUMMARY_TEMPERATURE
}
fn default_summary_max_tokens() -> u32 {
    generation::SUMMARY_MAX_TOKENS
}

impl Default for SummarizerSettings {
    fn default() -> Self {
        Self {
            model: default_completion_model(),
            temperature: default_summary_temperature(),
            max_tokens: default_summary_max_tokens(),
        }
    }
}

/// How the message list for a question is assembled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContextMode {
    /// Instruction followed by the whole raw history
    #[default]
    FullHistory,
    /// Instruction, a summary of older turns, then the most recent turns
    Summarized,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewSettings {
    #[serde(default)]
    pub context_mode: ContextMode,

    #[serde(default = "default_keep_recent")]
    pub keep_recent_messages: usize,
}

fn default_keep_recent() -> usize {
    context::KEEP_RECENT_MESSAGES
}

impl Default for InterviewSettings {
    fn default() -> Self {
        Self {
            context_mode: ContextMode::default(),
            keep_recent_messages: default_keep_recent(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,

    /// Serve Prometheus metrics at /metrics
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

/// Paths to YAML catalog overrides; built-in catalogs are used when unset
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CatalogPaths {
    #[serde(default)]
    pub topics_path: Option<String>,

    #[serde(default)]
    pub rubrics_path: Option<String>,
}

/// Load settings from files and environment
///
/// Sources, later ones winning: `config/default.*`, `config/{env}.*`,
/// then `EXAMINER__SECTION__FIELD` environment variables.
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    // Load default config
    builder = builder.add_source(File::with_name("config/default").required(false));

    // Load environment-specific config
    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    // Load from environment variables
    builder = builder.add_source(
        Environment::with_prefix("EXAMINER")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    // Validate
    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.transcription.model, "whisper-1");
        assert_eq!(settings.speech.voice, "alloy");
        assert_eq!(settings.completion.ask_max_tokens, 50);
        assert_eq!(settings.feedback.max_tokens, 1500);
        assert_eq!(settings.summarizer.max_tokens, 200);
        assert_eq!(settings.interview.context_mode, ContextMode::FullHistory);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_settings_validation() {
        let mut settings = Settings::default();
        settings.feedback.temperature = 3.0;
        assert!(settings.validate().is_err());

        settings.feedback.temperature = 0.1;
        settings.completion.ask_max_tokens = 0;
        assert!(settings.validate().is_err());

        settings.completion.ask_max_tokens = 50;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_summarized_mode_requires_recent_window() {
        let mut settings = Settings::default();
        settings.interview.context_mode = ContextMode::Summarized;
        settings.interview.keep_recent_messages = 0;

        match settings.validate() {
            Err(ConfigError::InvalidValue { field, .. }) => {
                assert_eq!(field, "interview.keep_recent_messages")
            }
            other => panic!("expected invalid value, got {:?}", other),
        }
    }

    #[test]
    fn test_partial_section_uses_field_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"interview": {"context_mode": "summarized"}}"#).unwrap();
        assert_eq!(settings.interview.context_mode, ContextMode::Summarized);
        assert_eq!(settings.interview.keep_recent_messages, 4);
        assert_eq!(settings.completion.default_model, "gpt-4o-mini");
    }

    #[test]
    fn test_api_key_missing() {
        let openai = OpenAiSettings {
            api_key_env: "EXAMINER_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..Default::default()
        };
        assert!(matches!(openai.api_key(), Err(ConfigError::MissingField(_))));
    }
}

//! Application State
//!
//! Shared state across all handlers.

use parking_lot::RwLock;
use std::sync::Arc;

use examiner_agent::FeedbackPipeline;
use examiner_config::{load_catalogs, load_settings, RubricCatalog, Settings, TopicCatalog};
use examiner_core::{ConversationSummarizer, LanguageModel, SpeechToText, TextToSpeech};
use examiner_llm::{LlmSummarizer, OpenAIBackend, OpenAIConfig};
use examiner_pipeline::{HttpSttBackend, HttpSttConfig, HttpTtsBackend, HttpTtsConfig};

use crate::ServerError;

/// Gateway implementations behind the endpoints
#[derive(Clone)]
pub struct Upstreams {
    pub stt: Arc<dyn SpeechToText>,
    pub tts: Arc<dyn TextToSpeech>,
    pub llm: Arc<dyn LanguageModel>,
    pub summarizer: Arc<dyn ConversationSummarizer>,
    /// Connection used by the readiness check
    pub api: OpenAIConfig,
}

impl Upstreams {
    /// HTTP backends against the configured OpenAI-compatible API
    pub fn from_settings(settings: &Settings, api_key: &str) -> Result<Self, ServerError> {
        let api = OpenAIConfig::from_settings(&settings.openai, api_key);

        let llm: Arc<dyn LanguageModel> = Arc::new(
            OpenAIBackend::new(api.clone(), settings.completion.default_model.clone())
                .map_err(|e| ServerError::Config(e.to_string()))?,
        );
        let stt = HttpSttBackend::new(HttpSttConfig::new(api.clone(), &settings.transcription))
            .map_err(|e| ServerError::Config(e.to_string()))?;
        let tts = HttpTtsBackend::new(HttpTtsConfig::new(api.clone(), &settings.speech))
            .map_err(|e| ServerError::Config(e.to_string()))?;
        let summarizer = LlmSummarizer::new(llm.clone(), settings.summarizer.clone());

        Ok(Self {
            stt: Arc::new(stt),
            tts: Arc::new(tts),
            llm,
            summarizer: Arc::new(summarizer),
            api,
        })
    }
}

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration wrapped in RwLock for hot-reload support
    pub config: Arc<RwLock<Settings>>,
    pub upstreams: Upstreams,
    pub topics: Arc<TopicCatalog>,
    pub rubrics: Arc<RubricCatalog>,
    pub feedback: Arc<FeedbackPipeline>,
    /// Environment name for config reload
    env: Option<String>,
}

impl AppState {
    pub fn new(
        config: Settings,
        upstreams: Upstreams,
        topics: TopicCatalog,
        rubrics: RubricCatalog,
    ) -> Self {
        let rubrics = Arc::new(rubrics);
        let feedback = FeedbackPipeline::new(
            upstreams.llm.clone(),
            rubrics.clone(),
            config.feedback.clone(),
        );

        Self {
            config: Arc::new(RwLock::new(config)),
            upstreams,
            topics: Arc::new(topics),
            rubrics,
            feedback: Arc::new(feedback),
            env: None,
        }
    }

    /// Build everything from settings: catalogs and HTTP backends
    pub fn from_settings(
        config: Settings,
        api_key: &str,
        env: Option<String>,
    ) -> Result<Self, ServerError> {
        let (topics, rubrics) = load_catalogs(&config.catalogs)?;
        let upstreams = Upstreams::from_settings(&config, api_key)?;

        tracing::info!(
            topics = topics.len(),
            rubrics = rubrics.len(),
            "Catalogs loaded"
        );

        let mut state = Self::new(config, upstreams, topics, rubrics);
        state.env = env;
        Ok(state)
    }

    /// Reload configuration from files
    ///
    /// Only per-request values (generation limits, models) take effect;
    /// backends, catalogs and CORS are fixed at startup.
    pub fn reload_config(&self) -> Result<(), ServerError> {
        let new_config = load_settings(self.env.as_deref())?;
        *self.config.write() = new_config;

        tracing::info!("Configuration reloaded successfully");
        Ok(())
    }

    /// Get a read guard to the current configuration
    pub fn get_config(&self) -> parking_lot::RwLockReadGuard<'_, Settings> {
        self.config.read()
    }
}

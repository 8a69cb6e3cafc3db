//! Default values shared across the examiner crates
//!
//! Settings fall back to these when a field is absent from every
//! configuration source.

/// Upstream endpoints
pub mod endpoints {
    /// OpenAI-compatible API base
    pub const OPENAI_DEFAULT: &str = "https://api.openai.com/v1";

    /// Environment variable holding the upstream API key
    pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
}

/// Model identifiers
pub mod models {
    pub const COMPLETION_DEFAULT: &str = "gpt-4o-mini";
    pub const TRANSCRIPTION_DEFAULT: &str = "whisper-1";
    pub const SPEECH_DEFAULT: &str = "tts-1";
    pub const SPEECH_VOICE_DEFAULT: &str = "alloy";
    pub const SPEECH_FORMAT_DEFAULT: &str = "mp3";
}

/// Generation parameters
pub mod generation {
    /// Ceiling for a single scripted examiner question
    pub const ASK_MAX_TOKENS: u32 = 50;

    /// Rubric passes are scored near-deterministically
    pub const FEEDBACK_TEMPERATURE: f32 = 0.1;
    pub const FEEDBACK_MAX_TOKENS: u32 = 1500;

    pub const SUMMARY_TEMPERATURE: f32 = 0.1;
    pub const SUMMARY_MAX_TOKENS: u32 = 200;
}

/// Request timeouts
pub mod timeouts {
    /// Upstream HTTP calls
    pub const UPSTREAM_REQUEST_SECS: u64 = 60;

    /// Readiness check against the upstream API
    pub const READINESS_TIMEOUT_MS: u64 = 2_000;
}

/// Context assembly
pub mod context {
    /// Messages kept verbatim when older history is summarized
    pub const KEEP_RECENT_MESSAGES: usize = 4;
}

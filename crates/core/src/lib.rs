//! Core traits and types for the speaking examiner
//!
//! This crate provides foundational types used across all other crates:
//! - Gateway traits (transcription, speech, completion, summarization)
//! - Device collaborator traits (recording capture, playback)
//! - Conversation and completion request types
//! - Error types

pub mod audio;
pub mod conversation;
pub mod error;
pub mod llm_types;
pub mod traits;

pub use audio::{AudioClip, AudioContainer, SPEECH_MIME_TYPE};
pub use conversation::{
    last_examiner_message, user_transcript, Speaker, TranscriptMessage, TRANSCRIPT_SEPARATOR,
};
pub use error::{CaptureFailure, Error, Result};
pub use llm_types::{ChatMessage, ChatRole, CompletionRequest};

pub use traits::{
    AudioPlayer, CaptureStatus, ConversationSummarizer, LanguageModel, RecordingCapture,
    SpeechToText, TextToSpeech,
};

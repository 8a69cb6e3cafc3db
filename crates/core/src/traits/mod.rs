//! Core traits for pluggable gateways and device collaborators

mod capture;
mod llm;
mod speech;

pub use capture::{AudioPlayer, CaptureStatus, RecordingCapture};
pub use llm::{ConversationSummarizer, LanguageModel};
pub use speech::{SpeechToText, TextToSpeech};

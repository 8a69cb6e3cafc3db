//! Interview session state

use crate::feedback::RubricResult;
use examiner_config::{PromptSpec, Topic};
use examiner_core::TranscriptMessage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Interview phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Waiting for the user to start the next turn
    #[default]
    Idle,
    /// Microphone capture in progress
    Recording,
    /// Clip handed to the transcription gateway
    Transcribing,
    /// Waiting for the next scripted question
    Asking,
    /// Rendering the question as audio
    Speaking,
    /// Question audio is audible
    Playing,
    /// Final question has been played
    Finished,
    /// Rubric passes running
    ProcessingFeedback,
    /// Rubric results available
    ShowResults,
    /// Turn failed; only a new interview leaves this state
    Error,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Recording => "recording",
            Phase::Transcribing => "transcribing",
            Phase::Asking => "asking",
            Phase::Speaking => "speaking",
            Phase::Playing => "playing",
            Phase::Finished => "finished",
            Phase::ProcessingFeedback => "processing_feedback",
            Phase::ShowResults => "show_results",
            Phase::Error => "error",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single live interview
///
/// Only the state machine produces new values of this type. `generation`
/// increases on every reset so responses issued for an earlier interview
/// can be recognised and dropped.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub generation: u64,
    /// Bound at interview start, immutable afterwards
    pub topic: Option<Arc<Topic>>,
    pub turn_index: usize,
    pub phase: Phase,
    pub history: Vec<TranscriptMessage>,
    pub last_error: Option<String>,
    pub results: Vec<RubricResult>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            generation: 0,
            topic: None,
            turn_index: 0,
            phase: Phase::Idle,
            history: Vec::new(),
            last_error: None,
            results: Vec::new(),
        }
    }

    /// Fresh interview state under a new generation, keeping the session id
    pub(crate) fn reset(&self, topic: Option<Arc<Topic>>) -> Self {
        Self {
            id: self.id,
            generation: self.generation + 1,
            topic,
            turn_index: 0,
            phase: Phase::Idle,
            history: Vec::new(),
            last_error: None,
            results: Vec::new(),
        }
    }

    /// Starting from here discards the current interview
    pub fn starts_new_interview(&self) -> bool {
        match self.phase {
            Phase::Idle => self.turn_index == 0,
            Phase::Error | Phase::ShowResults => true,
            _ => false,
        }
    }

    pub fn topic_name(&self) -> Option<&str> {
        self.topic.as_deref().map(|t| t.name.as_str())
    }

    pub fn current_prompt(&self) -> Option<&PromptSpec> {
        self.topic.as_deref().and_then(|t| t.prompt(self.turn_index))
    }

    pub fn is_last_turn(&self) -> bool {
        self.topic
            .as_deref()
            .map(|t| t.is_final(self.turn_index))
            .unwrap_or(false)
    }
}

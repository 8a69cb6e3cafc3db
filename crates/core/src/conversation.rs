//! Interview conversation types

use crate::llm_types::{ChatMessage, ChatRole};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Paragraph break placed between user answers in a transcript
pub const TRANSCRIPT_SEPARATOR: &str = "\n\n";

/// Who contributed a message to the interview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// The candidate being interviewed
    User,
    /// The scripted examiner; also accepted as `assistant` on input
    #[serde(alias = "assistant")]
    Examiner,
    /// Synthetic context, e.g. an injected summary
    System,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::User => "user",
            Speaker::Examiner => "examiner",
            Speaker::System => "system",
        }
    }

    /// Role used when the message is sent to a completion engine
    pub fn chat_role(&self) -> ChatRole {
        match self {
            Speaker::User => ChatRole::User,
            Speaker::Examiner => ChatRole::Assistant,
            Speaker::System => ChatRole::System,
        }
    }
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the conversation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub role: Speaker,
    pub content: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl TranscriptMessage {
    pub fn new(role: Speaker, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Speaker::User, content)
    }

    pub fn examiner(content: impl Into<String>) -> Self {
        Self::new(Speaker::Examiner, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Speaker::System, content)
    }

    pub fn to_chat(&self) -> ChatMessage {
        ChatMessage::new(self.role.chat_role(), self.content.clone())
    }
}

/// Join every user answer, in order, separated by a paragraph break
pub fn user_transcript(history: &[TranscriptMessage]) -> String {
    history
        .iter()
        .filter(|m| m.role == Speaker::User)
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join(TRANSCRIPT_SEPARATOR)
}

/// Most recent examiner message, if any
pub fn last_examiner_message(history: &[TranscriptMessage]) -> Option<&TranscriptMessage> {
    history.iter().rev().find(|m| m.role == Speaker::Examiner)
}

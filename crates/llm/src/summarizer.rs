//! Conversation summarizer
//!
//! Condenses older interview turns into one dense paragraph so the context
//! window stays small while the current scripted instruction stays fresh.

use async_trait::async_trait;
use examiner_config::SummarizerSettings;
use examiner_core::{
    ChatMessage, CompletionRequest, ConversationSummarizer, Error, LanguageModel, Result,
};
use std::sync::Arc;

const SUMMARY_INSTRUCTION: &str = "You summarize a conversation between a user and an examiner. \
Write one concise, factual paragraph covering the topics discussed and the key points made by \
both participants; it will be given to a language model as context for later turns. \
Start directly with the content. Do not write lead-ins such as \"Here is a summary:\" or \
\"The conversation discussed:\". Do not add questions or conversational remarks.";

/// Lead-ins stripped from a summary, matched case-insensitively
const PREAMBLES: &[&str] = &[
    "here is a summary:",
    "here's a summary:",
    "here is the summary:",
    "summary:",
    "the conversation discussed:",
];

/// Remove a leading boilerplate phrase the model was told not to produce
pub fn strip_summary_preamble(summary: &str) -> &str {
    let trimmed = summary.trim();
    let lower = trimmed.to_ascii_lowercase();
    PREAMBLES
        .iter()
        .find(|p| lower.starts_with(*p))
        .map(|p| trimmed[p.len()..].trim_start())
        .unwrap_or(trimmed)
}

/// Summarizer backed by the completion gateway
pub struct LlmSummarizer {
    llm: Arc<dyn LanguageModel>,
    settings: SummarizerSettings,
}

impl LlmSummarizer {
    pub fn new(llm: Arc<dyn LanguageModel>, settings: SummarizerSettings) -> Self {
        Self { llm, settings }
    }
}

#[async_trait]
impl ConversationSummarizer for LlmSummarizer {
    async fn summarize(&self, messages: &[ChatMessage]) -> Result<String> {
        if messages.is_empty() {
            return Err(Error::InvalidInput(
                "No messages provided for summarization".to_string(),
            ));
        }

        let mut prompt = Vec::with_capacity(messages.len() + 1);
        prompt.push(ChatMessage::system(SUMMARY_INSTRUCTION));
        prompt.extend(messages.iter().cloned());

        let request = CompletionRequest::new(prompt, self.settings.model.clone())
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens);

        let raw = self.llm.complete(request).await?;
        let summary = strip_summary_preamble(&raw);

        if summary.is_empty() {
            tracing::warn!(messages = messages.len(), "Summarizer returned no content");
            return Err(Error::EmptyResult(
                "Failed to generate summary from LLM".to_string(),
            ));
        }

        tracing::debug!(messages = messages.len(), chars = summary.len(), "Conversation summarized");
        Ok(summary.to_string())
    }
}

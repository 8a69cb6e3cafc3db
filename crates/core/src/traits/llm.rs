//! Language model traits

use crate::{ChatMessage, CompletionRequest, Result};
use async_trait::async_trait;

/// Completion gateway
///
/// Given an ordered list of role-tagged messages, returns one completion.
/// Failures carry the upstream status when the engine reported one.
#[async_trait]
pub trait LanguageModel: Send + Sync + 'static {
    /// Generate a single completion
    async fn complete(&self, request: CompletionRequest) -> Result<String>;

    /// Get model name for logging
    fn model_name(&self) -> &str;
}

/// Condenses earlier conversation into one paragraph of plain prose
///
/// Output carries factual content only, with no lead-in such as
/// "Here is a summary:".
#[async_trait]
pub trait ConversationSummarizer: Send + Sync + 'static {
    async fn summarize(&self, messages: &[ChatMessage]) -> Result<String>;
}

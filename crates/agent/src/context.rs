//! Conversational-context assembly for question generation
//!
//! Two policies share one contract. Full-history sends the current
//! instruction followed by the whole conversation. Pre-composed takes a list
//! the caller already built (instruction, optional summary, recent turns)
//! and only remaps roles.

use examiner_config::{CompletionSettings, ContextMode, InterviewSettings, PromptSpec};
use examiner_core::{ChatMessage, CompletionRequest, ConversationSummarizer, TranscriptMessage};
use std::sync::Arc;

/// Input to `assemble`
#[derive(Debug, Clone, Copy)]
pub enum ContextInput<'a> {
    FullHistory {
        instruction: &'a str,
        history: &'a [TranscriptMessage],
    },
    PreComposed(&'a [TranscriptMessage]),
}

/// Build the exact message list sent to the completion gateway
///
/// Roles map `examiner -> assistant`; `user` and `system` pass through.
pub fn assemble(input: ContextInput<'_>) -> Vec<ChatMessage> {
    match input {
        ContextInput::FullHistory {
            instruction,
            history,
        } => std::iter::once(ChatMessage::system(instruction))
            .chain(history.iter().map(TranscriptMessage::to_chat))
            .collect(),
        ContextInput::PreComposed(messages) => {
            messages.iter().map(TranscriptMessage::to_chat).collect()
        }
    }
}

/// Completion request for one scripted question
pub fn question_request(
    prompt: &PromptSpec,
    messages: Vec<ChatMessage>,
    settings: &CompletionSettings,
) -> CompletionRequest {
    CompletionRequest::new(messages, prompt.model_or(&settings.default_model))
        .with_temperature(prompt.temperature_or_default())
        .with_max_tokens(settings.ask_max_tokens)
}

/// Chooses a context policy per configuration
///
/// In summarized mode, history older than the recent window is condensed by
/// the summarizer into one `system` message placed after the instruction.
/// Any summarizer failure falls back to full history.
pub struct ContextAssembler {
    mode: ContextMode,
    keep_recent: usize,
    summarizer: Option<Arc<dyn ConversationSummarizer>>,
}

impl ContextAssembler {
    pub fn full_history() -> Self {
        Self {
            mode: ContextMode::FullHistory,
            keep_recent: 0,
            summarizer: None,
        }
    }

    pub fn new(
        settings: &InterviewSettings,
        summarizer: Option<Arc<dyn ConversationSummarizer>>,
    ) -> Self {
        Self {
            mode: settings.context_mode,
            keep_recent: settings.keep_recent_messages,
            summarizer,
        }
    }

    pub async fn messages_for(
        &self,
        prompt: &PromptSpec,
        history: &[TranscriptMessage],
    ) -> Vec<ChatMessage> {
        let full = || {
            assemble(ContextInput::FullHistory {
                instruction: &prompt.instruction_text,
                history,
            })
        };

        let summarizer = match (&self.mode, &self.summarizer) {
            (ContextMode::Summarized, Some(s)) if history.len() > self.keep_recent => s,
            _ => return full(),
        };

        let split = history.len() - self.keep_recent;
        let (older, recent) = history.split_at(split);
        let older: Vec<ChatMessage> = older.iter().map(TranscriptMessage::to_chat).collect();

        match summarizer.summarize(&older).await {
            Ok(summary) => {
                let mut composed = Vec::with_capacity(recent.len() + 2);
                composed.push(TranscriptMessage::system(prompt.instruction_text.clone()));
                composed.push(TranscriptMessage::system(summary));
                composed.extend_from_slice(recent);

                tracing::debug!(
                    summarized = older.len(),
                    recent = recent.len(),
                    "Using summarized context"
                );
                assemble(ContextInput::PreComposed(&composed))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Summarization failed, sending full history");
                full()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use examiner_core::{ChatRole, Error, Result};

    struct StaticSummarizer(Option<&'static str>);

    #[async_trait]
    impl ConversationSummarizer for StaticSummarizer {
        async fn summarize(&self, _messages: &[ChatMessage]) -> Result<String> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| Error::completion("unavailable"))
        }
    }

    fn history() -> Vec<TranscriptMessage> {
        vec![
            TranscriptMessage::user("Yes."),
            TranscriptMessage::examiner("Where is your hometown?"),
            TranscriptMessage::user("Lyon."),
            TranscriptMessage::examiner("What do you like about it?"),
            TranscriptMessage::user("The food."),
        ]
    }

    fn summarized(keep: usize, summarizer: StaticSummarizer) -> ContextAssembler {
        ContextAssembler::new(
            &InterviewSettings {
                context_mode: ContextMode::Summarized,
                keep_recent_messages: keep,
            },
            Some(Arc::new(summarizer)),
        )
    }

    #[test]
    fn test_full_history_prepends_instruction() {
        let history = history();
        let messages = assemble(ContextInput::FullHistory {
            instruction: "Ask: next",
            history: &history,
        });

        assert_eq!(messages.len(), 6);
        assert_eq!(messages[0], ChatMessage::system("Ask: next"));
        assert_eq!(messages[2].role, ChatRole::Assistant);
        assert_eq!(messages[5], ChatMessage::user("The food."));
    }

    #[test]
    fn test_pre_composed_only_remaps_roles() {
        let composed = vec![
            TranscriptMessage::system("Ask: next"),
            TranscriptMessage::system("Summary so far"),
            TranscriptMessage::examiner("Q"),
            TranscriptMessage::user("A"),
        ];
        let roles: Vec<ChatRole> = assemble(ContextInput::PreComposed(&composed))
            .into_iter()
            .map(|m| m.role)
            .collect();
        assert_eq!(
            roles,
            vec![ChatRole::System, ChatRole::System, ChatRole::Assistant, ChatRole::User]
        );
    }

    #[test]
    fn test_question_request_parameters() {
        let prompt = PromptSpec::new("Ask: hi").with_temperature(0.3);
        let request = question_request(&prompt, vec![], &CompletionSettings::default());
        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.temperature, 0.3);
        assert_eq!(request.max_tokens, Some(50));
    }

    #[tokio::test]
    async fn test_summarized_mode_keeps_instruction_first() {
        let assembler = summarized(2, StaticSummarizer(Some("User lives in Lyon.")));
        let messages = assembler
            .messages_for(&PromptSpec::new("Ask: next"), &history())
            .await;

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], ChatMessage::system("Ask: next"));
        assert_eq!(messages[1], ChatMessage::system("User lives in Lyon."));
        assert_eq!(messages[2], ChatMessage::assistant("What do you like about it?"));
        assert_eq!(messages[3], ChatMessage::user("The food."));
    }

    #[tokio::test]
    async fn test_summarizer_failure_falls_back() {
        let assembler = summarized(2, StaticSummarizer(None));
        let messages = assembler
            .messages_for(&PromptSpec::new("Ask: next"), &history())
            .await;
        assert_eq!(messages.len(), 6);
    }

    #[tokio::test]
    async fn test_short_history_not_summarized() {
        let assembler = summarized(10, StaticSummarizer(Some("unused")));
        let messages = assembler
            .messages_for(&PromptSpec::new("Ask: next"), &history())
            .await;
        assert_eq!(messages.len(), 6);
        assert!(messages.iter().all(|m| m.content != "unused"));
    }
}

//! Rubric feedback pipeline
//!
//! Runs every rubric, in catalog order and one at a time, against the full
//! transcript. A failing criterion yields a sentinel result and never stops
//! the batch, so the output always has one entry per rubric.

use examiner_config::{FeedbackSettings, OutputContract, RubricCatalog, RubricSpec};
use examiner_core::{ChatMessage, CompletionRequest, LanguageModel};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

static BAND_SCORE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)band\s*score\s*:\s*([1-9])\b").expect("valid band regex"));

static FEEDBACK_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)feedback\s*:\s*(.*)").expect("valid feedback regex"));

pub const API_ERROR_FEEDBACK: &str = "Error: Failed to evaluate criterion due to API error.";

/// Outcome of one rubric pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubricResult {
    pub criterion: String,
    /// 0 when not applicable or when the pass failed
    pub band_score: u8,
    pub feedback: String,
}

/// Band score and feedback extracted from a completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRubric {
    pub band_score: u8,
    pub feedback: String,
}

/// Parse a banded rubric completion
///
/// The score label is matched case-insensitively. Feedback is the text after
/// a `Feedback:` label, or everything after the score when no label exists.
/// Returns `None` when either part is missing.
///
/// Only whole bands 1 to 9 are accepted: "10" is a parse failure and a
/// fractional "6.5" reads as band 6.
pub fn parse_rubric_output(output: &str) -> Option<ParsedRubric> {
    let score = BAND_SCORE.captures(output)?;
    let band_score = score.get(1)?.as_str().parse::<u8>().ok()?;

    let feedback = match FEEDBACK_LABEL.captures(output).and_then(|c| c.get(1)) {
        Some(labelled) => labelled.as_str().trim(),
        None => score
            .get(0)
            .map(|m| output[m.end()..].trim())
            .unwrap_or_default(),
    };

    if feedback.is_empty() {
        return None;
    }

    Some(ParsedRubric {
        band_score,
        feedback: feedback.to_string(),
    })
}

fn parse_failure(raw: &str) -> String {
    let raw = if raw.trim().is_empty() { "N/A" } else { raw };
    format!(
        "Error: Could not generate feedback for this criterion. Raw output: {}",
        raw
    )
}

/// Turn a completion into a result according to the rubric's contract
pub fn interpret(rubric: &RubricSpec, raw: &str) -> RubricResult {
    let (band_score, feedback) = match &rubric.output {
        OutputContract::FreeText {
            appended_note,
            empty_fallback,
        } => {
            let text = raw.trim();
            let body = if text.is_empty() {
                empty_fallback.as_deref().unwrap_or_default()
            } else {
                text
            };
            let feedback = match appended_note {
                Some(note) => format!("{}\n\n{}", body, note),
                None => body.to_string(),
            };
            (0, feedback)
        }
        OutputContract::BandedFeedback => match parse_rubric_output(raw) {
            Some(parsed) => (parsed.band_score, parsed.feedback),
            None => {
                tracing::warn!(criterion = %rubric.criterion, "Failed to parse rubric output");
                (0, parse_failure(raw))
            }
        },
    };

    RubricResult {
        criterion: rubric.criterion.clone(),
        band_score,
        feedback,
    }
}

/// Sequential, failure-isolated rubric runner
pub struct FeedbackPipeline {
    llm: Arc<dyn LanguageModel>,
    rubrics: Arc<RubricCatalog>,
    settings: FeedbackSettings,
}

impl FeedbackPipeline {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        rubrics: Arc<RubricCatalog>,
        settings: FeedbackSettings,
    ) -> Self {
        Self {
            llm,
            rubrics,
            settings,
        }
    }

    pub fn rubric_count(&self) -> usize {
        self.rubrics.len()
    }

    fn request_for(&self, rubric: &RubricSpec, transcript: &str) -> CompletionRequest {
        let model = rubric
            .model
            .clone()
            .unwrap_or_else(|| self.settings.default_model.clone());

        CompletionRequest::new(vec![ChatMessage::system(rubric.render(transcript))], model)
            .with_temperature(self.settings.temperature)
            .with_max_tokens(rubric.max_tokens.unwrap_or(self.settings.max_tokens))
    }

    /// Evaluate every rubric; the result has exactly one entry per rubric
    pub async fn run(&self, transcript: &str) -> Vec<RubricResult> {
        let mut results = Vec::with_capacity(self.rubrics.len());

        for rubric in self.rubrics.iter() {
            let request = self.request_for(rubric, transcript);
            let result = match self.llm.complete(request).await {
                Ok(raw) => interpret(rubric, &raw),
                Err(e) => {
                    tracing::warn!(criterion = %rubric.criterion, error = %e, "Rubric evaluation failed");
                    RubricResult {
                        criterion: rubric.criterion.clone(),
                        band_score: 0,
                        feedback: API_ERROR_FEEDBACK.to_string(),
                    }
                }
            };

            tracing::debug!(
                criterion = %result.criterion,
                band_score = result.band_score,
                "Rubric evaluated"
            );
            results.push(result);
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn free_text(note: Option<&str>, fallback: Option<&str>) -> RubricSpec {
        RubricSpec {
            criterion: "Advice".to_string(),
            prompt_template: "{{TRANSCRIPT}}".to_string(),
            model: None,
            max_tokens: None,
            output: OutputContract::FreeText {
                appended_note: note.map(str::to_string),
                empty_fallback: fallback.map(str::to_string),
            },
        }
    }

    #[test]
    fn test_parse_labelled_feedback() {
        let parsed = parse_rubric_output("Band Score: 6\nFeedback: Good control of tenses.").unwrap();
        assert_eq!(parsed.band_score, 6);
        assert_eq!(parsed.feedback, "Good control of tenses.");
    }

    #[test]
    fn test_band_range() {
        assert!(parse_rubric_output("Band Score: 10\nFeedback: Perfect.").is_none());
        assert!(parse_rubric_output("Band Score: 0\nFeedback: None.").is_none());
        let parsed = parse_rubric_output("Band Score: 6.5\nFeedback: Mostly fluent.").unwrap();
        assert_eq!(parsed.band_score, 6);
        assert_eq!(parsed.feedback, "Mostly fluent.");
    }

    #[test]
    fn test_parse_unlabelled_feedback() {
        let parsed = parse_rubric_output("Band score: 4\nSome unlabeled feedback text.").unwrap();
        assert_eq!(parsed.band_score, 4);
        assert_eq!(parsed.feedback, "Some unlabeled feedback text.");
    }

    #[test]
    fn test_parse_multiline_feedback() {
        let parsed =
            parse_rubric_output("BAND SCORE: 7\nFeedback: Strong range.\n- Uses idioms well.").unwrap();
        assert_eq!(parsed.band_score, 7);
        assert_eq!(parsed.feedback, "Strong range.\n- Uses idioms well.");
    }

    #[test]
    fn test_parse_failures() {
        assert!(parse_rubric_output("").is_none());
        assert!(parse_rubric_output("Feedback: no score here").is_none());
        assert!(parse_rubric_output("Band Score: 5").is_none());
        assert!(parse_rubric_output("Band Score: 0\nFeedback: out of range").is_none());
    }

    #[test]
    fn test_interpret_banded_parse_failure_includes_raw() {
        let rubric = RubricCatalog::builtin().rubrics()[1].clone();
        let result = interpret(&rubric, "I cannot score this.");
        assert_eq!(result.band_score, 0);
        assert_eq!(
            result.feedback,
            "Error: Could not generate feedback for this criterion. Raw output: I cannot score this."
        );

        let empty = interpret(&rubric, "");
        assert!(empty.feedback.ends_with("Raw output: N/A"));
    }

    #[test]
    fn test_interpret_free_text() {
        let result = interpret(&free_text(Some("Note: no score."), None), "  Structure answers.  ");
        assert_eq!(result.band_score, 0);
        assert_eq!(result.feedback, "Structure answers.\n\nNote: no score.");

        let fallback = interpret(&free_text(None, Some("No advice generated.")), "");
        assert_eq!(fallback.feedback, "No advice generated.");

        let both = interpret(&free_text(Some("Note."), Some("No advice generated.")), " ");
        assert_eq!(both.feedback, "No advice generated.\n\nNote.");
    }
}

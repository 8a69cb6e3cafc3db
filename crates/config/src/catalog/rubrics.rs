//! Rubric catalog for the feedback pipeline

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Placeholder replaced by the full transcript
pub const TRANSCRIPT_PLACEHOLDER: &str = "{{TRANSCRIPT}}";

/// How a rubric's completion is turned into a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputContract {
    /// Completion must contain a band score and feedback text
    #[default]
    BandedFeedback,
    /// Completion is used verbatim, no score
    FreeText {
        /// Appended after a blank line to whatever text is produced
        #[serde(default, skip_serializing_if = "Option::is_none")]
        appended_note: Option<String>,
        /// Used instead of an empty completion
        #[serde(default, skip_serializing_if = "Option::is_none")]
        empty_fallback: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricSpec {
    pub criterion: String,
    pub prompt_template: String,

    /// Falls back to `feedback.default_model`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Falls back to `feedback.max_tokens`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(default)]
    pub output: OutputContract,
}

impl RubricSpec {
    /// Substitute the transcript into the template
    pub fn render(&self, transcript: &str) -> String {
        self.prompt_template
            .replace(TRANSCRIPT_PLACEHOLDER, transcript)
    }

    pub fn is_free_text(&self) -> bool {
        matches!(self.output, OutputContract::FreeText { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RubricFile {
    rubrics: Vec<RubricSpec>,
}

/// Ordered, read-only list of scoring passes
#[derive(Debug, Clone, PartialEq)]
pub struct RubricCatalog {
    rubrics: Vec<RubricSpec>,
}

impl RubricCatalog {
    /// Build a catalog; every template must carry the transcript placeholder
    pub fn new(rubrics: Vec<RubricSpec>) -> Result<Self, ConfigError> {
        if let Some(bad) = rubrics
            .iter()
            .find(|r| !r.prompt_template.contains(TRANSCRIPT_PLACEHOLDER))
        {
            return Err(ConfigError::InvalidValue {
                field: format!("rubrics.{}", bad.criterion),
                message: format!("Template must contain {}", TRANSCRIPT_PLACEHOLDER),
            });
        }
        Ok(Self { rubrics })
    }

    /// Load from a YAML file with a top-level `rubrics` list
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|_| ConfigError::FileNotFound(path.as_ref().display().to_string()))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let file: RubricFile =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        Self::new(file.rubrics)
    }

    pub fn rubrics(&self) -> &[RubricSpec] {
        &self.rubrics
    }

    pub fn iter(&self) -> impl Iterator<Item = &RubricSpec> {
        self.rubrics.iter()
    }

    pub fn len(&self) -> usize {
        self.rubrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rubrics.is_empty()
    }

    /// Introduction, four banded speaking criteria, structure advice
    pub fn builtin() -> Self {
        let mut rubrics = vec![RubricSpec {
            criterion: "AEEC Introduction".to_string(),
            prompt_template: format!(
                "You are a friendly speaking coach. Write a short, encouraging message \
                 (two or three sentences) introducing the feedback the candidate is about \
                 to read. Refer to what they talked about. Do not give scores.\n\n\
                 Transcript:\n{}",
                TRANSCRIPT_PLACEHOLDER
            ),
            model: None,
            max_tokens: None,
            output: OutputContract::FreeText {
                appended_note: None,
                empty_fallback: Some("No introduction message generated.".to_string()),
            },
        }];

        rubrics.extend(
            [
                (
                    "Fluency and Coherence",
                    "how smoothly the candidate speaks, how well ideas are linked, and how \
                     relevant the answers are",
                ),
                (
                    "Lexical Resource",
                    "range, precision and appropriateness of vocabulary, including \
                     paraphrase and collocation",
                ),
                (
                    "Grammatical Range and Accuracy",
                    "variety of sentence structures and the accuracy of grammar and tenses",
                ),
                (
                    "Pronunciation",
                    "intelligibility as far as it can be inferred from the transcript, \
                     including signs of hesitation or self-correction",
                ),
            ]
            .into_iter()
            .map(|(criterion, focus)| banded(criterion, focus)),
        );

        rubrics.push(RubricSpec {
            criterion: "AEEC Structure Advice".to_string(),
            prompt_template: format!(
                "You are a speaking coach. Give the candidate concise, practical advice on \
                 structuring their answers (direct answer, reason, example). Quote one of \
                 their answers and show how it could be restructured. Do not give a score.\n\n\
                 Transcript:\n{}",
                TRANSCRIPT_PLACEHOLDER
            ),
            model: None,
            max_tokens: None,
            output: OutputContract::FreeText {
                appended_note: Some(
                    "Note: Band score is not applicable for AEEC Structure Advice.".to_string(),
                ),
                empty_fallback: Some("No advice generated.".to_string()),
            },
        });

        Self { rubrics }
    }
}

fn banded(criterion: &str, focus: &str) -> RubricSpec {
    RubricSpec {
        criterion: criterion.to_string(),
        prompt_template: format!(
            "You are an experienced IELTS Speaking examiner. Assess the candidate's {} \
             using the public band descriptors. Focus on {}.\n\n\
             Respond in exactly this format:\n\
             Band Score: <whole number from 1 to 9>\n\
             Feedback: <specific feedback quoting the candidate>\n\n\
             Transcript:\n{}",
            criterion, focus, TRANSCRIPT_PLACEHOLDER
        ),
        model: None,
        max_tokens: None,
        output: OutputContract::BandedFeedback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let catalog = RubricCatalog::builtin();
        assert_eq!(catalog.len(), 6);
        assert_eq!(catalog.rubrics()[0].criterion, "AEEC Introduction");
        assert!(catalog.rubrics()[0].is_free_text());
        assert!(!catalog.rubrics()[1].is_free_text());
        assert_eq!(catalog.rubrics()[5].criterion, "AEEC Structure Advice");
        assert!(catalog
            .iter()
            .all(|r| r.prompt_template.contains(TRANSCRIPT_PLACEHOLDER)));
    }

    #[test]
    fn test_render_substitutes_transcript() {
        let catalog = RubricCatalog::builtin();
        let rendered = catalog.rubrics()[2].render("I live in Lyon.");
        assert!(rendered.ends_with("Transcript:\nI live in Lyon."));
        assert!(!rendered.contains(TRANSCRIPT_PLACEHOLDER));
    }

    #[test]
    fn test_yaml_output_contract() {
        let yaml = r#"
rubrics:
  - criterion: Tone
    prompt_template: "Rate tone.\n{{TRANSCRIPT}}"
    model: gpt-4.1-mini
  - criterion: Advice
    prompt_template: "Advise.\n{{TRANSCRIPT}}"
    output:
      kind: free_text
      appended_note: "No score."
"#;
        let catalog = RubricCatalog::from_yaml(yaml).unwrap();
        assert_eq!(catalog.rubrics()[0].output, OutputContract::BandedFeedback);
        assert_eq!(catalog.rubrics()[0].model.as_deref(), Some("gpt-4.1-mini"));
        assert_eq!(
            catalog.rubrics()[1].output,
            OutputContract::FreeText {
                appended_note: Some("No score.".to_string()),
                empty_fallback: None,
            }
        );
    }

    #[test]
    fn test_rejects_template_without_placeholder() {
        let yaml = "rubrics:\n  - criterion: X\n    prompt_template: no placeholder\n";
        assert!(matches!(
            RubricCatalog::from_yaml(yaml),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}

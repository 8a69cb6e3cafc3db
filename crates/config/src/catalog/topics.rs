//! Scripted prompt catalog

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One scripted examiner turn
///
/// `instruction_text` is sent as the system message dictating exactly what
/// the examiner says this turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptSpec {
    #[serde(alias = "prompt_text")]
    pub instruction_text: String,

    /// Forwarded verbatim; 0 when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Forwarded verbatim; the configured default model when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Memory hint, carried as data
    #[serde(default)]
    pub important_memory: bool,

    /// Memory hint, carried as data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_memory: Option<u32>,
}

impl PromptSpec {
    pub fn new(instruction_text: impl Into<String>) -> Self {
        Self {
            instruction_text: instruction_text.into(),
            temperature: None,
            model: None,
            important_memory: false,
            buffer_memory: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn important(mut self) -> Self {
        self.important_memory = true;
        self
    }

    pub fn temperature_or_default(&self) -> f32 {
        self.temperature.unwrap_or(0.0)
    }

    pub fn model_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(default)
    }
}

/// A named, ordered sequence of scripted turns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    pub prompts: Vec<PromptSpec>,
}

impl Topic {
    pub fn prompt(&self, turn_index: usize) -> Option<&PromptSpec> {
        self.prompts.get(turn_index)
    }

    /// Index of the final turn
    pub fn last_index(&self) -> usize {
        self.prompts.len().saturating_sub(1)
    }

    pub fn is_final(&self, turn_index: usize) -> bool {
        turn_index == self.last_index()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TopicFile {
    topics: Vec<Topic>,
}

/// Read-only registry of topics, in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct TopicCatalog {
    topics: Vec<Topic>,
}

impl TopicCatalog {
    /// Build a catalog, rejecting empty or duplicate topics
    pub fn new(topics: Vec<Topic>) -> Result<Self, ConfigError> {
        if topics.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "topics".to_string(),
                message: "No prompt topics found".to_string(),
            });
        }

        for (i, topic) in topics.iter().enumerate() {
            if topic.prompts.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("topics.{}", topic.name),
                    message: "Topic has no prompts".to_string(),
                });
            }
            if topics[..i].iter().any(|t| t.name == topic.name) {
                return Err(ConfigError::InvalidValue {
                    field: format!("topics.{}", topic.name),
                    message: "Duplicate topic name".to_string(),
                });
            }
        }

        Ok(Self { topics })
    }

    /// Load from a YAML file with a top-level `topics` list
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|_| ConfigError::FileNotFound(path.as_ref().display().to_string()))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let file: TopicFile =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        Self::new(file.topics)
    }

    /// Topic names in catalog order
    pub fn names(&self) -> Vec<&str> {
        self.topics.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Topic> {
        self.topics.iter().find(|t| t.name == name)
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// The three Speaking Part 1 topics
    pub fn builtin() -> Self {
        Self {
            topics: vec![
                part_one(
                    "Hometown",
                    "Great. Let's talk about your hometown. Ready?",
                    [
                        "Where is your hometown?",
                        "What do you like most about living there?",
                        "How has your hometown changed in recent years?",
                        "Would you recommend your hometown to visitors? Why or why not?",
                    ],
                ),
                part_one(
                    "Computers",
                    "Okay. Let's talk about computers. Ready?",
                    [
                        "How often do you use a computer?",
                        "What do you mainly use a computer for?",
                        "Do you think computers have changed society significantly?",
                        "Are there any disadvantages to relying heavily on computers?",
                    ],
                ),
                part_one(
                    "Free Time",
                    "Right. Now I'd like to ask you about how you spend your free time. Ready?",
                    [
                        "What do you usually do in your free time?",
                        "Do you prefer spending your free time alone or with others?",
                        "Has the way you spend your free time changed over the years?",
                        "How important is it to have hobbies or leisure activities?",
                    ],
                ),
            ],
        }
    }
}

const OPENING_LINE: &str = "Are you ready to begin Speaking Part 1?";
const CLOSING_LINE: &str =
    "Thank you for participating in the test. Your scores will be printed out in the console. Have a great day!";

fn scripted(preamble: &str, verb: &str, line: &str, rules: &[&str]) -> PromptSpec {
    let rules = rules
        .iter()
        .map(|r| format!("- {}", r))
        .collect::<Vec<_>>()
        .join("\n");
    PromptSpec::new(format!(
        "# System\n{}\n\n## Task\n{}: **\"{}\"**\n\n## Rules\n{}",
        preamble, verb, line, rules
    ))
    .with_temperature(0.0)
    .with_model(crate::constants::models::COMPLETION_DEFAULT)
}

/// Intro, transition, four questions (the last flagged), closing
fn part_one(name: &str, transition: &str, questions: [&str; 4]) -> Topic {
    const EXACT: &[&str] = &["Output must match exactly.", "Do not add anything else."];
    const WORDING: &[&str] = &["Exact wording.", "No follow-ups."];

    let mut prompts = vec![
        scripted("You are the examiner.", "Ask", OPENING_LINE, EXACT),
        scripted("You are the examiner.", "Say", transition, EXACT),
    ];

    let [first, second, third, last] = questions;
    prompts.extend(
        [first, second, third]
            .into_iter()
            .map(|q| scripted("You are the examiner.", "Ask", q, WORDING)),
    );
    prompts.push(
        scripted(
            "You are the examiner. This is your last question.",
            "Ask",
            last,
            WORDING,
        )
        .important(),
    );
    prompts.push(scripted(
        "You are the examiner. The test is now complete. Output only what you are instructed to say.",
        "Say exactly and only",
        CLOSING_LINE,
        &[
            "Output the sentence above with no changes, additions or omissions.",
            "Do not ask follow-up questions.",
            "Do not add greetings, sign-offs or comments.",
        ],
    ));

    Topic {
        name: name.to_string(),
        prompts,
    }
}

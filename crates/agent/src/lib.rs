//! Interview orchestration
//!
//! Features:
//! - Pure turn state machine over an explicit `Session` value
//! - Async controller that executes gateway commands with generation checks
//! - Full-history and summarized context assembly
//! - Sequential rubric feedback pipeline with per-criterion failure isolation

pub mod context;
pub mod controller;
pub mod feedback;
pub mod session;
pub mod state_machine;
pub mod topic;

pub use context::{assemble, question_request, ContextAssembler, ContextInput};
pub use controller::{Gateways, InterviewController, InterviewEvent};
pub use feedback::{interpret, parse_rubric_output, FeedbackPipeline, ParsedRubric, RubricResult};
pub use session::{Phase, Session};
pub use state_machine::{apply, Command, Event, Step};
pub use topic::{FixedTopicSelector, RandomTopicSelector, TopicSelector};

use thiserror::Error;

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Cannot handle {event} while {phase}")]
    InvalidTransition { phase: Phase, event: &'static str },

    #[error("Error: No prompt topics found!")]
    NoTopics,
}

//! Turn orchestration state machine
//!
//! `apply` is a pure function of the current session and one event. It
//! returns the next session value plus at most one command for the driver to
//! execute; the command's outcome comes back as the next event.
//!
//! ```text
//! idle -> recording -> transcribing -> asking -> speaking -> playing -> idle
//!                                                                  \-> finished
//! finished -> processing_feedback -> show_results
//! any non-terminal phase -> error
//! ```

use crate::feedback::RubricResult;
use crate::session::{Phase, Session};
use crate::AgentError;
use examiner_config::{PromptSpec, Topic};
use examiner_core::{last_examiner_message, user_transcript, AudioClip, TranscriptMessage};
use std::sync::Arc;

pub const EMPTY_TRANSCRIPT: &str = "Transcription API returned empty transcript.";
pub const EMPTY_QUESTION: &str = "Ask API returned empty question.";
pub const NO_EXAMINER_QUESTION: &str = "Cannot speak: No examiner question found.";
pub const PLAYBACK_FAILED: &str = "Failed to play examiner audio.";
pub const NO_USER_RESPONSES: &str = "Cannot process feedback: No user responses found in history.";

/// Inputs to the state machine: user actions and gateway outcomes
#[derive(Debug, Clone)]
pub enum Event {
    /// User starts a new interview with the chosen topic
    BeginInterview { topic: Arc<Topic> },
    /// User starts the next turn of the current interview
    BeginTurn,
    /// User stops recording
    StopRequested,
    CaptureFailed { message: String },
    TranscriptReceived { text: String },
    TranscriptionFailed { message: String },
    QuestionReceived { text: String },
    CompletionFailed { message: String },
    SpeechSynthesized { clip: AudioClip },
    SpeechFailed { message: String },
    PlaybackStarted,
    PlaybackCompleted,
    PlaybackFailed,
    FeedbackRequested,
    FeedbackReady { results: Vec<RubricResult> },
    /// Abandon the interview and free every device
    Reset,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::BeginInterview { .. } => "begin_interview",
            Event::BeginTurn => "begin_turn",
            Event::StopRequested => "stop_requested",
            Event::CaptureFailed { .. } => "capture_failed",
            Event::TranscriptReceived { .. } => "transcript_received",
            Event::TranscriptionFailed { .. } => "transcription_failed",
            Event::QuestionReceived { .. } => "question_received",
            Event::CompletionFailed { .. } => "completion_failed",
            Event::SpeechSynthesized { .. } => "speech_synthesized",
            Event::SpeechFailed { .. } => "speech_failed",
            Event::PlaybackStarted => "playback_started",
            Event::PlaybackCompleted => "playback_completed",
            Event::PlaybackFailed => "playback_failed",
            Event::FeedbackRequested => "feedback_requested",
            Event::FeedbackReady { .. } => "feedback_ready",
            Event::Reset => "reset",
        }
    }
}

/// Side effects requested by a transition
#[derive(Debug, Clone)]
pub enum Command {
    BeginCapture,
    StopAndTranscribe,
    RequestQuestion {
        prompt: PromptSpec,
        history: Vec<TranscriptMessage>,
    },
    Synthesize { text: String },
    StartPlayback { clip: AudioClip },
    AwaitPlayback,
    BeginFeedback,
    RunFeedback { transcript: String },
    /// Stop capture and playback; issued on every failure and reset
    ReleaseDevices,
}

/// Result of one transition
#[derive(Debug, Clone)]
pub struct Step {
    pub session: Session,
    pub command: Option<Command>,
}

impl Step {
    fn to(session: Session, command: Command) -> Self {
        Self {
            session,
            command: Some(command),
        }
    }

    fn settle(session: Session) -> Self {
        Self {
            session,
            command: None,
        }
    }
}

fn fail(mut session: Session, message: impl Into<String>) -> Step {
    session.phase = Phase::Error;
    session.last_error = Some(message.into());
    Step::to(session, Command::ReleaseDevices)
}

fn ask_current(mut session: Session) -> Step {
    session.phase = Phase::Asking;
    match session.current_prompt().cloned() {
        Some(prompt) => {
            let history = session.history.clone();
            Step::to(session, Command::RequestQuestion { prompt, history })
        }
        None => {
            let message = format!("Error: Could not find prompt for turn {}.", session.turn_index);
            fail(session, message)
        }
    }
}

fn speak_latest(mut session: Session) -> Step {
    session.phase = Phase::Speaking;
    match last_examiner_message(&session.history).map(|m| m.content.clone()) {
        Some(text) => Step::to(session, Command::Synthesize { text }),
        None => fail(session, NO_EXAMINER_QUESTION),
    }
}

/// Apply one event to the session
///
/// Events that make no sense in the current phase are rejected and leave the
/// session untouched.
pub fn apply(current: &Session, event: Event) -> Result<Step, AgentError> {
    let mut session = current.clone();
    let phase = current.phase;

    let step = match (phase, event) {
        (_, Event::Reset) => Step::to(current.reset(None), Command::ReleaseDevices),

        (_, Event::BeginInterview { topic }) if current.starts_new_interview() => {
            let mut fresh = current.reset(Some(topic));
            fresh.phase = Phase::Recording;
            Step::to(fresh, Command::BeginCapture)
        }

        (Phase::Idle, Event::BeginTurn) if current.turn_index > 0 => {
            session.phase = Phase::Recording;
            Step::to(session, Command::BeginCapture)
        }

        (Phase::Recording | Phase::Transcribing, Event::CaptureFailed { message }) => {
            fail(session, message)
        }

        (Phase::Recording, Event::StopRequested) => {
            session.phase = Phase::Transcribing;
            Step::to(session, Command::StopAndTranscribe)
        }

        (Phase::Transcribing, Event::TranscriptReceived { text }) => {
            let text = text.trim();
            if text.is_empty() {
                fail(session, EMPTY_TRANSCRIPT)
            } else {
                session.history.push(TranscriptMessage::user(text));
                ask_current(session)
            }
        }

        (Phase::Transcribing, Event::TranscriptionFailed { message }) => fail(session, message),

        (Phase::Asking, Event::QuestionReceived { text }) => {
            let text = text.trim();
            if text.is_empty() {
                fail(session, EMPTY_QUESTION)
            } else {
                session.history.push(TranscriptMessage::examiner(text));
                speak_latest(session)
            }
        }

        (Phase::Asking, Event::CompletionFailed { message }) => fail(session, message),

        (Phase::Speaking, Event::SpeechSynthesized { clip }) => {
            Step::to(session, Command::StartPlayback { clip })
        }

        (Phase::Speaking, Event::SpeechFailed { message }) => fail(session, message),

        (Phase::Speaking, Event::PlaybackStarted) => {
            session.phase = Phase::Playing;
            Step::to(session, Command::AwaitPlayback)
        }

        (Phase::Speaking | Phase::Playing, Event::PlaybackFailed) => {
            fail(session, PLAYBACK_FAILED)
        }

        (Phase::Playing, Event::PlaybackCompleted) => {
            if current.is_last_turn() {
                session.phase = Phase::Finished;
                Step::to(session, Command::BeginFeedback)
            } else {
                session.turn_index += 1;
                session.phase = Phase::Idle;
                Step::settle(session)
            }
        }

        (Phase::Finished, Event::FeedbackRequested) => {
            let transcript = user_transcript(&session.history);
            if transcript.trim().is_empty() {
                fail(session, NO_USER_RESPONSES)
            } else {
                session.phase = Phase::ProcessingFeedback;
                Step::to(session, Command::RunFeedback { transcript })
            }
        }

        (Phase::ProcessingFeedback, Event::FeedbackReady { results }) => {
            session.phase = Phase::ShowResults;
            session.results = results;
            Step::settle(session)
        }

        (phase, event) => {
            return Err(AgentError::InvalidTransition {
                phase,
                event: event.name(),
            })
        }
    };

    Ok(step)
}

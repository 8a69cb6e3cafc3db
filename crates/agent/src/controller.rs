//! Interview controller
//!
//! Owns the session and is the only writer to it. Each user action is fed
//! through the state machine; the resulting command is executed against the
//! gateways and its outcome fed back in, until a phase that waits on the user
//! is reached.
//!
//! No lock is held across a gateway call. Every outcome is applied only if
//! the session generation still matches the one the command was issued
//! under, so responses that arrive after a reset are dropped.

use crate::context::{question_request, ContextAssembler};
use crate::feedback::{FeedbackPipeline, RubricResult};
use crate::session::{Phase, Session};
use crate::state_machine::{apply, Command, Event};
use crate::topic::{RandomTopicSelector, TopicSelector};
use crate::AgentError;
use examiner_config::{CompletionSettings, TopicCatalog};
use examiner_core::{
    AudioPlayer, Error, LanguageModel, RecordingCapture, SpeechToText, TextToSpeech,
};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// Gateway and device collaborators
#[derive(Clone)]
pub struct Gateways {
    pub stt: Arc<dyn SpeechToText>,
    pub llm: Arc<dyn LanguageModel>,
    pub tts: Arc<dyn TextToSpeech>,
    pub capture: Arc<dyn RecordingCapture>,
    pub player: Arc<dyn AudioPlayer>,
}

/// Notifications for observers such as a UI layer
#[derive(Debug, Clone)]
pub enum InterviewEvent {
    PhaseChanged {
        from: Phase,
        to: Phase,
        turn_index: usize,
    },
    Results(Vec<RubricResult>),
}

pub struct InterviewController {
    gateways: Gateways,
    topics: Arc<TopicCatalog>,
    selector: Arc<dyn TopicSelector>,
    context: ContextAssembler,
    feedback: FeedbackPipeline,
    completion: CompletionSettings,
    session: Arc<RwLock<Session>>,
    event_tx: broadcast::Sender<InterviewEvent>,
}

impl InterviewController {
    pub fn new(
        gateways: Gateways,
        topics: Arc<TopicCatalog>,
        feedback: FeedbackPipeline,
        completion: CompletionSettings,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            gateways,
            topics,
            selector: Arc::new(RandomTopicSelector),
            context: ContextAssembler::full_history(),
            feedback,
            completion,
            session: Arc::new(RwLock::new(Session::new())),
            event_tx,
        }
    }

    pub fn with_selector(mut self, selector: Arc<dyn TopicSelector>) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_context(mut self, context: ContextAssembler) -> Self {
        self.context = context;
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<InterviewEvent> {
        self.event_tx.subscribe()
    }

    /// Copy of the current session
    pub async fn snapshot(&self) -> Session {
        self.session.read().await.clone()
    }

    pub async fn phase(&self) -> Phase {
        self.session.read().await.phase
    }

    /// Start a new interview, or the next turn of the current one
    ///
    /// Resolves once capture has begun or failed.
    pub async fn start(&self) -> Result<(), AgentError> {
        let (generation, event) = {
            let session = self.session.read().await;
            let event = if session.starts_new_interview() {
                let topic = self
                    .selector
                    .choose(&self.topics)
                    .ok_or(AgentError::NoTopics)?;
                tracing::info!(session_id = %session.id, topic = %topic.name, "Starting interview");
                Event::BeginInterview {
                    topic: Arc::new(topic.clone()),
                }
            } else {
                Event::BeginTurn
            };
            (session.generation, event)
        };

        self.dispatch(generation, event).await
    }

    /// Stop recording and run the turn through to the next user-facing phase
    pub async fn stop(&self) -> Result<(), AgentError> {
        let generation = self.session.read().await.generation;
        self.dispatch(generation, Event::StopRequested).await
    }

    /// Single-button control: stops while recording, starts otherwise
    pub async fn toggle(&self) -> Result<(), AgentError> {
        if self.phase().await == Phase::Recording {
            self.stop().await
        } else {
            self.start().await
        }
    }

    /// Abandon the interview and release every device
    pub async fn reset(&self) -> Result<(), AgentError> {
        let generation = self.session.read().await.generation;
        self.dispatch(generation, Event::Reset).await
    }

    async fn dispatch(&self, generation: u64, event: Event) -> Result<(), AgentError> {
        let mut pending = self.transition(generation, event).await?;

        while let Some((generation, command)) = pending {
            pending = match self.execute(command).await {
                Some(event) => self.transition(generation, event).await?,
                None => None,
            };
        }

        Ok(())
    }

    /// Apply one event if the session is still on `generation`
    async fn transition(
        &self,
        generation: u64,
        event: Event,
    ) -> Result<Option<(u64, Command)>, AgentError> {
        let mut session = self.session.write().await;

        if session.generation != generation {
            tracing::debug!(
                event = event.name(),
                issued = generation,
                current = session.generation,
                "Discarding stale event"
            );
            return Ok(None);
        }

        let from = session.phase;
        let step = apply(&session, event)?;
        *session = step.session;

        let to = session.phase;
        let turn_index = session.turn_index;
        let generation = session.generation;
        let results =
            (from == Phase::ProcessingFeedback && to == Phase::ShowResults).then(|| session.results.clone());

        if to == Phase::Error {
            tracing::warn!(
                session_id = %session.id,
                turn_index,
                error = session.last_error.as_deref().unwrap_or_default(),
                "Turn failed"
            );
        }
        drop(session);

        if from != to {
            tracing::info!(from = %from, to = %to, turn_index, "Interview phase changed");
            let _ = self.event_tx.send(InterviewEvent::PhaseChanged {
                from,
                to,
                turn_index,
            });
        }
        if let Some(results) = results {
            let _ = self.event_tx.send(InterviewEvent::Results(results));
        }

        Ok(step.command.map(|command| (generation, command)))
    }

    /// Run one command; the returned event is its outcome
    async fn execute(&self, command: Command) -> Option<Event> {
        let gw = &self.gateways;

        match command {
            Command::BeginCapture => match gw.capture.start().await {
                Ok(()) => None,
                Err(e) => Some(Event::CaptureFailed {
                    message: capture_message(&e),
                }),
            },

            Command::StopAndTranscribe => {
                let clip = match gw.capture.stop().await {
                    Ok(clip) => clip,
                    Err(e) => {
                        return Some(Event::CaptureFailed {
                            message: capture_message(&e),
                        })
                    }
                };

                tracing::debug!(bytes = clip.len(), mime = %clip.mime_type, "Recording captured");
                Some(match gw.stt.transcribe(&clip).await {
                    Ok(text) => Event::TranscriptReceived { text },
                    Err(e) => Event::TranscriptionFailed {
                        message: e.to_string(),
                    },
                })
            }

            Command::RequestQuestion { prompt, history } => {
                let messages = self.context.messages_for(&prompt, &history).await;
                let request = question_request(&prompt, messages, &self.completion);
                Some(match gw.llm.complete(request).await {
                    Ok(text) => Event::QuestionReceived { text },
                    Err(e) => Event::CompletionFailed {
                        message: e.to_string(),
                    },
                })
            }

            Command::Synthesize { text } => Some(match gw.tts.synthesize(&text).await {
                Ok(clip) => Event::SpeechSynthesized { clip },
                Err(e) => Event::SpeechFailed {
                    message: e.to_string(),
                },
            }),

            Command::StartPlayback { clip } => Some(match gw.player.start(clip).await {
                Ok(()) => Event::PlaybackStarted,
                Err(e) => {
                    tracing::warn!(error = %e, "Playback did not start");
                    Event::PlaybackFailed
                }
            }),

            Command::AwaitPlayback => Some(match gw.player.finished().await {
                Ok(()) => Event::PlaybackCompleted,
                Err(e) => {
                    tracing::warn!(error = %e, "Playback interrupted");
                    Event::PlaybackFailed
                }
            }),

            Command::BeginFeedback => Some(Event::FeedbackRequested),

            Command::RunFeedback { transcript } => {
                let results = self.feedback.run(&transcript).await;
                Some(Event::FeedbackReady { results })
            }

            Command::ReleaseDevices => {
                gw.capture.release().await;
                gw.player.stop().await;
                None
            }
        }
    }
}

fn capture_message(err: &Error) -> String {
    match err {
        Error::Capture(_) => err.to_string(),
        other => format!("Microphone Error: {}", other),
    }
}

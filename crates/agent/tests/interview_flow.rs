//! Integration tests for the interview flow (capture -> STT -> ask -> TTS -> playback)
//!
//! All gateways are in-process doubles so the tests exercise the controller,
//! state machine and feedback pipeline together.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::timeout;

use examiner_agent::{
    FeedbackPipeline, FixedTopicSelector, Gateways, InterviewController, InterviewEvent, Phase,
};
use examiner_config::{
    CompletionSettings, FeedbackSettings, PromptSpec, RubricCatalog, Topic, TopicCatalog,
};
use examiner_core::{
    AudioClip, AudioPlayer, CaptureFailure, CaptureStatus, CompletionRequest, Error,
    LanguageModel, RecordingCapture, Result, SpeechToText, TextToSpeech,
};

#[derive(Default)]
struct FakeCapture {
    fail_with: Mutex<Option<CaptureFailure>>,
    status: Mutex<CaptureStatus>,
    releases: AtomicUsize,
}

#[async_trait]
impl RecordingCapture for FakeCapture {
    async fn start(&self) -> Result<()> {
        if let Some(failure) = self.fail_with.lock().clone() {
            *self.status.lock() = CaptureStatus::Error;
            return Err(failure.into());
        }
        *self.status.lock() = CaptureStatus::Recording;
        Ok(())
    }

    async fn stop(&self) -> Result<AudioClip> {
        *self.status.lock() = CaptureStatus::Stopped;
        Ok(AudioClip::new(vec![1u8, 2, 3], "audio/webm"))
    }

    async fn release(&self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
        *self.status.lock() = CaptureStatus::Idle;
    }

    fn status(&self) -> CaptureStatus {
        *self.status.lock()
    }
}

/// Returns queued transcripts, then numbered answers
#[derive(Default)]
struct FakeStt {
    queued: Mutex<VecDeque<String>>,
    calls: AtomicUsize,
}

#[async_trait]
impl SpeechToText for FakeStt {
    async fn transcribe(&self, _audio: &AudioClip) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .queued
            .lock()
            .pop_front()
            .unwrap_or_else(|| format!("answer {}", n)))
    }

    fn model_name(&self) -> &str {
        "fake-stt"
    }
}

/// Questions echo the scripted instruction; rubric passes get a banded reply
#[derive(Default)]
struct FakeModel {
    fail_rubrics: bool,
    gate: Option<Arc<Notify>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

#[async_trait]
impl LanguageModel for FakeModel {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let is_question = request.max_tokens == Some(50);
        let instruction = request.messages[0].content.clone();
        self.requests.lock().push(request);

        if is_question {
            Ok(format!("Examiner says: {}", instruction))
        } else if self.fail_rubrics {
            Err(Error::completion("upstream down").with_status(503))
        } else {
            Ok("Band Score: 6\nFeedback: Good.".to_string())
        }
    }

    fn model_name(&self) -> &str {
        "fake-llm"
    }
}

struct FakeTts;

#[async_trait]
impl TextToSpeech for FakeTts {
    async fn synthesize(&self, text: &str) -> Result<AudioClip> {
        Ok(AudioClip::speech(text.as_bytes().to_vec()))
    }

    fn model_name(&self) -> &str {
        "fake-tts"
    }
}

#[derive(Default)]
struct FakePlayer {
    played: AtomicUsize,
    stops: AtomicUsize,
    refuse_start: AtomicBool,
    interrupt: AtomicBool,
}

#[async_trait]
impl AudioPlayer for FakePlayer {
    async fn start(&self, _clip: AudioClip) -> Result<()> {
        if self.refuse_start.load(Ordering::SeqCst) {
            return Err(Error::Playback("autoplay blocked".to_string()));
        }
        self.played.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn finished(&self) -> Result<()> {
        if self.interrupt.load(Ordering::SeqCst) {
            return Err(Error::Playback("output device lost".to_string()));
        }
        Ok(())
    }

    async fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

struct Harness {
    controller: Arc<InterviewController>,
    capture: Arc<FakeCapture>,
    stt: Arc<FakeStt>,
    llm: Arc<FakeModel>,
    player: Arc<FakePlayer>,
}

fn six_turn_catalog() -> Arc<TopicCatalog> {
    let topic = Topic {
        name: "Hometown".to_string(),
        prompts: (0..6)
            .map(|i| PromptSpec::new(format!("Ask question {}", i)))
            .collect(),
    };
    Arc::new(TopicCatalog::new(vec![topic]).unwrap())
}

fn harness(llm: FakeModel) -> Harness {
    let capture = Arc::new(FakeCapture::default());
    let stt = Arc::new(FakeStt::default());
    let llm = Arc::new(llm);
    let player = Arc::new(FakePlayer::default());

    let gateways = Gateways {
        stt: stt.clone(),
        llm: llm.clone(),
        tts: Arc::new(FakeTts),
        capture: capture.clone(),
        player: player.clone(),
    };

    let feedback = FeedbackPipeline::new(
        llm.clone(),
        Arc::new(RubricCatalog::builtin()),
        FeedbackSettings::default(),
    );

    let controller = InterviewController::new(
        gateways,
        six_turn_catalog(),
        feedback,
        CompletionSettings::default(),
    )
    .with_selector(Arc::new(FixedTopicSelector("Hometown".to_string())));

    Harness {
        controller: Arc::new(controller),
        capture,
        stt,
        llm,
        player,
    }
}

/// A full six-turn interview ends with one result per rubric
#[tokio::test]
async fn test_six_turn_interview_reaches_results() {
    let h = harness(FakeModel::default());
    let mut events = h.controller.subscribe();

    for turn in 0..6 {
        h.controller.start().await.unwrap();
        assert_eq!(h.controller.phase().await, Phase::Recording);
        h.controller.stop().await.unwrap();

        let session = h.controller.snapshot().await;
        if turn < 5 {
            assert_eq!(session.phase, Phase::Idle);
            assert_eq!(session.turn_index, turn + 1);
        }
    }

    let session = h.controller.snapshot().await;
    assert_eq!(session.phase, Phase::ShowResults);
    assert_eq!(session.turn_index, 5);
    assert_eq!(session.history.len(), 12);
    assert_eq!(session.results.len(), RubricCatalog::builtin().len());
    assert_eq!(h.player.played.load(Ordering::SeqCst), 6);

    // Rubric passes saw the joined user answers
    let requests = h.llm.requests.lock();
    let rubric_request = requests.iter().find(|r| r.max_tokens == Some(1500)).unwrap();
    assert!(rubric_request.messages[0]
        .content
        .contains("answer 0\n\nanswer 1\n\nanswer 2\n\nanswer 3\n\nanswer 4\n\nanswer 5"));
    drop(requests);

    // Finished, processing and results are all announced
    let mut seen = Vec::new();
    let mut got_results = false;
    while let Ok(Ok(event)) = timeout(Duration::from_millis(50), events.recv()).await {
        match event {
            InterviewEvent::PhaseChanged { to, .. } => seen.push(to),
            InterviewEvent::Results(results) => got_results = results.len() == 6,
        }
    }
    assert!(seen.contains(&Phase::Finished));
    assert!(seen.contains(&Phase::ProcessingFeedback));
    assert_eq!(seen.last(), Some(&Phase::ShowResults));
    assert!(got_results);
}

/// Each question request carries the turn's instruction followed by history
#[tokio::test]
async fn test_question_context_uses_full_history() {
    let h = harness(FakeModel::default());

    h.controller.start().await.unwrap();
    h.controller.stop().await.unwrap();
    h.controller.start().await.unwrap();
    h.controller.stop().await.unwrap();

    let requests = h.llm.requests.lock();
    assert_eq!(requests.len(), 2);

    let second = &requests[1];
    assert_eq!(second.messages[0].content, "Ask question 1");
    assert_eq!(second.messages.len(), 4);
    assert_eq!(second.messages[2].role, examiner_core::ChatRole::Assistant);
    assert_eq!(second.model, "gpt-4o-mini");
    assert_eq!(second.temperature, 0.0);
}

/// An empty transcript fails the turn without touching history
#[tokio::test]
async fn test_empty_transcript_enters_error() {
    let h = harness(FakeModel::default());

    h.controller.start().await.unwrap();
    h.controller.stop().await.unwrap();
    let before = h.controller.snapshot().await.history.len();

    h.stt.queued.lock().push_back("   ".to_string());
    h.controller.start().await.unwrap();
    h.controller.stop().await.unwrap();

    let session = h.controller.snapshot().await;
    assert_eq!(session.phase, Phase::Error);
    assert_eq!(session.history.len(), before);
    assert!(!session.last_error.unwrap_or_default().is_empty());
    assert!(h.capture.releases.load(Ordering::SeqCst) >= 1);
}

/// Starting again from error is a full reset
#[tokio::test]
async fn test_restart_after_error_resets_session() {
    let h = harness(FakeModel::default());
    h.stt.queued.lock().push_back(String::new());

    h.controller.start().await.unwrap();
    h.controller.stop().await.unwrap();
    assert_eq!(h.controller.phase().await, Phase::Error);

    h.controller.toggle().await.unwrap();
    let session = h.controller.snapshot().await;
    assert_eq!(session.phase, Phase::Recording);
    assert!(session.history.is_empty());
    assert_eq!(session.turn_index, 0);
    assert!(session.last_error.is_none());
}

/// A denied microphone produces the capture diagnostic and frees the device
#[tokio::test]
async fn test_capture_failure() {
    let h = harness(FakeModel::default());
    *h.capture.fail_with.lock() = Some(CaptureFailure::PermissionDenied);

    h.controller.start().await.unwrap();

    let session = h.controller.snapshot().await;
    assert_eq!(session.phase, Phase::Error);
    assert_eq!(
        session.last_error.as_deref(),
        Some("Microphone Error: Microphone permission denied.")
    );
    assert_eq!(h.capture.releases.load(Ordering::SeqCst), 1);
    assert_eq!(h.capture.status(), CaptureStatus::Idle);
}

/// Rubric failures never shrink the result list
#[tokio::test]
async fn test_all_rubrics_failing_still_yields_full_results() {
    let h = harness(FakeModel {
        fail_rubrics: true,
        ..Default::default()
    });

    for _ in 0..6 {
        h.controller.start().await.unwrap();
        h.controller.stop().await.unwrap();
    }

    let session = h.controller.snapshot().await;
    assert_eq!(session.phase, Phase::ShowResults);
    assert_eq!(session.results.len(), 6);
    assert!(session.results.iter().all(|r| r.band_score == 0));
    assert!(session
        .results
        .iter()
        .all(|r| r.feedback == "Error: Failed to evaluate criterion due to API error."));
}

/// A question arriving after a reset is dropped
#[tokio::test]
async fn test_stale_response_after_reset_is_discarded() {
    let gate = Arc::new(Notify::new());
    let h = harness(FakeModel {
        gate: Some(gate.clone()),
        ..Default::default()
    });
    let mut events = h.controller.subscribe();

    h.controller.start().await.unwrap();
    let controller = h.controller.clone();
    let turn = tokio::spawn(async move { controller.stop().await });

    // Wait until the question request is outstanding
    loop {
        match timeout(Duration::from_secs(1), events.recv()).await {
            Ok(Ok(InterviewEvent::PhaseChanged { to: Phase::Asking, .. })) => break,
            Ok(Ok(_)) => continue,
            other => panic!("never reached asking: {:?}", other.is_ok()),
        }
    }

    h.controller.reset().await.unwrap();
    gate.notify_one();
    turn.await.unwrap().unwrap();

    let session = h.controller.snapshot().await;
    assert_eq!(session.phase, Phase::Idle);
    assert!(session.history.is_empty());
    assert!(session.topic.is_none());
    assert_eq!(h.player.played.load(Ordering::SeqCst), 0);
}

/// Stop is only accepted while recording
#[tokio::test]
async fn test_stop_while_idle_is_rejected() {
    let h = harness(FakeModel::default());
    assert!(h.controller.stop().await.is_err());
    assert_eq!(h.controller.phase().await, Phase::Idle);
}

/// Starting again from the results screen begins a fresh interview
#[tokio::test]
async fn test_restart_after_results_resets_session() {
    let h = harness(FakeModel::default());

    for _ in 0..6 {
        h.controller.start().await.unwrap();
        h.controller.stop().await.unwrap();
    }
    let finished = h.controller.snapshot().await;
    assert_eq!(finished.phase, Phase::ShowResults);
    assert!(!finished.results.is_empty());

    h.controller.start().await.unwrap();

    let session = h.controller.snapshot().await;
    assert_eq!(session.phase, Phase::Recording);
    assert_eq!(session.id, finished.id);
    assert_eq!(session.generation, finished.generation + 1);
    assert_eq!(session.turn_index, 0);
    assert!(session.history.is_empty());
    assert!(session.results.is_empty());
    assert!(session.last_error.is_none());
    assert_eq!(session.topic_name(), Some("Hometown"));
}

/// Playback that never starts fails the turn and frees the devices
#[tokio::test]
async fn test_playback_refused() {
    let h = harness(FakeModel::default());
    h.player.refuse_start.store(true, Ordering::SeqCst);

    h.controller.start().await.unwrap();
    h.controller.stop().await.unwrap();

    let session = h.controller.snapshot().await;
    assert_eq!(session.phase, Phase::Error);
    assert_eq!(session.last_error.as_deref(), Some("Failed to play examiner audio."));
    assert_eq!(session.turn_index, 0);
    assert_eq!(h.capture.releases.load(Ordering::SeqCst), 1);
    assert_eq!(h.player.stops.load(Ordering::SeqCst), 1);
}

/// Playback interrupted midway fails the turn the same way
#[tokio::test]
async fn test_playback_interrupted() {
    let h = harness(FakeModel::default());
    let mut events = h.controller.subscribe();
    h.player.interrupt.store(true, Ordering::SeqCst);

    h.controller.start().await.unwrap();
    h.controller.stop().await.unwrap();

    let session = h.controller.snapshot().await;
    assert_eq!(session.phase, Phase::Error);
    assert_eq!(session.last_error.as_deref(), Some("Failed to play examiner audio."));
    assert_eq!(h.player.played.load(Ordering::SeqCst), 1);
    assert_eq!(h.capture.releases.load(Ordering::SeqCst), 1);

    let mut reached_playing = false;
    while let Ok(Ok(event)) = timeout(Duration::from_millis(50), events.recv()).await {
        if let InterviewEvent::PhaseChanged { from: Phase::Playing, to: Phase::Error, .. } = event {
            reached_playing = true;
        }
    }
    assert!(reached_playing);
}

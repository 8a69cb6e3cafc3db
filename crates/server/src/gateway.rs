//! Gateway endpoints
//!
//! One endpoint per gateway. Payload problems are rejected with 400 before any
//! upstream call; upstream failures keep their status code.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

use examiner_agent::{assemble, question_request, ContextInput, RubricResult};
use examiner_config::PromptSpec;
use examiner_core::{AudioClip, ChatMessage, TranscriptMessage, SPEECH_MIME_TYPE};

use crate::error::{ApiError, ApiJson};
use crate::metrics::{
    record_error, record_llm_latency, record_request, record_stt_latency, record_tts_latency,
};
use crate::state::AppState;

/// Count the outcome of one endpoint call
fn observe<T>(endpoint: &'static str, result: Result<T, ApiError>) -> Result<T, ApiError> {
    match &result {
        Ok(_) => record_request(endpoint, 200),
        Err(e) => {
            record_request(endpoint, e.status.as_u16());
            if e.status.is_server_error() {
                record_error(endpoint);
            }
        }
    }
    result
}

#[derive(Debug, Serialize)]
pub struct TranscribeResponse {
    pub transcript: String,
}

/// POST /api/transcribe
///
/// Multipart upload; the clip is read from the `audio` field, or `file`.
pub async fn transcribe(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<TranscribeResponse>, ApiError> {
    let result = match multipart {
        Ok(multipart) => transcribe_inner(state, multipart).await,
        Err(rejection) => Err(rejection.into()),
    };
    observe("transcribe", result)
}

async fn transcribe_inner(
    state: AppState,
    mut multipart: Multipart,
) -> Result<Json<TranscribeResponse>, ApiError> {
    let mut clip = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart payload: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name != "audio" && name != "file" {
            continue;
        }

        let mime = field.content_type().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed reading multipart '{name}' field: {e}")))?;
        if !bytes.is_empty() {
            clip = Some(AudioClip::new(bytes, mime));
        }
    }

    let clip = clip.ok_or_else(|| ApiError::bad_request("No audio file provided"))?;
    tracing::info!(
        bytes = clip.len(),
        mime = %clip.mime_type,
        file_name = %clip.file_name(),
        "Transcription request"
    );

    let started = Instant::now();
    let transcript = state
        .upstreams
        .stt
        .transcribe(&clip)
        .await
        .map_err(|e| ApiError::gateway("Transcription failed", &e))?;
    record_stt_latency(started.elapsed());

    Ok(Json(TranscribeResponse { transcript }))
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub question: String,
}

/// POST /api/ask
///
/// `{prompt, history}` sends the instruction followed by the whole history;
/// `{prompt, messages}` sends an already composed list.
pub async fn ask(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<AskResponse>, ApiError> {
    observe("ask", ask_inner(state, body).await)
}

async fn ask_inner(state: AppState, body: Value) -> Result<Json<AskResponse>, ApiError> {
    let prompt: PromptSpec = body
        .get("prompt")
        .filter(|p| p.is_object())
        .and_then(|p| serde_json::from_value(p.clone()).ok())
        .ok_or_else(|| ApiError::bad_request("Invalid or missing prompt object in request body"))?;

    let messages = match (body.get("messages"), body.get("history")) {
        (Some(messages), _) => {
            let composed = transcript_list(messages).ok_or_else(|| {
                ApiError::bad_request("Invalid messages format: Expected an array")
            })?;
            assemble(ContextInput::PreComposed(&composed))
        }
        (None, history) => {
            let history = match history {
                Some(history) => transcript_list(history).ok_or_else(|| {
                    ApiError::bad_request("Invalid history format: Expected an array")
                })?,
                None => Vec::new(),
            };
            assemble(ContextInput::FullHistory {
                instruction: &prompt.instruction_text,
                history: &history,
            })
        }
    };

    let request = {
        let config = state.get_config();
        question_request(&prompt, messages, &config.completion)
    };
    tracing::debug!(
        model = %request.model,
        messages = request.messages.len(),
        "Question request"
    );

    let started = Instant::now();
    let question = state
        .upstreams
        .llm
        .complete(request)
        .await
        .map_err(|e| ApiError::gateway("Ask API failed", &e))?;
    record_llm_latency("ask", started.elapsed());

    let question = question.trim();
    if question.is_empty() {
        return Err(ApiError::internal("Failed to generate question from LLM"));
    }

    Ok(Json(AskResponse {
        question: question.to_string(),
    }))
}

fn transcript_list(value: &Value) -> Option<Vec<TranscriptMessage>> {
    if !value.is_array() {
        return None;
    }
    serde_json::from_value(value.clone()).ok()
}

#[derive(Debug, Deserialize)]
pub struct SpeakRequest {
    #[serde(default)]
    pub text: Option<String>,
}

/// POST /api/speak
pub async fn speak(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SpeakRequest>,
) -> Result<Response, ApiError> {
    observe("speak", speak_inner(state, request).await)
}

async fn speak_inner(state: AppState, request: SpeakRequest) -> Result<Response, ApiError> {
    let text = request
        .text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("No text provided to speak"))?;

    let started = Instant::now();
    let clip = state
        .upstreams
        .tts
        .synthesize(&text)
        .await
        .map_err(|e| ApiError::gateway("Speech synthesis failed", &e))?;
    record_tts_latency(started.elapsed());

    tracing::debug!(chars = text.len(), bytes = clip.len(), "Speech synthesized");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, SPEECH_MIME_TYPE),
            (header::CONTENT_DISPOSITION, "inline; filename=\"speech.mp3\""),
        ],
        clip.data,
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    #[serde(default)]
    pub messages: Option<Vec<ChatMessage>>,
}

#[derive(Debug, Serialize)]
pub struct SummarizeResponse {
    pub summary: String,
}

/// POST /api/summarize
pub async fn summarize(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SummarizeRequest>,
) -> Result<Json<SummarizeResponse>, ApiError> {
    observe("summarize", summarize_inner(state, request).await)
}

async fn summarize_inner(
    state: AppState,
    request: SummarizeRequest,
) -> Result<Json<SummarizeResponse>, ApiError> {
    let messages = request
        .messages
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ApiError::bad_request("No messages provided for summarization"))?;

    let started = Instant::now();
    let summary = state
        .upstreams
        .summarizer
        .summarize(&messages)
        .await
        .map_err(|e| ApiError::gateway("Summarize API failed", &e))?;
    record_llm_latency("summarize", started.elapsed());

    Ok(Json(SummarizeResponse { summary }))
}

#[derive(Debug, Deserialize)]
pub struct PipelineRequest {
    #[serde(default)]
    pub transcript: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PipelineResponse {
    pub feedback: Vec<RubricResult>,
}

/// POST /api/pipeline
///
/// Always answers with one entry per rubric; failed criteria carry a
/// sentinel result instead of failing the request.
pub async fn pipeline(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PipelineRequest>,
) -> Result<Json<PipelineResponse>, ApiError> {
    observe("pipeline", pipeline_inner(state, request).await)
}

async fn pipeline_inner(
    state: AppState,
    request: PipelineRequest,
) -> Result<Json<PipelineResponse>, ApiError> {
    let transcript = request
        .transcript
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("No transcript provided for evaluation"))?;

    tracing::info!(
        chars = transcript.len(),
        rubrics = state.feedback.rubric_count(),
        "Running feedback pipeline"
    );

    let started = Instant::now();
    let feedback = state.feedback.run(&transcript).await;
    record_llm_latency("feedback", started.elapsed());

    Ok(Json(PipelineResponse { feedback }))
}

//! HTTP Endpoints
//!
//! Router, CORS and the operational endpoints.

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use examiner_config::constants::timeouts::READINESS_TIMEOUT_MS;

use crate::gateway;
use crate::metrics::metrics_handler;
use crate::state::AppState;

const DEV_ORIGIN: &str = "http://localhost:3000";

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let config = state.get_config();
    let cors_layer = build_cors_layer(&config.server.cors_origins, config.server.cors_enabled);
    let body_limit = config.server.max_upload_bytes;
    drop(config);

    Router::new()
        // Gateways
        .route("/api/transcribe", post(gateway::transcribe))
        .route("/api/ask", post(gateway::ask))
        .route("/api/speak", post(gateway::speak))
        .route("/api/summarize", post(gateway::summarize))
        .route("/api/pipeline", post(gateway::pipeline))
        // Catalogs
        .route("/api/topics", get(list_topics))
        // Health check
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        // Prometheus metrics
        .route("/metrics", get(metrics_handler))
        // Admin
        .route("/admin/reload-config", post(reload_config))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - If cors_enabled is false, returns permissive layer (for dev)
/// - If cors_origins is empty or all invalid, allows only localhost:3000
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins");
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        tracing::info!("No usable CORS origins configured, defaulting to {}", DEV_ORIGIN);
        return CorsLayer::new()
            .allow_origin(HeaderValue::from_static(DEV_ORIGIN))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any);
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

/// GET /api/topics
async fn list_topics(State(state): State<AppState>) -> Json<serde_json::Value> {
    let topics = state.topics.names();
    Json(serde_json::json!({
        "topics": topics,
        "count": topics.len(),
    }))
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {
            "topics": state.topics.len(),
            "rubrics": state.rubrics.len(),
            "transcription_model": state.upstreams.stt.model_name(),
            "speech_model": state.upstreams.tts.model_name(),
            "completion_model": state.upstreams.llm.model_name(),
        }
    }))
}

/// GET /ready
///
/// Probes the upstream API's model listing.
async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let api = &state.upstreams.api;
    let url = api.url("models");

    let status = match api.client() {
        Ok(client) => {
            let request = client.get(&url).headers(api.auth_headers()).send();
            match tokio::time::timeout(Duration::from_millis(READINESS_TIMEOUT_MS), request).await {
                Ok(Ok(resp)) if resp.status().is_success() => "ok",
                Ok(Ok(_)) => "error",
                Ok(Err(_)) => "unreachable",
                Err(_) => "timeout",
            }
        }
        Err(_) => "misconfigured",
    };
    let ready = status == "ok";

    (
        if ready {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        },
        Json(serde_json::json!({
            "status": if ready { "ready" } else { "not_ready" },
            "checks": {
                "upstream": {
                    "status": status,
                    "url": url,
                }
            }
        })),
    )
}

/// POST /admin/reload-config
///
/// Note: backends, catalogs and CORS are only applied at startup.
async fn reload_config(State(state): State<AppState>) -> impl IntoResponse {
    match state.reload_config() {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "success",
                "message": "Configuration reloaded successfully"
            })),
        ),
        Err(e) => {
            tracing::error!("Config reload failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "status": "error",
                    "message": e.to_string()
                })),
            )
        }
    }
}

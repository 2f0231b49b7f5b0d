// HTTP request handlers

use super::routes::AppState;
use crate::cache::CacheStats;
use crate::error::ProxyError;
use crate::models::claude::MessagesRequest;
use crate::models::mapping::map_model;
use crate::translation::{sse_stream, translate_request, translate_response, StreamTranscoder};
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error, info};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub big_model: String,
    pub small_model: String,
    pub cache: CacheStats,
    pub timestamp: String,
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        big_model: state.config.models.big_model.clone(),
        small_model: state.config.models.small_model.clone(),
        cache: state.gemini_client.cache_stats(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Handler for /v1/messages endpoint (Anthropic Messages API compatible)
pub async fn messages_handler(
    State(state): State<AppState>,
    body: String, // Raw JSON first, for better deserialization errors
) -> Result<Response, ProxyError> {
    let request: MessagesRequest = serde_json::from_str(&body).map_err(|e| {
        error!("Failed to deserialize request: {}", e);
        debug!("Raw body (first 1000 chars): {}", truncate_chars(&body, 1000));
        ProxyError::InvalidRequest(format!("JSON deserialization error: {}", e))
    })?;

    info!(
        model = %request.model,
        messages = request.messages.len(),
        stream = request.stream.unwrap_or(false),
        "Received messages request"
    );

    if request.stream.unwrap_or(false) {
        stream_messages_handler(state, request).await
    } else {
        non_stream_messages_handler(state, request).await
    }
}

/// Truncate to at most `max` characters, never splitting a code point.
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Handle non-streaming messages
async fn non_stream_messages_handler(
    state: AppState,
    request: MessagesRequest,
) -> Result<Response, ProxyError> {
    let gemini_model = map_model(&request.model, &state.config.models);
    let gemini_request = translate_request(&request, &state.config.thinking)?;

    debug!(%gemini_model, "Translated request to Gemini format");

    let gemini_response = state
        .gemini_client
        .generate_content(gemini_request, &gemini_model)
        .await
        .map_err(|e| {
            error!("Gemini API call failed: {}", e);
            e
        })?;

    let client_response = translate_response(&gemini_response, &request.model).map_err(|e| {
        error!("Response translation failed: {}", e);
        e
    })?;

    Ok(Json(client_response).into_response())
}

/// Handle streaming messages with SSE
async fn stream_messages_handler(
    state: AppState,
    request: MessagesRequest,
) -> Result<Response, ProxyError> {
    debug!(model = %request.model, "Starting streaming response");

    let gemini_model = map_model(&request.model, &state.config.models);
    let gemini_request = translate_request(&request, &state.config.thinking)?;

    let gemini_stream = state
        .gemini_client
        .stream_generate_content(gemini_request, &gemini_model)
        .await?;

    let transcoder = StreamTranscoder::new(request.model.clone());
    let frames = sse_stream(transcoder, gemini_stream);

    use futures::StreamExt;
    let body = axum::body::Body::from_stream(
        frames.map(Ok::<String, std::convert::Infallible>),
    );

    Ok(Response::builder()
        .status(200)
        .header("Content-Type", "text/event-stream; charset=utf-8")
        .header("Cache-Control", "no-cache")
        .header("Connection", "keep-alive")
        .header("X-Accel-Buffering", "no")
        .header("anthropic-version", "2023-06-01")
        .header("request-id", format!("req_{}", uuid::Uuid::new_v4()))
        .body(body)
        .map_err(|e| ProxyError::Internal(format!("Failed to build response: {}", e)))?)
}

// Error types for the claude2gemini proxy

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Gemini API error: {0}")]
    BackendApi(String),

    #[error("Rate limited: {0}")]
    TooManyRequests(String),

    #[error("Upstream overloaded: {0}")]
    Overloaded(String),

    #[error("Upstream unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Config parsing error: {0}")]
    ConfigParsing(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

// Convert ProxyError to Anthropic-style HTTP error responses for Axum
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ProxyError::InvalidRequest(_) => {
                (StatusCode::BAD_REQUEST, "invalid_request_error", self.to_string())
            }
            ProxyError::TooManyRequests(_) => {
                (StatusCode::TOO_MANY_REQUESTS, "rate_limit_error", self.to_string())
            }
            ProxyError::Overloaded(_) => (
                StatusCode::from_u16(529).unwrap_or(StatusCode::SERVICE_UNAVAILABLE),
                "overloaded_error",
                self.to_string(),
            ),
            ProxyError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "api_error", self.to_string())
            }
            ProxyError::BackendApi(_) | ProxyError::Translation(_) => {
                (StatusCode::BAD_GATEWAY, "api_error", self.to_string())
            }
            ProxyError::Config(_) | ProxyError::ConfigParsing(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error", self.to_string())
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "api_error", self.to_string()),
        };

        let body = json!({
            "type": "error",
            "error": {
                "type": error_type,
                "message": message,
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;

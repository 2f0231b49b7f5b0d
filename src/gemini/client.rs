// Gemini API client

use crate::cache::{collapse_cached_content, CacheStats, ContentCache};
use crate::config::GeminiConfig;
use crate::error::{ProxyError, Result};
use crate::models::gemini::{GenerateContentRequest, GenerateContentResponse, Part};
use futures::stream::Stream;
use reqwest::Client;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Client for the Google Generative Language API.
///
/// Owns the outbound HTTP connection pool, API-key auth, retry policy for
/// blocking calls, and the content-cache hook that collapses repeated large
/// prompts.
pub struct GeminiClient {
    http_client: Client,
    config: GeminiConfig,
    cache: Arc<ContentCache>,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig, cache: Arc<ContentCache>) -> Result<Self> {
        // Configure HTTP client for optimal streaming performance
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .tcp_nodelay(true)
            .use_rustls_tls()
            .build()
            .map_err(|e| ProxyError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        debug!("Created HTTP client with connection pooling and keep-alive");

        Ok(Self {
            http_client,
            config: config.clone(),
            cache,
        })
    }

    /// Call `generateContent` (blocking), retrying transient upstream
    /// failures with retryDelay-hint support.
    pub async fn generate_content(
        &self,
        mut request: GenerateContentRequest,
        model: &str,
    ) -> Result<GenerateContentResponse> {
        self.apply_content_cache(&mut request, model);

        let url = format!("{}/models/{}:generateContent", self.config.api_base_url, model);
        let body = serde_json::to_string(&request)?;
        info!(model, contents = request.contents.len(), "Gemini request");

        let client = self.http_client.clone();
        let api_key = self.config.api_key.clone();

        let response_text = crate::utils::retry::with_retry(
            "generateContent",
            self.config.max_retries.max(1),
            || {
                let client = client.clone();
                let url = url.clone();
                let api_key = api_key.clone();
                let body = body.clone();
                async move {
                    let response = client
                        .post(&url)
                        .header("x-goog-api-key", &api_key)
                        .header("Content-Type", "application/json")
                        .body(body)
                        .send()
                        .await
                        .map_err(|e| (500u16, format!("HTTP error: {}", e)))?;

                    let status = response.status();
                    let text = response.text().await.unwrap_or_default();
                    if !status.is_success() {
                        let message =
                            extract_error_message(&text).unwrap_or_else(|| text.clone());
                        return Err((status.as_u16(), message));
                    }
                    Ok(text)
                }
            },
        )
        .await
        .map_err(|(status, body)| match status {
            400 => ProxyError::InvalidRequest(body),
            429 => ProxyError::TooManyRequests(body),
            529 => ProxyError::Overloaded(format!("Gemini API overloaded: {}", body)),
            503 | 504 => ProxyError::ServiceUnavailable(format!("Upstream unavailable: {}", body)),
            _ => ProxyError::BackendApi(format!("HTTP {}: {}", status, body)),
        })?;

        let response: GenerateContentResponse = serde_json::from_str(&response_text)?;
        Ok(response)
    }

    /// Call `streamGenerateContent` and return the chunk stream.
    ///
    /// No retry here: once chunks may have flowed, replaying the call could
    /// duplicate output on the client side.
    pub async fn stream_generate_content(
        &self,
        mut request: GenerateContentRequest,
        model: &str,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<GenerateContentResponse>> + Send>>> {
        self.apply_content_cache(&mut request, model);

        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.config.api_base_url, model
        );
        info!(model, contents = request.contents.len(), "Gemini streaming request");

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message =
                extract_error_message(&error_text).unwrap_or_else(|| error_text.clone());
            return Err(match status.as_u16() {
                400 => ProxyError::InvalidRequest(message),
                429 => ProxyError::TooManyRequests(message),
                503 | 504 => ProxyError::ServiceUnavailable(message),
                code => ProxyError::BackendApi(format!("HTTP {}: {}", code, message)),
            });
        }

        let chunk_stream = super::streaming::parse_sse_stream(response.bytes_stream());
        Ok(Box::pin(chunk_stream))
    }

    /// Collapse the leading user text part when the cache has seen it, or
    /// remember it for next time.
    ///
    /// Only the first part of the first user content is considered: that is
    /// where clients place the large repeated system/context blob.
    fn apply_content_cache(&self, request: &mut GenerateContentRequest, model: &str) {
        let Some(first_content) = request.contents.first_mut() else {
            return;
        };
        if first_content.role != "user" {
            return;
        }
        let Some(Part::Text { text, .. }) = first_content.parts.first_mut() else {
            return;
        };

        if !self.cache.should_cache(text) {
            return;
        }

        if self.cache.lookup(text, model).is_some() {
            let collapsed = collapse_cached_content(text);
            debug!(
                original_chars = text.len(),
                collapsed_chars = collapsed.len(),
                "using cached content"
            );
            *text = collapsed;
        } else {
            self.cache.store(text, model);
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

/// Extract the human message from a Gemini error response body.
fn extract_error_message(response_text: &str) -> Option<String> {
    #[derive(serde::Deserialize)]
    struct ErrorResponse {
        error: Option<ErrorDetail>,
    }

    #[derive(serde::Deserialize)]
    struct ErrorDetail {
        message: Option<String>,
        status: Option<String>,
    }

    if let Ok(error_resp) = serde_json::from_str::<ErrorResponse>(response_text) {
        if let Some(error) = error_resp.error {
            return error.message.or(error.status);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheSettings;
    use crate::models::gemini::Content;

    fn client_with_cache(settings: CacheSettings) -> GeminiClient {
        GeminiClient::new(
            &GeminiConfig::default(),
            Arc::new(ContentCache::new(settings)),
        )
        .unwrap()
    }

    fn request_with_text(text: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part::text(text)],
            }],
            generation_config: None,
            tools: None,
            tool_config: None,
        }
    }

    #[test]
    fn test_extract_error_message() {
        let body = r#"{"error": {"code": 429, "message": "quota exhausted", "status": "RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(extract_error_message(body).as_deref(), Some("quota exhausted"));
        assert!(extract_error_message("plain text failure").is_none());
    }

    #[test]
    fn test_content_cache_collapses_on_second_sight() {
        let client = client_with_cache(CacheSettings {
            enabled: true,
            min_chars: 10,
            ttl_hours: 24,
        });
        let long_text = "line one\nline two\nline three\nline four\nline five\nline six\nline seven";

        // first sight: stored, untouched
        let mut first = request_with_text(long_text);
        client.apply_content_cache(&mut first, "gemini-2.5-pro");
        assert!(matches!(&first.contents[0].parts[0], Part::Text { text, .. } if text == long_text));

        // second sight: collapsed to the tail
        let mut second = request_with_text(long_text);
        client.apply_content_cache(&mut second, "gemini-2.5-pro");
        match &second.contents[0].parts[0] {
            Part::Text { text, .. } => {
                assert!(text.starts_with("[Previous context cached] "));
                assert!(text.ends_with("line seven"));
                assert!(!text.contains("line one"));
            }
            _ => panic!("expected text part"),
        }
    }

    #[test]
    fn test_cache_ignores_short_and_non_user_content() {
        let client = client_with_cache(CacheSettings {
            enabled: true,
            min_chars: 1000,
            ttl_hours: 24,
        });

        let mut request = request_with_text("short");
        client.apply_content_cache(&mut request, "gemini-2.5-pro");
        client.apply_content_cache(&mut request, "gemini-2.5-pro");
        assert!(matches!(&request.contents[0].parts[0], Part::Text { text, .. } if text == "short"));
    }
}

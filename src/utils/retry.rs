// Retry logic with Google retryDelay hint support

use backoff::{backoff::Backoff, ExponentialBackoff};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Parse Google's retryDelay duration string out of an error body
/// (e.g., "0.457639761s", "40s"). Capped at 60 seconds.
pub fn parse_retry_delay(error_json: &str) -> Option<Duration> {
    let parsed: Value = serde_json::from_str(error_json).ok()?;

    // Navigate: error.details[] -> find RetryInfo -> retryDelay
    let details = parsed.get("error")?.get("details")?.as_array()?;

    for detail in details {
        if detail.get("@type")?.as_str()? == "type.googleapis.com/google.rpc.RetryInfo" {
            if let Some(retry_delay) = detail.get("retryDelay").and_then(|v| v.as_str()) {
                return parse_duration_string(retry_delay);
            }
        }
    }

    None
}

fn parse_duration_string(duration_str: &str) -> Option<Duration> {
    let seconds_str = duration_str.strip_suffix('s')?;
    let seconds: f64 = seconds_str.parse().ok()?;

    let capped_seconds = seconds.min(60.0);
    let millis = (capped_seconds * 1000.0) as u64;
    Some(Duration::from_millis(millis))
}

/// Exponential backoff used when the upstream gives no retry hint.
pub fn create_backoff() -> ExponentialBackoff {
    ExponentialBackoff {
        current_interval: Duration::from_millis(500),
        initial_interval: Duration::from_millis(500),
        randomization_factor: 0.3,
        multiplier: 2.0,
        max_interval: Duration::from_secs(30),
        max_elapsed_time: Some(Duration::from_secs(120)),
        ..Default::default()
    }
}

/// Whether an HTTP status code is worth retrying.
pub fn is_retryable(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Execute an operation with retry: Google's retryDelay hint wins when
/// present, exponential backoff otherwise. Errors carry (status, body).
pub async fn with_retry<F, Fut, T>(
    operation_name: &str,
    max_attempts: u32,
    mut operation: F,
) -> Result<T, (u16, String)>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, (u16, String)>>,
{
    let mut backoff = create_backoff();
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}", operation_name, attempt);
                }
                return Ok(result);
            }
            Err((status, error_body)) => {
                if !is_retryable(status) || attempt >= max_attempts {
                    return Err((status, error_body));
                }

                let delay = if let Some(google_delay) = parse_retry_delay(&error_body) {
                    debug!(
                        "{} failed with {} (attempt {}), upstream suggests waiting {}ms",
                        operation_name,
                        status,
                        attempt,
                        google_delay.as_millis()
                    );
                    google_delay
                } else {
                    let backoff_delay = backoff
                        .next_backoff()
                        .unwrap_or(Duration::from_secs(30));
                    warn!(
                        "{} failed with {} (attempt {}), backing off {}ms",
                        operation_name,
                        status,
                        attempt,
                        backoff_delay.as_millis()
                    );
                    backoff_delay
                };

                tokio::time::sleep(delay).await;
            }
        }
    }
}

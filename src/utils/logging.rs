//! Structured logging and security-focused trace utilities.
//!
//! Configures the `tracing` ecosystem for the application, supporting
//! multiple output formats and keeping API keys out of log sinks.

use crate::config::LoggingConfig;
use crate::error::Result;
use std::io::Write;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the global tracing subscriber for the application.
///
/// Supports two output formats:
/// - `json`: Structured JSON logs for production ingestion.
/// - `pretty` (default): Human-readable, colorized output for development.
///
/// When `sanitize_keys` is set, every log line passes through [`sanitize`]
/// before reaching stdout, so API keys cannot leak into log sinks.
///
/// Log levels are controlled via the `RUST_LOG` environment variable or
/// the provided `LoggingConfig`.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let json = config.format == "json";
    match (json, config.sanitize_keys) {
        (true, true) => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(|| SanitizingWriter(std::io::stdout())),
                )
                .init();
        }
        (true, false) => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        (false, true) => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(|| SanitizingWriter(std::io::stdout())),
                )
                .init();
        }
        (false, false) => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

/// Writer that scrubs API keys from every buffer before forwarding it.
struct SanitizingWriter<W: Write>(W);

impl<W: Write> Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        let cleaned = sanitize(&text);
        self.0.write_all(cleaned.as_bytes())?;
        // The original buffer is fully consumed even when the cleaned
        // output is a different length.
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0.flush()
    }
}

/// Sanitizes Google API keys out of a log message.
///
/// Generative Language API keys start with `AIza`; any such token is
/// replaced with a placeholder before the string reaches a log sink.
pub fn sanitize(input: &str) -> String {
    let mut result = input.to_string();

    while let Some(pos) = result.find("AIza") {
        let start = pos;
        let end = result[start..]
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
            .map(|i| start + i)
            .unwrap_or(result.len());
        result.replace_range(start..end, "[REDACTED_API_KEY]");
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_api_key() {
        let input = "calling with key AIzaSyD-abc_123XYZ done";
        let cleaned = sanitize(input);
        assert_eq!(cleaned, "calling with key [REDACTED_API_KEY] done");
    }

    #[test]
    fn test_sanitize_quoted_key() {
        let input = r#"{"api_key": "AIzaSyD123"}"#;
        let cleaned = sanitize(input);
        assert!(!cleaned.contains("AIza"));
        assert!(cleaned.contains("[REDACTED_API_KEY]"));
    }

    #[test]
    fn test_sanitize_passthrough() {
        assert_eq!(sanitize("nothing secret here"), "nothing secret here");
    }

    #[test]
    fn test_sanitizing_writer_scrubs_output() {
        let mut sink = Vec::new();
        {
            let mut writer = SanitizingWriter(&mut sink);
            let payload = b"request failed for key AIzaSyD123 after retry";
            assert_eq!(writer.write(payload).unwrap(), payload.len());
        }
        let written = String::from_utf8(sink).unwrap();
        assert_eq!(written, "request failed for key [REDACTED_API_KEY] after retry");
    }
}

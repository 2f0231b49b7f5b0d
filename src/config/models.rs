//! Configuration data structures for the claude2gemini proxy.
//!
//! This module defines the schema for the application settings, including
//! server parameters, Gemini API access, model routing, thinking defaults,
//! and the content cache.

use crate::models::mapping::ModelTargets;
use serde::{Deserialize, Serialize};

/// The root configuration object for the application.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// HTTP server settings (host, port, workers).
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream Gemini API settings.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Claude-to-Gemini model routing targets.
    #[serde(default)]
    pub models: ModelTargets,

    /// Default thinking budgets applied when the client sends none.
    #[serde(default)]
    pub thinking: ThinkingDefaults,

    /// Content cache settings.
    #[serde(default)]
    pub cache: CacheSettings,

    /// Logging and observability settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for the built-in HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The IP address or hostname the server should bind to.
    /// Default: `0.0.0.0`
    #[serde(default = "default_host")]
    pub host: String,

    /// The port number the server should listen on.
    /// Default: `8082`
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of worker threads for the Axum server.
    /// Default: Number of logical CPU cores.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

/// Settings for the upstream Gemini API connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key for the Generative Language API. Usually injected through
    /// `CLAUDE2GEMINI__GEMINI__API_KEY` rather than the config file.
    #[serde(default)]
    pub api_key: String,

    /// Base URL for the Generative Language API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Connection and request timeout in seconds.
    /// Default: `300` (5 minutes)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Maximum number of times to retry failed non-streaming requests.
    /// Default: `3`
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Default thinking budgets per model tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThinkingDefaults {
    /// Budget for big-tier models when the client gives none.
    /// Default: `5000`
    #[serde(default = "default_big_budget")]
    pub big_model_budget: u32,

    /// Budget for small-tier models when the client gives none.
    /// Default: `1000`
    #[serde(default = "default_small_budget")]
    pub small_model_budget: u32,

    /// Whether to enable thinking for requests that never mention it.
    /// Default: `false`
    #[serde(default)]
    pub enable_by_default: bool,
}

/// Settings for the in-process content cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Whether large-content caching is active.
    /// Default: `false`
    #[serde(default)]
    pub enabled: bool,

    /// Minimum content length (chars) before a part is cache-eligible.
    /// Default: `4096`
    #[serde(default = "default_cache_min_chars")]
    pub min_chars: usize,

    /// Entry time-to-live in hours.
    /// Default: `24`
    #[serde(default = "default_cache_ttl_hours")]
    pub ttl_hours: u64,
}

/// Settings for application logging and output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level (`trace`, `debug`, `info`, `warn`, `error`).
    /// Default: `info`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format for logs (`pretty`, `json`, `compact`).
    /// Default: `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Whether to mask API keys in logs.
    /// Default: `true`
    #[serde(default = "default_true")]
    pub sanitize_keys: bool,
}

// Default trait implementations linking to custom logic

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: default_workers(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base_url: default_api_base_url(),
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for ThinkingDefaults {
    fn default() -> Self {
        Self {
            big_model_budget: default_big_budget(),
            small_model_budget: default_small_budget(),
            enable_by_default: false,
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            min_chars: default_cache_min_chars(),
            ttl_hours: default_cache_ttl_hours(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            sanitize_keys: true,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8082
}

fn default_workers() -> usize {
    num_cpus::get()
}

fn default_api_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_timeout() -> u64 {
    300
}

fn default_max_retries() -> u32 {
    3
}

fn default_big_budget() -> u32 {
    5000
}

fn default_small_budget() -> u32 {
    1000
}

fn default_cache_min_chars() -> usize {
    4096
}

fn default_cache_ttl_hours() -> u64 {
    24
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_true() -> bool {
    true
}

// Configuration module

mod models;

pub use models::*;

use crate::error::{ProxyError, Result};
use config::{Config, Environment, File};
use std::path::PathBuf;

impl AppConfig {
    /// Load configuration with precedence:
    /// 1. Environment variables (highest)
    /// 2. Config file
    /// 3. Defaults (lowest)
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let file_path =
            config_path.map(str::to_string).unwrap_or_else(Self::default_config_path);

        let config = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(File::with_name(&file_path).required(config_path.is_some()))
            // e.g. CLAUDE2GEMINI__GEMINI__API_KEY, CLAUDE2GEMINI__SERVER__PORT
            .add_source(
                Environment::with_prefix("CLAUDE2GEMINI")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .map_err(|e| ProxyError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ProxyError::Config(e.to_string()))
    }

    fn default_config_path() -> String {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".claude2gemini")
            .join("config.toml")
            .to_string_lossy()
            .to_string()
    }
}

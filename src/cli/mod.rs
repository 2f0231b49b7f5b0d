// CLI module for claude2gemini

use clap::Parser;

/// claude2gemini - Anthropic Messages API to Google Gemini translation proxy
#[derive(Parser, Debug)]
#[command(name = "claude2gemini", version, about, long_about = None)]
pub struct Args {
    /// Path to a config file (defaults to ~/.claude2gemini/config.toml)
    #[arg(long, short)]
    pub config: Option<String>,
}

// claude2gemini - Anthropic Messages API to Google Gemini translation proxy

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod gemini;
pub mod models;
pub mod server;
pub mod translation;
pub mod utils;

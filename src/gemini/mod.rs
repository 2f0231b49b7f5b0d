//! Backend gateway for the Google Generative Language API.

mod client;
pub mod streaming;

pub use client::GeminiClient;

//! Axum-based HTTP server for the claude2gemini proxy.
//!
//! Accepts Anthropic Messages API requests and bridges them to the Google
//! Generative Language API through the translation engine.
//!
//! # Components
//!
//! - `handlers`: Implementation of individual API endpoints (messages, health).
//! - `middleware`: Request ID tracking layers.
//! - `routes`: The main router configuration that ties everything together.

mod handlers;
mod middleware;
mod routes;

pub use routes::{create_router, AppState};

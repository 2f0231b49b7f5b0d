//! Utility functions and helpers for the claude2gemini proxy.
//!
//! # Submodules
//!
//! - `logging`: Tracing and logging initialization with security filters.
//! - `retry`: Robust retry mechanisms that respect upstream API hints.

pub mod logging;
pub mod retry;

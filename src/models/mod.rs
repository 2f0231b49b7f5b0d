// Wire-format type definitions for both sides of the proxy

pub mod claude;
pub mod gemini;
pub mod mapping;
pub mod streaming;

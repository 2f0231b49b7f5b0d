//! Protocol translation between the Anthropic Messages API and Gemini
//! generateContent, in both directions.

pub mod prompts;
pub mod request;
pub mod response;
pub mod schema;
pub mod streaming;

pub use request::translate_request;
pub use response::translate_response;
pub use streaming::{sse_stream, StreamTranscoder};

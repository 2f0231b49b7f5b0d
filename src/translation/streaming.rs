// Gemini → Claude streaming translation
//
// Consumes an async sequence of generateContent chunks and re-emits the
// Anthropic SSE event sequence. One transcoder instance per streaming call;
// it owns all ordering state for that call and nothing else.
//
// Index discipline: index 0 is reserved for the primary text block for the
// whole stream. Every function call allocates the next strictly-greater
// index and is opened, filled, and closed within the chunk that delivered
// it, which is how parallel tool calls interleaved with text stay
// addressable on the client side.

use crate::error::Result;
use crate::models::claude::Usage;
use crate::models::gemini::{GenerateContentResponse, Part};
use crate::models::streaming::{
    ContentBlockStart, Delta, ErrorData, MessageDeltaData, MessageStart, StreamEvent, DONE_FRAME,
};
use crate::translation::response::{known_stop_reason, new_tool_use_id, wrap_thinking};
use futures::{Stream, StreamExt};
use serde_json::json;
use tracing::{debug, warn};

/// Keep-alive ping cadence, in chunks.
const PING_PERIOD: u64 = 5;

/// Streaming state machine for one call.
pub struct StreamTranscoder {
    message_id: String,
    model: String,
    /// Shared index space for the text block (0) and all tool-call blocks.
    next_block_index: i32,
    /// Reasoning text accumulated until the first regular text arrives.
    reasoning_buffer: String,
    reasoning_flushed: bool,
    /// Cumulative usage snapshot, overwritten per chunk.
    usage: Usage,
    /// Last-write-wins stop reason.
    final_stop_reason: Option<String>,
    chunk_counter: u64,
}

impl StreamTranscoder {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            message_id: format!("msg_{}", uuid::Uuid::new_v4().simple()),
            model: model.into(),
            next_block_index: 0,
            reasoning_buffer: String::new(),
            reasoning_flushed: false,
            usage: Usage::default(),
            final_stop_reason: None,
            chunk_counter: 0,
        }
    }

    /// Events emitted once, before the first backend chunk is read: the
    /// message envelope, the reserved primary text block, and a first ping.
    pub fn start_events(&self) -> Vec<StreamEvent> {
        vec![
            StreamEvent::MessageStart {
                message: MessageStart {
                    id: self.message_id.clone(),
                    message_type: "message".to_string(),
                    role: "assistant".to_string(),
                    content: Vec::new(),
                    model: self.model.clone(),
                    stop_reason: None,
                    stop_sequence: None,
                    usage: Usage::default(),
                },
            },
            StreamEvent::ContentBlockStart {
                index: 0,
                content_block: ContentBlockStart::Text {
                    text: String::new(),
                },
            },
            StreamEvent::Ping,
        ]
    }

    /// Translate one backend chunk into zero or more client events.
    pub fn on_chunk(&mut self, chunk: &GenerateContentResponse) -> Vec<StreamEvent> {
        self.chunk_counter += 1;
        let mut events = Vec::new();

        if let Some(candidate) = chunk.candidates.first() {
            if let Some(content) = &candidate.content {
                for part in &content.parts {
                    self.translate_part(part, &mut events);
                }
            }

            if let Some(reason) = candidate.finish_reason.as_deref() {
                let mapped = known_stop_reason(reason).unwrap_or_else(|| {
                    debug!(reason, "unrecognized finish reason in stream");
                    "end_turn"
                });
                self.final_stop_reason = Some(mapped.to_string());
            }
        }

        // Counts are cumulative-to-date per chunk: overwrite, never add.
        if let Some(metadata) = &chunk.usage_metadata {
            self.usage = Usage {
                input_tokens: metadata.prompt_token_count.unwrap_or(0),
                output_tokens: metadata.candidates_token_count.unwrap_or(0),
                thoughts_token_count: metadata.thoughts_token_count.filter(|&count| count > 0),
            };
        }

        if self.chunk_counter % PING_PERIOD == 0 {
            events.push(StreamEvent::Ping);
        }

        events
    }

    fn translate_part(&mut self, part: &Part, events: &mut Vec<StreamEvent>) {
        match part {
            Part::Text { text, thought, .. } => {
                if text.is_empty() {
                    return;
                }
                if thought.unwrap_or(false) {
                    // No client block type exists for partial reasoning, so
                    // it buffers until the first regular text.
                    self.reasoning_buffer.push_str(text);
                    return;
                }
                self.flush_reasoning(events);
                events.push(StreamEvent::ContentBlockDelta {
                    index: 0,
                    delta: Delta::TextDelta { text: text.clone() },
                });
            }
            Part::FunctionCall { function_call, .. } => {
                self.next_block_index += 1;
                let index = self.next_block_index;

                events.push(StreamEvent::ContentBlockStart {
                    index,
                    content_block: ContentBlockStart::ToolUse {
                        id: new_tool_use_id(),
                        name: function_call.name.clone(),
                        input: json!({}),
                    },
                });

                // The backend delivers complete argument objects per chunk;
                // there is no partial-JSON accumulation.
                let args = &function_call.args;
                if !args.is_null() && *args != json!({}) {
                    let partial_json =
                        serde_json::to_string(args).unwrap_or_else(|_| "{}".to_string());
                    events.push(StreamEvent::ContentBlockDelta {
                        index,
                        delta: Delta::InputJsonDelta { partial_json },
                    });
                }

                events.push(StreamEvent::ContentBlockStop { index });
                self.final_stop_reason = Some("tool_use".to_string());
            }
            other => {
                warn!(?other, "ignoring untranslatable streaming part");
            }
        }
    }

    /// Emit the buffered reasoning as one wrapped delta at index 0, at most
    /// once per stream.
    fn flush_reasoning(&mut self, events: &mut Vec<StreamEvent>) {
        if self.reasoning_flushed || self.reasoning_buffer.is_empty() {
            return;
        }
        events.push(StreamEvent::ContentBlockDelta {
            index: 0,
            delta: Delta::TextDelta {
                text: wrap_thinking(&self.reasoning_buffer),
            },
        });
        self.reasoning_buffer.clear();
        self.reasoning_flushed = true;
    }

    /// Drain events after the backend sequence ends normally.
    ///
    /// A late flush covers the only-reasoning case (e.g. token limit hit
    /// before any regular text). Tool-call blocks were closed individually,
    /// so only the primary text block remains open here.
    pub fn finish_events(&mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        self.flush_reasoning(&mut events);

        events.push(StreamEvent::ContentBlockStop { index: 0 });
        events.push(StreamEvent::MessageDelta {
            delta: MessageDeltaData {
                stop_reason: Some(
                    self.final_stop_reason
                        .clone()
                        .unwrap_or_else(|| "end_turn".to_string()),
                ),
                stop_sequence: None,
            },
            usage: self.usage.clone(),
        });
        events.push(StreamEvent::MessageStop);
        events
    }
}

/// Drive a backend chunk stream through the transcoder, yielding SSE frames.
///
/// A backend error mid-stream becomes a single error event and terminates
/// the sequence without drain events; already-sent frames stand. The stream
/// is pull-based, so dropping it (client disconnect) stops backend reads
/// with it.
pub fn sse_stream<S>(
    mut transcoder: StreamTranscoder,
    backend: S,
) -> impl Stream<Item = String>
where
    S: Stream<Item = Result<GenerateContentResponse>>,
{
    async_stream::stream! {
        for event in transcoder.start_events() {
            yield event.to_sse();
        }

        futures::pin_mut!(backend);
        while let Some(chunk) = backend.next().await {
            match chunk {
                Ok(chunk) => {
                    for event in transcoder.on_chunk(&chunk) {
                        yield event.to_sse();
                    }
                }
                Err(error) => {
                    warn!(%error, "backend stream failed mid-flight");
                    yield StreamEvent::Error {
                        error: ErrorData {
                            error_type: "api_error".to_string(),
                            message: error.to_string(),
                        },
                    }
                    .to_sse();
                    return;
                }
            }
        }

        for event in transcoder.finish_events() {
            yield event.to_sse();
        }
        yield DONE_FRAME.to_string();
    }
}

// Gemini streaming response parsing
//
// The `streamGenerateContent?alt=sse` endpoint delivers one complete JSON
// chunk per SSE data frame. Frames arrive split across arbitrary byte
// boundaries, so bytes accumulate in a buffer and are only decoded once a
// full frame is present; a multi-byte character split across two network
// reads must survive reassembly intact.

use crate::error::{ProxyError, Result};
use crate::models::gemini::GenerateContentResponse;
use bytes::BytesMut;
use futures::stream::Stream;
use serde_json::Value;
use tracing::{debug, warn};

/// Parse an SSE byte stream into generateContent chunks.
///
/// An in-band `{"error": ...}` payload terminates the stream with an error.
pub fn parse_sse_stream<S>(
    byte_stream: S,
) -> impl Stream<Item = Result<GenerateContentResponse>> + Send
where
    S: Stream<Item = reqwest::Result<bytes::Bytes>> + Send + 'static,
{
    use futures::StreamExt;

    async_stream::stream! {
        let mut buffer = BytesMut::new();

        futures::pin_mut!(byte_stream);

        while let Some(chunk_result) = byte_stream.next().await {
            match chunk_result {
                Ok(chunk) => {
                    buffer.extend_from_slice(&chunk);

                    // Complete SSE events end with a blank line; the
                    // delimiter is ASCII, so splitting on it never lands
                    // inside a multi-byte sequence.
                    while let Some(event_end) = find_frame_end(&buffer) {
                        let frame = buffer.split_to(event_end + 2);
                        let event_data = String::from_utf8_lossy(&frame[..event_end]);

                        match parse_sse_event(&event_data) {
                            Some(Ok(response)) => yield Ok(response),
                            Some(Err(error)) => {
                                yield Err(error);
                                return;
                            }
                            None => {}
                        }
                    }
                }
                Err(error) => {
                    warn!(%error, "Gemini byte stream failed");
                    yield Err(ProxyError::Http(error));
                    return;
                }
            }
        }

        // Final event may lack the trailing blank line
        let remainder = String::from_utf8_lossy(&buffer);
        if !remainder.trim().is_empty() {
            if let Some(result) = parse_sse_event(&remainder) {
                yield result;
            }
        }

        debug!("Gemini SSE stream ended");
    }
}

fn find_frame_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|window| window == b"\n\n")
}

/// Parse one SSE event's data payload into a chunk.
///
/// Returns `None` for frames with no data (comments, keep-alives).
fn parse_sse_event(event_data: &str) -> Option<Result<GenerateContentResponse>> {
    let mut data = String::new();
    for line in event_data.lines() {
        if let Some(payload) = line.strip_prefix("data:") {
            data.push_str(payload.trim_start());
        }
    }

    let data = data.trim();
    if data.is_empty() {
        return None;
    }

    // Upstream reports stream-level failures as an in-band error object
    if let Ok(value) = serde_json::from_str::<Value>(data) {
        if let Some(error) = value.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown upstream error");
            return Some(Err(ProxyError::BackendApi(message.to_string())));
        }
    }

    match serde_json::from_str::<GenerateContentResponse>(data) {
        Ok(response) => Some(Ok(response)),
        Err(error) => {
            warn!(%error, "unparseable Gemini SSE chunk");
            None
        }
    }
}

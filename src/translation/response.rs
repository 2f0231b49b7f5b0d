// Gemini → Claude response translation (non-streaming)

use crate::error::{ProxyError, Result};
use crate::models::claude::{ContentBlock, MessagesResponse, Usage};
use crate::models::gemini::{GenerateContentResponse, Part};
use tracing::debug;

/// Map a Gemini finish reason onto the Claude stop-reason vocabulary.
///
/// Returns `None` for unrecognized reasons so call sites can pick their own
/// fallback: non-streaming responses report `stop_sequence`, streams report
/// `end_turn`.
pub(crate) fn known_stop_reason(finish_reason: &str) -> Option<&'static str> {
    match finish_reason {
        "STOP" => Some("end_turn"),
        "MAX_TOKENS" => Some("max_tokens"),
        "TOOL_CODE" => Some("tool_use"),
        _ => None,
    }
}

/// Generate a fresh opaque tool-use block id.
pub(crate) fn new_tool_use_id() -> String {
    format!("toolu_{}", uuid::Uuid::new_v4().simple())
}

/// Wrap buffered reasoning text in its fixed delimiter pair.
///
/// The client protocol has no reasoning block type; thought content is
/// embedded textually instead.
pub(crate) fn wrap_thinking(text: &str) -> String {
    format!("<thinking>\n{}\n</thinking>", text)
}

/// Translate a complete Gemini response into a Messages API response.
pub fn translate_response(
    response: &GenerateContentResponse,
    model: &str,
) -> Result<MessagesResponse> {
    let mut content = Vec::new();
    let mut stop_reason = None;

    if let Some(candidate) = response.candidates.first() {
        let candidate_content = candidate.content.as_ref().ok_or_else(|| {
            ProxyError::Translation("backend candidate carries no content".to_string())
        })?;

        for part in &candidate_content.parts {
            match part {
                Part::Text { text, thought, .. } => {
                    if text.is_empty() {
                        continue;
                    }
                    let text = if thought.unwrap_or(false) {
                        wrap_thinking(text)
                    } else {
                        text.clone()
                    };
                    content.push(ContentBlock::Text {
                        text,
                        thought_signature: None,
                    });
                }
                Part::FunctionCall { function_call, .. } => {
                    content.push(ContentBlock::ToolUse {
                        id: new_tool_use_id(),
                        name: function_call.name.clone(),
                        input: function_call.args.clone(),
                        thought_signature: None,
                    });
                }
                other => {
                    debug!(?other, "ignoring untranslatable response part");
                }
            }
        }

        stop_reason = candidate
            .finish_reason
            .as_deref()
            .map(|reason| known_stop_reason(reason).unwrap_or("stop_sequence").to_string());
    }

    let usage = translate_usage(response);

    let mut client_response = MessagesResponse::new(model.to_string(), content, usage);
    client_response.stop_reason = stop_reason;
    Ok(client_response)
}

/// Copy token counts, reporting reasoning tokens only when strictly positive.
pub(crate) fn translate_usage(response: &GenerateContentResponse) -> Usage {
    let metadata = response.usage_metadata.as_ref();
    Usage {
        input_tokens: metadata.and_then(|m| m.prompt_token_count).unwrap_or(0),
        output_tokens: metadata.and_then(|m| m.candidates_token_count).unwrap_or(0),
        thoughts_token_count: metadata
            .and_then(|m| m.thoughts_token_count)
            .filter(|&count| count > 0),
    }
}

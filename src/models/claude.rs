//! Anthropic Messages API type definitions.
//!
//! Request and response structures for the [Anthropic Messages API](https://docs.anthropic.com/en/api/messages).
//! These types deserialize incoming requests from Claude clients and serialize
//! responses back to them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Anthropic Messages API request structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesRequest {
    /// The model that will complete your prompt.
    pub model: String,

    /// Input messages.
    pub messages: Vec<Message>,

    /// System prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<SystemPrompt>,

    /// The maximum number of tokens to generate before stopping.
    pub max_tokens: u32,

    /// Amount of randomness injected into the response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Use nucleus sampling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Only sample from the top K options for each subsequent token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,

    /// Custom text sequences that will cause the model to stop generating.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,

    /// Definitions of tools that the model may use.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,

    /// How the model should decide which tool to use, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,

    /// Configuration for extended thinking.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking: Option<ThinkingConfig>,

    /// Whether to incrementally stream the response using server-sent events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

/// System prompt can be either a simple string or structured blocks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SystemPrompt {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl SystemPrompt {
    /// Flatten to plain text (the backend has no structured system field)
    pub fn to_text(&self) -> String {
        match self {
            SystemPrompt::Text(s) => s.clone(),
            SystemPrompt::Blocks(blocks) => blocks
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::Text { text, .. } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// A single message in the conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender ("user" or "assistant").
    pub role: String,
    /// The content of the message.
    pub content: MessageContent,
}

/// Message content - can be simple text or structured blocks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

/// Content block types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// A text content block.
    Text {
        text: String,
        /// Opaque reasoning continuation signature, replayed to the backend.
        #[serde(skip_serializing_if = "Option::is_none")]
        thought_signature: Option<String>,
    },
    /// An image content block.
    Image { source: ImageSource },
    /// A tool use request from the model.
    ToolUse {
        id: String,
        name: String,
        input: Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        thought_signature: Option<String>,
    },
    /// Result of a tool execution.
    ToolResult {
        /// The ID of the tool use this result corresponds to.
        tool_use_id: String,
        content: ToolResultContent,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
}

/// Tool result content - can be simple text or structured blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolResultContent {
    /// Simple text result.
    Text(String),
    /// Structured result with multiple blocks.
    Blocks(Vec<ContentBlock>),
}

impl std::fmt::Display for ToolResultContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolResultContent::Text(s) => write!(f, "{}", s),
            ToolResultContent::Blocks(blocks) => {
                let text = blocks
                    .iter()
                    .filter_map(|block| match block {
                        ContentBlock::Text { text, .. } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                write!(f, "{}", text)
            }
        }
    }
}

/// Image source for vision content
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ImageSource {
    #[serde(rename = "base64")]
    Base64 {
        #[serde(skip_serializing_if = "Option::is_none")]
        media_type: Option<String>,
        data: String,
    },
}

/// Tool definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub input_schema: Value, // JSON Schema
}

/// Tool choice directive from the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolChoice {
    /// Model decides whether to call a tool.
    Auto,
    /// Model must call some tool.
    Any,
    /// Model must not call any tool.
    None,
    /// Model must call the named tool.
    Tool { name: String },
}

/// Extended thinking configuration.
///
/// Built once per request from client input or server defaults and never
/// mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThinkingConfig {
    /// Whether thinking is enabled for this request.
    pub enabled: bool,

    /// Explicit token budget for thinking.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<u32>,

    /// Whether thought summaries should be included in the output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_thoughts: Option<bool>,
}

/// Anthropic Messages API response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesResponse {
    /// Unique object identifier.
    pub id: String,

    /// Object type (always "message").
    #[serde(rename = "type")]
    pub response_type: String,

    /// Conversational role of the generated message (always "assistant").
    pub role: String,

    /// Content generated by the model.
    pub content: Vec<ContentBlock>,

    /// The model that handled the request.
    pub model: String,

    /// The reason why the model stopped generating.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,

    /// The sequence that caused the model to stop (if applicable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequence: Option<String>,

    /// Billing and rate-limit usage.
    pub usage: Usage,
}

/// Token usage statistics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Usage {
    /// The number of input tokens which were used.
    pub input_tokens: u32,

    /// The number of output tokens which were used.
    pub output_tokens: u32,

    /// Tokens spent on reasoning. Present only when strictly positive, so
    /// "no reasoning" and "reasoning untracked" stay distinguishable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thoughts_token_count: Option<u32>,
}

impl MessagesResponse {
    /// Create a new response with given content
    pub fn new(model: String, content: Vec<ContentBlock>, usage: Usage) -> Self {
        Self {
            id: format!("msg_{}", uuid::Uuid::new_v4().simple()),
            response_type: "message".to_string(),
            role: "assistant".to_string(),
            content,
            model,
            stop_reason: None,
            stop_sequence: None,
            usage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_flattening() {
        let system = SystemPrompt::Blocks(vec![
            ContentBlock::Text {
                text: "First.".to_string(),
                thought_signature: None,
            },
            ContentBlock::Text {
                text: "Second.".to_string(),
                thought_signature: None,
            },
        ]);
        assert_eq!(system.to_text(), "First.\nSecond.");
    }

    #[test]
    fn test_tool_choice_deserialization() {
        let auto: ToolChoice = serde_json::from_str(r#"{"type":"auto"}"#).unwrap();
        assert!(matches!(auto, ToolChoice::Auto));

        let tool: ToolChoice =
            serde_json::from_str(r#"{"type":"tool","name":"get_weather"}"#).unwrap();
        match tool {
            ToolChoice::Tool { name } => assert_eq!(name, "get_weather"),
            _ => panic!("expected tool variant"),
        }
    }

    #[test]
    fn test_usage_omits_zero_thoughts() {
        let usage = Usage {
            input_tokens: 3,
            output_tokens: 1,
            thoughts_token_count: None,
        };
        let json = serde_json::to_value(&usage).unwrap();
        assert!(json.get("thoughts_token_count").is_none());
    }
}

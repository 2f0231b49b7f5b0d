// Claude → Gemini request translation

use crate::config::ThinkingDefaults;
use crate::error::{ProxyError, Result};
use crate::models::claude::{
    ContentBlock, ImageSource, MessageContent, MessagesRequest, ToolChoice,
};
use crate::models::gemini::{
    Content, FunctionCall, FunctionCallingConfig, FunctionDeclaration, FunctionResponse,
    GenerateContentRequest, GenerationConfig, InlineData, Part, ThinkingConfig, ToolConfig,
    ToolDeclaration,
};
use crate::translation::prompts::{enhance_system_prompt, enhance_tool_description, SYSTEM_ACK};
use crate::translation::schema;
use serde_json::json;
use tracing::{debug, warn};

/// Translate a complete Messages API request into a generateContent request.
///
/// The Gemini protocol has no system-role field, so a system prompt becomes a
/// synthetic leading user/model exchange. Generation parameters are copied
/// sparsely: absent client fields never appear downstream.
pub fn translate_request(
    request: &MessagesRequest,
    thinking_defaults: &ThinkingDefaults,
) -> Result<GenerateContentRequest> {
    let has_tools = request.tools.as_ref().is_some_and(|t| !t.is_empty());

    let mut contents = Vec::with_capacity(request.messages.len() + 2);

    if let Some(system) = &request.system {
        let system_text = enhance_system_prompt(&system.to_text(), has_tools);
        contents.push(Content {
            role: "user".to_string(),
            parts: vec![Part::text(system_text)],
        });
        contents.push(Content {
            role: "model".to_string(),
            parts: vec![Part::text(SYSTEM_ACK)],
        });
    }

    for message in &request.messages {
        let role = match message.role.as_str() {
            "user" => "user",
            "assistant" => "model",
            other => {
                return Err(ProxyError::InvalidRequest(format!(
                    "unsupported message role: {}",
                    other
                )))
            }
        };

        let parts = translate_content(&message.content)?;
        if parts.is_empty() {
            debug!(role, "skipping message with no translatable parts");
            continue;
        }

        contents.push(Content {
            role: role.to_string(),
            parts,
        });
    }

    let tools = request.tools.as_ref().filter(|t| !t.is_empty()).map(|tools| {
        let declarations = tools
            .iter()
            .map(|tool| {
                let description = enhance_tool_description(
                    &tool.name,
                    tool.description.as_deref().unwrap_or(""),
                );
                let parameters = schema::adapt(tool.input_schema.clone());
                let residual = schema::check_adapted(&parameters);
                if !residual.is_empty() {
                    warn!(tool = %tool.name, ?residual, "adapted schema still carries unsupported keywords");
                }
                FunctionDeclaration {
                    name: tool.name.clone(),
                    description,
                    parameters,
                }
            })
            .collect();
        vec![ToolDeclaration {
            function_declarations: declarations,
        }]
    });

    let tool_config = request
        .tool_choice
        .as_ref()
        .filter(|_| has_tools)
        .map(translate_tool_choice);

    let generation_config = build_generation_config(request, thinking_defaults);

    Ok(GenerateContentRequest {
        contents,
        generation_config,
        tools,
        tool_config,
    })
}

/// Map one message's content blocks onto Gemini parts.
fn translate_content(content: &MessageContent) -> Result<Vec<Part>> {
    let blocks = match content {
        MessageContent::Text(text) => {
            if text.is_empty() {
                return Ok(Vec::new());
            }
            return Ok(vec![Part::text(text.clone())]);
        }
        MessageContent::Blocks(blocks) => blocks,
    };

    let mut parts = Vec::with_capacity(blocks.len());
    for block in blocks {
        match block {
            ContentBlock::Text {
                text,
                thought_signature,
            } => {
                if text.is_empty() {
                    continue;
                }
                parts.push(Part::Text {
                    text: text.clone(),
                    thought: None,
                    thought_signature: thought_signature.clone(),
                });
            }
            ContentBlock::Image { source } => {
                let ImageSource::Base64 { media_type, data } = source;
                parts.push(Part::InlineData {
                    inline_data: InlineData {
                        mime_type: media_type
                            .clone()
                            .unwrap_or_else(|| "image/png".to_string()),
                        data: data.clone(),
                    },
                });
            }
            ContentBlock::ToolUse {
                name,
                input,
                thought_signature,
                ..
            } => {
                parts.push(Part::FunctionCall {
                    function_call: FunctionCall {
                        name: name.clone(),
                        args: input.clone(),
                    },
                    thought_signature: thought_signature.clone(),
                });
            }
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => {
                let text = content.to_string();
                let response = if is_error.unwrap_or(false) {
                    json!({ "error": text })
                } else {
                    json!({ "result": text })
                };
                parts.push(Part::FunctionResponse {
                    function_response: FunctionResponse {
                        name: tool_use_id.clone(),
                        response,
                    },
                });
            }
        }
    }
    Ok(parts)
}

/// Map the client tool-choice directive to Gemini's function-calling config.
fn translate_tool_choice(choice: &ToolChoice) -> ToolConfig {
    let config = match choice {
        ToolChoice::Auto => FunctionCallingConfig {
            mode: "AUTO".to_string(),
            allowed_function_names: None,
        },
        ToolChoice::Any => FunctionCallingConfig {
            mode: "ANY".to_string(),
            allowed_function_names: None,
        },
        ToolChoice::None => FunctionCallingConfig {
            mode: "NONE".to_string(),
            allowed_function_names: None,
        },
        // Forcing a single tool: ANY mode restricted to that one name
        ToolChoice::Tool { name } => FunctionCallingConfig {
            mode: "ANY".to_string(),
            allowed_function_names: Some(vec![name.clone()]),
        },
    };
    ToolConfig {
        function_calling_config: config,
    }
}

fn build_generation_config(
    request: &MessagesRequest,
    thinking_defaults: &ThinkingDefaults,
) -> Option<GenerationConfig> {
    let thinking_config = resolve_thinking(request, thinking_defaults);

    let config = GenerationConfig {
        max_output_tokens: Some(request.max_tokens),
        temperature: request.temperature,
        top_p: request.top_p,
        top_k: request.top_k,
        stop_sequences: request.stop_sequences.clone(),
        thinking_config,
    };
    Some(config)
}

/// Resolve the reasoning configuration for this request.
///
/// Explicitly disabled thinking sends nothing. An explicit budget is passed
/// verbatim. Enabled-without-budget selects a tier default by keyword match
/// on the requested model name.
fn resolve_thinking(
    request: &MessagesRequest,
    defaults: &ThinkingDefaults,
) -> Option<ThinkingConfig> {
    let (enabled, budget, include_thoughts) = match &request.thinking {
        Some(config) => (config.enabled, config.budget, config.include_thoughts),
        None => (defaults.enable_by_default, None, None),
    };

    if !enabled {
        return None;
    }

    let budget = budget.unwrap_or_else(|| classify_budget(&request.model, defaults));

    Some(ThinkingConfig {
        // Forwarded only when the client asked for thought output
        include_thoughts: include_thoughts.filter(|&v| v),
        thinking_budget: Some(budget),
    })
}

/// Pick a default thinking budget by model-name tier keywords.
fn classify_budget(model: &str, defaults: &ThinkingDefaults) -> u32 {
    let lower = model.to_lowercase();
    let is_big = ["pro", "opus", "sonnet", "big"]
        .iter()
        .any(|keyword| lower.contains(keyword));
    if is_big {
        defaults.big_model_budget
    } else {
        defaults.small_model_budget
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::claude::{Message, SystemPrompt, ThinkingConfig as ClaudeThinking, Tool};
    use serde_json::json;

    fn base_request() -> MessagesRequest {
        MessagesRequest {
            model: "claude-sonnet-4-5".to_string(),
            messages: vec![Message {
                role: "user".to_string(),
                content: MessageContent::Text("hello".to_string()),
            }],
            system: None,
            max_tokens: 1024,
            temperature: None,
            top_p: None,
            top_k: None,
            stop_sequences: None,
            tools: None,
            tool_choice: None,
            thinking: None,
            stream: None,
        }
    }

    fn defaults() -> ThinkingDefaults {
        ThinkingDefaults::default()
    }

    #[test]
    fn test_system_prompt_becomes_synthetic_exchange() {
        let mut request = base_request();
        request.system = Some(SystemPrompt::Text("Be helpful.".to_string()));

        let gemini = translate_request(&request, &defaults()).unwrap();

        assert_eq!(gemini.contents.len(), 3);
        assert_eq!(gemini.contents[0].role, "user");
        assert!(matches!(&gemini.contents[0].parts[0], Part::Text { text, .. } if text == "Be helpful."));
        assert_eq!(gemini.contents[1].role, "model");
        assert!(matches!(&gemini.contents[1].parts[0], Part::Text { text, .. } if text == SYSTEM_ACK));
    }

    #[test]
    fn test_system_prompt_nudged_when_tools_present() {
        let mut request = base_request();
        request.system = Some(SystemPrompt::Text("Be helpful.".to_string()));
        request.tools = Some(vec![Tool {
            name: "get_weather".to_string(),
            description: Some("Weather lookup".to_string()),
            input_schema: json!({"type": "object"}),
        }]);

        let gemini = translate_request(&request, &defaults()).unwrap();

        match &gemini.contents[0].parts[0] {
            Part::Text { text, .. } => {
                assert!(text.starts_with("Be helpful."));
                assert!(text.contains("CRITICAL TOOL USAGE INSTRUCTIONS"));
            }
            _ => panic!("expected text part"),
        }

        let declaration = &gemini.tools.as_ref().unwrap()[0].function_declarations[0];
        assert!(declaration.description.contains("CRITICAL SEARCH TOOL"));
        assert!(declaration.description.ends_with("Weather lookup"));
    }

    #[test]
    fn test_role_mapping_and_invalid_role() {
        let mut request = base_request();
        request.messages.push(Message {
            role: "assistant".to_string(),
            content: MessageContent::Text("hi".to_string()),
        });

        let gemini = translate_request(&request, &defaults()).unwrap();
        assert_eq!(gemini.contents[1].role, "model");

        request.messages.push(Message {
            role: "system".to_string(),
            content: MessageContent::Text("nope".to_string()),
        });
        assert!(matches!(
            translate_request(&request, &defaults()),
            Err(ProxyError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_tool_result_translation() {
        let mut request = base_request();
        request.messages = vec![Message {
            role: "user".to_string(),
            content: MessageContent::Blocks(vec![ContentBlock::ToolResult {
                tool_use_id: "toolu_abc".to_string(),
                content: crate::models::claude::ToolResultContent::Text("42".to_string()),
                is_error: None,
            }]),
        }];

        let gemini = translate_request(&request, &defaults()).unwrap();
        match &gemini.contents[0].parts[0] {
            Part::FunctionResponse { function_response } => {
                assert_eq!(function_response.name, "toolu_abc");
                assert_eq!(function_response.response, json!({"result": "42"}));
            }
            _ => panic!("expected function response"),
        }
    }

    #[test]
    fn test_tool_result_error_key() {
        let mut request = base_request();
        request.messages = vec![Message {
            role: "user".to_string(),
            content: MessageContent::Blocks(vec![ContentBlock::ToolResult {
                tool_use_id: "toolu_abc".to_string(),
                content: crate::models::claude::ToolResultContent::Text("boom".to_string()),
                is_error: Some(true),
            }]),
        }];

        let gemini = translate_request(&request, &defaults()).unwrap();
        match &gemini.contents[0].parts[0] {
            Part::FunctionResponse { function_response } => {
                assert_eq!(function_response.response, json!({"error": "boom"}));
            }
            _ => panic!("expected function response"),
        }
    }

    #[test]
    fn test_tool_choice_mapping() {
        let named = translate_tool_choice(&ToolChoice::Tool {
            name: "get_weather".to_string(),
        });
        assert_eq!(named.function_calling_config.mode, "ANY");
        assert_eq!(
            named.function_calling_config.allowed_function_names,
            Some(vec!["get_weather".to_string()])
        );

        let none = translate_tool_choice(&ToolChoice::None);
        assert_eq!(none.function_calling_config.mode, "NONE");
        assert!(none.function_calling_config.allowed_function_names.is_none());
    }

    #[test]
    fn test_sparse_generation_config() {
        let request = base_request();
        let gemini = translate_request(&request, &defaults()).unwrap();
        let config = gemini.generation_config.unwrap();

        assert_eq!(config.max_output_tokens, Some(1024));
        assert!(config.temperature.is_none());
        assert!(config.stop_sequences.is_none());
        assert!(config.thinking_config.is_none());
    }

    #[test]
    fn test_thinking_explicit_budget_verbatim() {
        let mut request = base_request();
        request.thinking = Some(ClaudeThinking {
            enabled: true,
            budget: Some(777),
            include_thoughts: Some(true),
        });

        let gemini = translate_request(&request, &defaults()).unwrap();
        let thinking = gemini.generation_config.unwrap().thinking_config.unwrap();
        assert_eq!(thinking.thinking_budget, Some(777));
        assert_eq!(thinking.include_thoughts, Some(true));
    }

    #[test]
    fn test_thinking_budget_classifier() {
        let mut request = base_request();
        request.thinking = Some(ClaudeThinking {
            enabled: true,
            budget: None,
            include_thoughts: None,
        });

        let gemini = translate_request(&request, &defaults()).unwrap();
        let thinking = gemini.generation_config.unwrap().thinking_config.unwrap();
        assert_eq!(thinking.thinking_budget, Some(defaults().big_model_budget));
        // include_thoughts omitted when not explicitly true
        assert!(thinking.include_thoughts.is_none());

        request.model = "claude-3-haiku".to_string();
        let gemini = translate_request(&request, &defaults()).unwrap();
        let thinking = gemini.generation_config.unwrap().thinking_config.unwrap();
        assert_eq!(thinking.thinking_budget, Some(defaults().small_model_budget));
    }

    #[test]
    fn test_thinking_disabled_sends_nothing() {
        let mut request = base_request();
        request.thinking = Some(ClaudeThinking {
            enabled: false,
            budget: Some(500),
            include_thoughts: Some(true),
        });

        let gemini = translate_request(&request, &defaults()).unwrap();
        assert!(gemini.generation_config.unwrap().thinking_config.is_none());
    }

    #[test]
    fn test_signature_propagation() {
        let mut request = base_request();
        request.messages = vec![Message {
            role: "assistant".to_string(),
            content: MessageContent::Blocks(vec![ContentBlock::ToolUse {
                id: "toolu_1".to_string(),
                name: "lookup".to_string(),
                input: json!({"q": "x"}),
                thought_signature: Some("sig123".to_string()),
            }]),
        }];

        let gemini = translate_request(&request, &defaults()).unwrap();
        match &gemini.contents[0].parts[0] {
            Part::FunctionCall {
                thought_signature, ..
            } => assert_eq!(thought_signature.as_deref(), Some("sig123")),
            _ => panic!("expected function call"),
        }
    }

    #[test]
    fn test_empty_message_skipped() {
        let mut request = base_request();
        request.messages.push(Message {
            role: "assistant".to_string(),
            content: MessageContent::Blocks(vec![]),
        });

        let gemini = translate_request(&request, &defaults()).unwrap();
        assert_eq!(gemini.contents.len(), 1);
    }
}

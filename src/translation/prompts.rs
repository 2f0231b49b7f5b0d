// Prompt nudging for tool-happy behavior
//
// Gemini models tend to under-use declared tools compared to Claude. Both the
// system prompt and each tool description get an extra push when tools are in
// play, mirroring what aggressive Claude clients expect from the backend.

/// Fixed model-side acknowledgment used in the synthetic system exchange.
pub const SYSTEM_ACK: &str =
    "Understood. I will follow these instructions and actively use the available tools to complete tasks.";

/// Directive block appended to the system prompt when tools are declared.
const TOOL_USAGE_DIRECTIVES: &str = "\n\n\u{1F680} CRITICAL TOOL USAGE INSTRUCTIONS:\n\
- You MUST be proactive and aggressive in using the available tools\n\
- When you need information, ALWAYS search first - don't guess or assume\n\
- For task management, you MUST use task tracking tools frequently throughout the conversation\n\
- Use search tools extensively when you need current information or documentation\n\
- Don't be \"lazy\" - if a tool can help, USE IT immediately\n\
- Tool usage is not optional - it's required for effective task completion\n\
- When in doubt, use a tool rather than making assumptions\n\n\
REMEMBER: Active tool usage is essential for providing accurate and helpful responses.";

/// Append the tool-usage directive block to a system prompt.
///
/// No-op when the request declares no tools.
pub fn enhance_system_prompt(original: &str, has_tools: bool) -> String {
    if !has_tools {
        return original.to_string();
    }
    format!("{}{}", original, TOOL_USAGE_DIRECTIVES)
}

/// Keyword lists for tool categorization. Order matters below: task tools are
/// checked before file tools since "write" appears in both.
const SEARCH_KEYWORDS: &[&str] = &["search", "fetch", "web", "find", "lookup", "query", "get"];
const TASK_KEYWORDS: &[&str] = &["todo", "task", "plan", "write", "manage", "track"];
const FILE_KEYWORDS: &[&str] = &["file", "read", "write", "edit", "code", "bash", "run", "execute"];
const ANALYSIS_KEYWORDS: &[&str] = &["analyze", "debug", "check", "test", "validate", "inspect"];

fn matches_any(name: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| name.contains(keyword))
}

/// Prefix a tool description with a category-specific usage push.
pub fn enhance_tool_description(tool_name: &str, original: &str) -> String {
    let name = tool_name.to_lowercase();

    let prefix = if matches_any(&name, SEARCH_KEYWORDS) {
        "\u{1F50D} CRITICAL SEARCH TOOL: You MUST use this tool when you need current information or to search for data. "
    } else if matches_any(&name, TASK_KEYWORDS) {
        "\u{1F4CB} REQUIRED TASK TOOL: You are REQUIRED to use this tool for task planning and tracking. Use it frequently throughout the conversation. "
    } else if matches_any(&name, FILE_KEYWORDS) {
        "\u{26A1} ESSENTIAL ACTION TOOL: This tool is essential for completing tasks effectively. Use it proactively when needed. "
    } else if matches_any(&name, ANALYSIS_KEYWORDS) {
        "\u{1F527} IMPORTANT ANALYSIS TOOL: Use this tool to thoroughly analyze and understand the situation before proceeding. "
    } else {
        "\u{1F6E0}\u{FE0F} ACTIVE TOOL USE REQUIRED: You should actively use this tool when appropriate. "
    };

    format!("{}{}", prefix, original)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_untouched_without_tools() {
        assert_eq!(enhance_system_prompt("Be terse.", false), "Be terse.");
    }

    #[test]
    fn test_system_prompt_gets_directives_with_tools() {
        let enhanced = enhance_system_prompt("Be terse.", true);
        assert!(enhanced.starts_with("Be terse."));
        assert!(enhanced.contains("CRITICAL TOOL USAGE INSTRUCTIONS"));
    }

    #[test]
    fn test_search_tool_prefix() {
        let enhanced = enhance_tool_description("WebSearch", "Searches the web.");
        assert!(enhanced.contains("CRITICAL SEARCH TOOL"));
        assert!(enhanced.ends_with("Searches the web."));
    }

    #[test]
    fn test_task_beats_file_for_write_keyword() {
        // "TodoWrite" matches both task ("write") and file ("write") lists;
        // the task category wins.
        let enhanced = enhance_tool_description("TodoWrite", "Tracks tasks.");
        assert!(enhanced.contains("REQUIRED TASK TOOL"));
    }

    #[test]
    fn test_file_tool_prefix() {
        let enhanced = enhance_tool_description("ReadFile", "Reads a file.");
        assert!(enhanced.contains("ESSENTIAL ACTION TOOL"));
    }

    #[test]
    fn test_analysis_tool_prefix() {
        let enhanced = enhance_tool_description("debug_session", "Debugs.");
        assert!(enhanced.contains("IMPORTANT ANALYSIS TOOL"));
    }

    #[test]
    fn test_default_prefix() {
        let enhanced = enhance_tool_description("weather", "Current weather.");
        assert!(enhanced.contains("ACTIVE TOOL USE REQUIRED"));
    }
}

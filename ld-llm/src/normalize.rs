//! Pure transforms from the neutral request shape toward Anthropic's.

use crate::anthropic::AnthropicTool;
use crate::error::{LlmError, Result};
use crate::types::{ChatMessage, Role, ToolDefinition};

/// Split system text out of a conversation.
///
/// Anthropic takes the system prompt as a top-level field. When several
/// system messages are present the last one wins and the earlier ones are
/// dropped. Non-system messages keep their order.
pub fn extract_system_message(messages: &[ChatMessage]) -> (Option<String>, Vec<ChatMessage>) {
    let mut system = None;
    let mut rest = Vec::with_capacity(messages.len());
    for m in messages {
        match m.role {
            Role::System => system = Some(m.content.clone()),
            Role::User | Role::Assistant => rest.push(m.clone()),
        }
    }
    (system, rest)
}

/// Re-envelope canonical tool definitions as Anthropic tools.
///
/// Entries whose `type` is missing or not `"function"` are skipped. A `"function"` entry
/// without a function body cannot be converted and is rejected.
pub fn convert_tools_to_anthropic(tools: &[ToolDefinition]) -> Result<Vec<AnthropicTool>> {
    let mut out = Vec::with_capacity(tools.len());
    for tool in tools {
        if !tool.is_function() {
            tracing::debug!(kind = %tool.kind, "skipping non-function tool");
            continue;
        }
        let Some(func) = tool.function.as_ref() else {
            return Err(LlmError::InvalidInput(
                "tool of type \"function\" is missing its \"function\" body".to_string(),
            ));
        };
        out.push(AnthropicTool {
            name: func.name.clone(),
            description: func.description.clone().unwrap_or_default(),
            input_schema: func
                .parameters
                .clone()
                .unwrap_or_else(|| serde_json::json!({})),
        });
    }
    Ok(out)
}

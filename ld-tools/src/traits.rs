use crate::error::{Result, ToolError};
use async_trait::async_trait;
use ld_llm::ToolDefinition;
use serde_json::Value;

pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters_schema: Value,
}

/// A locally executable function the model may ask for.
#[async_trait]
pub trait Tool: Send + Sync {
    fn spec(&self) -> ToolSpec;
    async fn execute(&self, arguments: Value) -> Result<Value>;
}

/// Canonical `{"type": "function", ...}` definition for a tool.
pub fn to_tool_definition(tool: &dyn Tool) -> ToolDefinition {
    let spec = tool.spec();
    ToolDefinition::function(spec.name, spec.description, spec.parameters_schema)
}

pub(crate) fn optional_string(args: &Value, key: &str) -> Result<Option<String>> {
    let Some(v) = args.get(key) else {
        return Ok(None);
    };
    match v {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        other => Err(ToolError::InvalidArguments(format!(
            "key {key} must be string, got {other}"
        ))),
    }
}

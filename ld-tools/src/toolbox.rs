use crate::error::{Result, ToolError};
use crate::traits::{Tool, to_tool_definition};
use ld_llm::{ToolCall, ToolDefinition};
use serde_json::Value;
use std::sync::Arc;

/// Ordered set of tools the model is offered, dispatched by name.
#[derive(Clone, Default)]
pub struct ToolBox {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, tool: impl Tool + 'static) -> Self {
        self.tools.push(Arc::new(tool));
        self
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| to_tool_definition(t.as_ref())).collect()
    }

    fn find(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.spec().name == name)
    }

    /// Run the tool a model asked for.
    ///
    /// Raw (string) arguments are decoded first; structured ones are used as-is.
    #[tracing::instrument(level = "info", skip_all, fields(tool = %call.name))]
    pub async fn execute(&self, call: &ToolCall) -> Result<Value> {
        let tool = self
            .find(&call.name)
            .ok_or_else(|| ToolError::UnknownTool(call.name.clone()))?;
        let arguments = call
            .arguments
            .decode()
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
        if !arguments.is_object() {
            return Err(ToolError::InvalidArguments(format!(
                "arguments for {} must be a json object, got {arguments}",
                call.name
            )));
        }
        tool.execute(arguments).await
    }
}

use crate::error::{LlmError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One conversation turn. A conversation is an ordered `Vec<ChatMessage>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Tool definition in the canonical (OpenAI-shaped) envelope:
/// `{"type": "function", "function": {"name", "description"?, "parameters"}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<FunctionDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

impl ToolDefinition {
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
    ) -> Self {
        Self {
            kind: "function".to_string(),
            function: Some(FunctionDefinition {
                name: name.into(),
                description: Some(description.into()),
                parameters: Some(parameters),
            }),
        }
    }

    pub fn is_function(&self) -> bool {
        self.kind == "function"
    }
}

/// Per-call knobs. Anything not modelled as a field goes through `extra`
/// and is copied verbatim into the provider request body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Forwarded to OpenAI only; Anthropic requests drop it.
    pub tool_choice: Option<Value>,
    pub extra: Map<String, Value>,
}

impl CompletionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn tool_choice(mut self, tool_choice: impl Into<Value>) -> Self {
        self.tool_choice = Some(tool_choice.into());
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Tool-call arguments as the provider delivered them.
///
/// OpenAI hands back the JSON-encoded string the model produced; Anthropic
/// hands back an already-decoded object. Callers branch on the variant or
/// use [`ToolArguments::decode`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolArguments {
    Raw(String),
    Structured(Value),
}

impl ToolArguments {
    pub fn as_raw(&self) -> Option<&str> {
        match self {
            Self::Raw(s) => Some(s),
            Self::Structured(_) => None,
        }
    }

    pub fn as_structured(&self) -> Option<&Value> {
        match self {
            Self::Raw(_) => None,
            Self::Structured(v) => Some(v),
        }
    }

    /// Parse raw arguments or clone structured ones.
    pub fn decode(&self) -> Result<Value> {
        match self {
            Self::Raw(s) => serde_json::from_str(s).map_err(|e| {
                LlmError::ResponseFormat(format!("tool arguments are not valid json: {e}"))
            }),
            Self::Structured(v) => Ok(v.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCall {
    pub name: String,
    pub arguments: ToolArguments,
}

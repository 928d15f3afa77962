use crate::error::{LlmError, Result};
use crate::sse::decode_sse;
use crate::types::{ChatMessage, CompletionOptions, ToolArguments, ToolCall, ToolDefinition};
use async_trait::async_trait;
use futures_util::Stream;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::pin::Pin;

pub const OPENAI_DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const RESERVED_FIELDS: &[&str] = &[
    "model",
    "messages",
    "tools",
    "temperature",
    "max_tokens",
    "tool_choice",
    "stream",
];

pub type OpenAiChunkStream = Pin<Box<dyn Stream<Item = Result<OpenAiStreamChunk>> + Send>>;

/// The Chat Completions surface the adapter needs.
#[async_trait]
pub trait OpenAiTransport: Send + Sync {
    async fn create(&self, request: &OpenAiChatRequest) -> Result<OpenAiChatResponse>;

    /// Open a streaming request. Chunks arrive in server order; `[DONE]` ends the stream.
    async fn create_stream(&self, request: &OpenAiChatRequest) -> Result<OpenAiChunkStream>;
}

/// Chat Completions request body. Messages and tools already match the
/// neutral shape, so they pass through as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenAiChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OpenAiChatRequest {
    pub fn new(
        model: &str,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        options: &CompletionOptions,
    ) -> Result<Self> {
        if let Some(key) = options
            .extra
            .keys()
            .find(|k| RESERVED_FIELDS.contains(&k.as_str()))
        {
            return Err(LlmError::InvalidInput(format!(
                "extra option {key:?} collides with a typed openai request field"
            )));
        }

        Ok(Self {
            model: model.to_string(),
            messages: messages.to_vec(),
            tools: tools.to_vec(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            tool_choice: options.tool_choice.clone(),
            stream: None,
            extra: options.extra.clone(),
        })
    }

    fn streaming(&self) -> Self {
        let mut req = self.clone();
        req.stream = Some(true);
        req
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAiChatResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAiChoice {
    pub message: OpenAiResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenAiResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAiToolCall {
    #[serde(default)]
    pub id: String,
    pub function: OpenAiFunctionCall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAiFunctionCall {
    pub name: String,
    /// JSON string exactly as the model produced it.
    #[serde(default)]
    pub arguments: String,
}

impl OpenAiChatResponse {
    pub fn first_message(&self) -> Result<&OpenAiResponseMessage> {
        self.choices
            .first()
            .map(|c| &c.message)
            .ok_or_else(|| LlmError::ResponseFormat("openai response missing choices".to_string()))
    }

    /// Content of the first choice; a null content reads as empty text.
    pub fn text(&self) -> Result<&str> {
        Ok(self.first_message()?.content.as_deref().unwrap_or_default())
    }

    /// Tool calls of the first choice, arguments left as raw JSON strings.
    pub fn tool_calls(&self) -> Result<Vec<ToolCall>> {
        let message = self.first_message()?;
        Ok(message
            .tool_calls
            .iter()
            .flatten()
            .map(|tc| ToolCall {
                name: tc.function.name.clone(),
                arguments: ToolArguments::Raw(tc.function.arguments.clone()),
            })
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAiStreamChunk {
    #[serde(default)]
    pub choices: Vec<OpenAiStreamChoice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAiStreamChoice {
    #[serde(default)]
    pub delta: OpenAiDelta,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenAiDelta {
    #[serde(default)]
    pub content: Option<String>,
}

impl OpenAiStreamChunk {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            choices: vec![OpenAiStreamChoice {
                delta: OpenAiDelta {
                    content: Some(content.into()),
                },
            }],
        }
    }

    /// Non-empty content delta of the first choice, if any.
    pub fn delta_text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.delta.content.as_deref())
            .filter(|s| !s.is_empty())
    }
}

/// reqwest-backed Chat Completions transport.
#[derive(Clone)]
pub struct OpenAiHttp {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiHttp {
    pub fn new(http: reqwest::Client, api_key: &str, base_url: Option<&str>) -> Self {
        Self {
            http,
            api_key: api_key.to_string(),
            base_url: base_url
                .unwrap_or(OPENAI_DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn send(&self, request: &OpenAiChatRequest) -> Result<reqwest::Response> {
        let response = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                provider: "openai",
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl OpenAiTransport for OpenAiHttp {
    #[tracing::instrument(level = "info", skip_all, fields(model = %request.model))]
    async fn create(&self, request: &OpenAiChatRequest) -> Result<OpenAiChatResponse> {
        let body = self.send(request).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    #[tracing::instrument(level = "info", skip_all, fields(model = %request.model))]
    async fn create_stream(&self, request: &OpenAiChatRequest) -> Result<OpenAiChunkStream> {
        let response = self.send(&request.streaming()).await?;
        let sse = Box::pin(decode_sse(response.bytes_stream()));

        let chunks = futures_util::stream::unfold(sse, |mut sse| async move {
            let frame = match sse.as_mut().next().await? {
                Ok(frame) => frame,
                Err(e) => return Some((Err(e), sse)),
            };
            if frame.data.trim() == "[DONE]" {
                return None;
            }
            Some((parse_chunk(&frame.data), sse))
        });

        Ok(Box::pin(chunks))
    }
}

fn parse_chunk(data: &str) -> Result<OpenAiStreamChunk> {
    let value: Value = serde_json::from_str(data).map_err(|e| {
        LlmError::StreamParse(format!("openai chunk json error={e} data={data}"))
    })?;
    if let Some(error) = value.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(LlmError::Api {
            provider: "openai",
            message,
        });
    }
    serde_json::from_value(value)
        .map_err(|e| LlmError::StreamParse(format!("openai chunk shape error={e} data={data}")))
}

use crate::error::{LlmError, Result};
use crate::normalize::extract_system_message;
use crate::sse::decode_sse;
use crate::types::{ChatMessage, CompletionOptions, ToolArguments, ToolCall};
use crate::TextStream;
use async_trait::async_trait;
use futures_util::Stream;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::pin::Pin;
use std::task::{Context, Poll};

pub const ANTHROPIC_DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic requires `max_tokens`; this is used when the caller sets none.
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

const RESERVED_FIELDS: &[&str] = &[
    "model",
    "messages",
    "max_tokens",
    "system",
    "tools",
    "temperature",
    "stream",
];

/// The Messages API surface the adapter needs.
#[async_trait]
pub trait AnthropicTransport: Send + Sync {
    async fn create(&self, request: &AnthropicRequest) -> Result<AnthropicResponse>;

    /// Open a streaming request. The returned stream owns the connection.
    async fn stream(&self, request: &AnthropicRequest) -> Result<MessageStream>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnthropicRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<AnthropicTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnthropicRequest {
    /// Build a Messages request from a neutral conversation.
    ///
    /// System messages move to the top-level `system` field (an empty system
    /// text is not sent). `tool_choice` has no counterpart here and is dropped.
    pub fn new(
        model: &str,
        messages: &[ChatMessage],
        tools: Vec<AnthropicTool>,
        options: &CompletionOptions,
    ) -> Result<Self> {
        let (system, messages) = extract_system_message(messages);

        let mut extra = options.extra.clone();
        let dropped_extra = extra.remove("tool_choice").is_some();
        if options.tool_choice.is_some() || dropped_extra {
            tracing::debug!("dropping tool_choice for anthropic request");
        }
        if let Some(key) = extra.keys().find(|k| RESERVED_FIELDS.contains(&k.as_str())) {
            return Err(LlmError::InvalidInput(format!(
                "extra option {key:?} collides with a typed anthropic request field"
            )));
        }

        Ok(Self {
            model: model.to_string(),
            messages,
            max_tokens: options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system: system.filter(|s| !s.is_empty()),
            tools,
            temperature: options.temperature,
            stream: None,
            extra,
        })
    }

    fn streaming(&self) -> Self {
        let mut req = self.clone();
        req.stream = Some(true);
        req
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnthropicTool {
    pub name: String,
    pub description: String,
    /// JSON Schema.
    pub input_schema: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnthropicResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub content: Vec<AnthropicContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnthropicContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    #[serde(other)]
    Other,
}

impl AnthropicResponse {
    /// Text of the first `text` block, skipping any tool or unknown blocks
    /// before it.
    pub fn first_text(&self) -> Result<&str> {
        self.content
            .iter()
            .find_map(|block| match block {
                AnthropicContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .ok_or_else(|| {
                LlmError::ResponseFormat(format!(
                    "anthropic response has no text block among {} content blocks",
                    self.content.len()
                ))
            })
    }

    /// Every `tool_use` block in order, arguments left as decoded JSON.
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.content
            .iter()
            .filter_map(|block| match block {
                AnthropicContentBlock::ToolUse { name, input, .. } => Some(ToolCall {
                    name: name.clone(),
                    arguments: ToolArguments::Structured(input.clone()),
                }),
                _ => None,
            })
            .collect()
    }
}

/// Scoped text stream over one streaming Messages call.
///
/// Closing releases the underlying connection and runs the close hook. It
/// happens exactly once: on exhaustion, on a stream error, on an explicit
/// [`MessageStream::close`], or on drop, whichever comes first.
pub struct MessageStream {
    inner: Option<TextStream>,
    on_close: Option<Box<dyn FnOnce() + Send>>,
}

impl MessageStream {
    pub fn with_close_hook(inner: TextStream, on_close: impl FnOnce() + Send + 'static) -> Self {
        Self {
            inner: Some(inner),
            on_close: Some(Box::new(on_close)),
        }
    }

    pub fn close(&mut self) {
        if self.inner.take().is_some() {
            if let Some(hook) = self.on_close.take() {
                hook();
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }
}

impl Stream for MessageStream {
    type Item = Result<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let Some(inner) = self.inner.as_mut() else {
            return Poll::Ready(None);
        };
        match inner.as_mut().poll_next(cx) {
            Poll::Ready(None) => {
                self.close();
                Poll::Ready(None)
            }
            Poll::Ready(Some(Err(e))) => {
                self.close();
                Poll::Ready(Some(Err(e)))
            }
            other => other,
        }
    }
}

impl Drop for MessageStream {
    fn drop(&mut self) {
        self.close();
    }
}

/// reqwest-backed Messages API transport.
#[derive(Clone)]
pub struct AnthropicHttp {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AnthropicHttp {
    pub fn new(http: reqwest::Client, api_key: &str, base_url: Option<&str>) -> Self {
        Self {
            http,
            api_key: api_key.to_string(),
            base_url: base_url
                .unwrap_or(ANTHROPIC_DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }

    async fn send(&self, request: &AnthropicRequest) -> Result<reqwest::Response> {
        let response = self
            .http
            .post(self.messages_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                provider: "anthropic",
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl AnthropicTransport for AnthropicHttp {
    #[tracing::instrument(level = "info", skip_all, fields(model = %request.model))]
    async fn create(&self, request: &AnthropicRequest) -> Result<AnthropicResponse> {
        let body = self.send(request).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    #[tracing::instrument(level = "info", skip_all, fields(model = %request.model))]
    async fn stream(&self, request: &AnthropicRequest) -> Result<MessageStream> {
        let response = self.send(&request.streaming()).await?;
        let sse = Box::pin(decode_sse(response.bytes_stream()));

        let text = futures_util::stream::unfold(sse, |mut sse| async move {
            loop {
                let frame = match sse.as_mut().next().await? {
                    Ok(frame) => frame,
                    Err(e) => return Some((Err(e), sse)),
                };

                match frame.event.as_str() {
                    "content_block_delta" => {
                        let v: AnthropicContentBlockDelta = match serde_json::from_str(&frame.data)
                        {
                            Ok(v) => v,
                            Err(e) => {
                                return Some((
                                    Err(LlmError::StreamParse(format!(
                                        "anthropic delta json error={e} data={}",
                                        frame.data
                                    ))),
                                    sse,
                                ));
                            }
                        };
                        if let AnthropicDelta::TextDelta { text } = v.delta {
                            if !text.is_empty() {
                                return Some((Ok(text), sse));
                            }
                        }
                    }
                    "error" => {
                        let message = serde_json::from_str::<AnthropicStreamError>(&frame.data)
                            .map(|v| format!("{}: {}", v.error.kind, v.error.message))
                            .unwrap_or(frame.data);
                        return Some((
                            Err(LlmError::Api {
                                provider: "anthropic",
                                message,
                            }),
                            sse,
                        ));
                    }
                    "message_stop" => return None,
                    _ => {}
                }
            }
        });

        Ok(MessageStream::with_close_hook(Box::pin(text), || {
            tracing::debug!("anthropic stream closed");
        }))
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicContentBlockDelta {
    delta: AnthropicDelta,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicDelta {
    TextDelta {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AnthropicStreamError {
    error: AnthropicStreamErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicStreamErrorBody {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    message: String,
}

//! Provider-neutral entry points.
//!
//! Each operation takes the client plus the provider it is expected to be
//! bound to; a mismatch is a configuration error rather than a silent
//! re-route.

use crate::TextStream;
use crate::anthropic::{AnthropicRequest, AnthropicResponse};
use crate::client::LlmClient;
use crate::error::{LlmError, Result};
use crate::normalize::convert_tools_to_anthropic;
use crate::openai::{OpenAiChatRequest, OpenAiChatResponse};
use crate::provider::Provider;
use crate::types::{ChatMessage, CompletionOptions, ToolCall, ToolDefinition};
use futures_util::StreamExt;

/// Native response of a tool-enabled completion.
///
/// Tool-call payloads differ too much between providers to flatten here;
/// use [`extract_tool_calls`] to get the neutral calls.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResponse {
    OpenAI(OpenAiChatResponse),
    Anthropic(AnthropicResponse),
}

impl ToolResponse {
    pub fn provider(&self) -> Provider {
        match self {
            Self::OpenAI(_) => Provider::OpenAI,
            Self::Anthropic(_) => Provider::Anthropic,
        }
    }

    /// The model's text when it answered instead of calling a tool.
    pub fn text(&self) -> Result<&str> {
        match self {
            Self::OpenAI(r) => r.text(),
            Self::Anthropic(r) => r.first_text(),
        }
    }
}

fn mismatch(client: &LlmClient, provider: Provider) -> LlmError {
    LlmError::Configuration(format!(
        "client is bound to {} but provider {provider} was requested",
        client.provider()
    ))
}

#[tracing::instrument(level = "info", skip(client, messages, options), fields(messages = messages.len()))]
pub async fn create_completion(
    client: &LlmClient,
    provider: Provider,
    model: &str,
    messages: &[ChatMessage],
    options: &CompletionOptions,
) -> Result<String> {
    match (client, provider) {
        (LlmClient::OpenAI(t), Provider::OpenAI) => {
            let req = OpenAiChatRequest::new(model, messages, &[], options)?;
            let resp = t.create(&req).await?;
            Ok(resp.text()?.to_string())
        }
        (LlmClient::Anthropic(t), Provider::Anthropic) => {
            let req = AnthropicRequest::new(model, messages, Vec::new(), options)?;
            let resp = t.create(&req).await?;
            Ok(resp.first_text()?.to_string())
        }
        _ => Err(mismatch(client, provider)),
    }
}

/// Stream text fragments in the order the provider emits them.
///
/// The request is sent before this returns. Dropping the stream early
/// releases the connection.
#[tracing::instrument(level = "info", skip(client, messages, options), fields(messages = messages.len()))]
pub async fn create_streaming_completion(
    client: &LlmClient,
    provider: Provider,
    model: &str,
    messages: &[ChatMessage],
    options: &CompletionOptions,
) -> Result<TextStream> {
    match (client, provider) {
        (LlmClient::OpenAI(t), Provider::OpenAI) => {
            let req = OpenAiChatRequest::new(model, messages, &[], options)?;
            let chunks = t.create_stream(&req).await?;
            let text = chunks.filter_map(|chunk| async move {
                match chunk {
                    Ok(c) => c.delta_text().map(|s| Ok(s.to_string())),
                    Err(e) => Some(Err(e)),
                }
            });
            Ok(Box::pin(text))
        }
        (LlmClient::Anthropic(t), Provider::Anthropic) => {
            let req = AnthropicRequest::new(model, messages, Vec::new(), options)?;
            let stream = t.stream(&req).await?;
            Ok(Box::pin(stream))
        }
        _ => Err(mismatch(client, provider)),
    }
}

/// Completion with tools attached; `tools` are in the canonical envelope.
#[tracing::instrument(
    level = "info",
    skip(client, messages, tools, options),
    fields(messages = messages.len(), tools = tools.len())
)]
pub async fn create_completion_with_tools(
    client: &LlmClient,
    provider: Provider,
    model: &str,
    messages: &[ChatMessage],
    tools: &[ToolDefinition],
    options: &CompletionOptions,
) -> Result<ToolResponse> {
    match (client, provider) {
        (LlmClient::OpenAI(t), Provider::OpenAI) => {
            let req = OpenAiChatRequest::new(model, messages, tools, options)?;
            Ok(ToolResponse::OpenAI(t.create(&req).await?))
        }
        (LlmClient::Anthropic(t), Provider::Anthropic) => {
            let tools = convert_tools_to_anthropic(tools)?;
            let req = AnthropicRequest::new(model, messages, tools, options)?;
            Ok(ToolResponse::Anthropic(t.create(&req).await?))
        }
        _ => Err(mismatch(client, provider)),
    }
}

/// Neutral tool calls from a native response, in response order.
///
/// OpenAI arguments come back as [`ToolArguments::Raw`](crate::ToolArguments::Raw)
/// JSON strings, Anthropic arguments as
/// [`ToolArguments::Structured`](crate::ToolArguments::Structured) values.
pub fn extract_tool_calls(response: &ToolResponse, provider: Provider) -> Result<Vec<ToolCall>> {
    match (response, provider) {
        (ToolResponse::OpenAI(r), Provider::OpenAI) => r.tool_calls(),
        (ToolResponse::Anthropic(r), Provider::Anthropic) => Ok(r.tool_calls()),
        _ => Err(LlmError::Configuration(format!(
            "response came from {} but provider {provider} was requested",
            response.provider()
        ))),
    }
}

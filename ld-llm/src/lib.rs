//! Two-provider LLM adapter for the llmdemos collection.
//!
//! One neutral request shape, translated to OpenAI Chat Completions or the
//! Anthropic Messages API and back.

mod adapter;
mod anthropic;
mod client;
mod config;
mod error;
mod normalize;
mod openai;
mod provider;
mod sse;
mod types;

pub mod testing;

use futures_util::Stream;
use std::pin::Pin;

/// Text fragments of a streamed completion, in arrival order.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

pub use adapter::{
    ToolResponse, create_completion, create_completion_with_tools, create_streaming_completion,
    extract_tool_calls,
};
pub use anthropic::{
    ANTHROPIC_DEFAULT_BASE_URL, AnthropicContentBlock, AnthropicHttp, AnthropicRequest,
    AnthropicResponse, AnthropicTool, AnthropicTransport, DEFAULT_MAX_TOKENS, MessageStream,
};
pub use client::{LlmClient, get_client};
pub use config::{
    ANTHROPIC_API_KEY_VAR, ANTHROPIC_BASE_URL_VAR, ANTHROPIC_KEYS_URL, LLM_PROVIDER_VAR,
    LlmConfig, OPENAI_API_KEY_VAR, OPENAI_BASE_URL_VAR, OPENAI_KEYS_URL,
};
pub use error::{LlmError, Result};
pub use normalize::{convert_tools_to_anthropic, extract_system_message};
pub use openai::{
    OPENAI_DEFAULT_BASE_URL, OpenAiChatRequest, OpenAiChatResponse, OpenAiChoice, OpenAiChunkStream,
    OpenAiDelta, OpenAiFunctionCall, OpenAiHttp, OpenAiResponseMessage, OpenAiStreamChoice,
    OpenAiStreamChunk, OpenAiToolCall, OpenAiTransport,
};
pub use provider::{Provider, select_provider};
pub use types::{
    ChatMessage, CompletionOptions, FunctionDefinition, Role, ToolArguments, ToolCall,
    ToolDefinition,
};

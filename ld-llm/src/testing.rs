//! Queue-based fake transports.
//!
//! Each `create`/`stream` call pops the next scripted reply and records the
//! request it was given. Clones share the same queues, so keep one clone for
//! assertions and hand the other to [`LlmClient`](crate::LlmClient).

use crate::anthropic::{AnthropicRequest, AnthropicResponse, AnthropicTransport, MessageStream};
use crate::error::{LlmError, Result};
use crate::openai::{
    OpenAiChatRequest, OpenAiChatResponse, OpenAiChunkStream, OpenAiStreamChunk, OpenAiTransport,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

fn exhausted(what: &str) -> LlmError {
    LlmError::Api {
        provider: "scripted",
        message: format!("no scripted {what} queued"),
    }
}

#[derive(Clone, Default)]
pub struct ScriptedOpenAi {
    responses: Arc<Mutex<VecDeque<OpenAiChatResponse>>>,
    streams: Arc<Mutex<VecDeque<Vec<Result<OpenAiStreamChunk>>>>>,
    requests: Arc<Mutex<Vec<OpenAiChatRequest>>>,
}

impl ScriptedOpenAi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_response(&self, response: OpenAiChatResponse) -> &Self {
        lock(&self.responses).push_back(response);
        self
    }

    pub fn queue_stream(&self, chunks: Vec<OpenAiStreamChunk>) -> &Self {
        lock(&self.streams).push_back(chunks.into_iter().map(Ok).collect());
        self
    }

    /// Queue a stream whose items may include errors.
    pub fn queue_stream_items(&self, items: Vec<Result<OpenAiStreamChunk>>) -> &Self {
        lock(&self.streams).push_back(items);
        self
    }

    pub fn recorded_requests(&self) -> Vec<OpenAiChatRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl OpenAiTransport for ScriptedOpenAi {
    async fn create(&self, request: &OpenAiChatRequest) -> Result<OpenAiChatResponse> {
        lock(&self.requests).push(request.clone());
        lock(&self.responses)
            .pop_front()
            .ok_or_else(|| exhausted("openai response"))
    }

    async fn create_stream(&self, request: &OpenAiChatRequest) -> Result<OpenAiChunkStream> {
        let mut request = request.clone();
        request.stream = Some(true);
        lock(&self.requests).push(request);
        let items = lock(&self.streams)
            .pop_front()
            .ok_or_else(|| exhausted("openai stream"))?;
        Ok(Box::pin(futures_util::stream::iter(items)))
    }
}

#[derive(Clone, Default)]
pub struct ScriptedAnthropic {
    responses: Arc<Mutex<VecDeque<AnthropicResponse>>>,
    streams: Arc<Mutex<VecDeque<Vec<Result<String>>>>>,
    requests: Arc<Mutex<Vec<AnthropicRequest>>>,
    closes: Arc<AtomicUsize>,
}

impl ScriptedAnthropic {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_response(&self, response: AnthropicResponse) -> &Self {
        lock(&self.responses).push_back(response);
        self
    }

    pub fn queue_stream<S: Into<String>>(&self, fragments: Vec<S>) -> &Self {
        lock(&self.streams).push_back(fragments.into_iter().map(|s| Ok(s.into())).collect());
        self
    }

    pub fn queue_stream_items(&self, items: Vec<Result<String>>) -> &Self {
        lock(&self.streams).push_back(items);
        self
    }

    pub fn recorded_requests(&self) -> Vec<AnthropicRequest> {
        lock(&self.requests).clone()
    }

    /// How many scripted streams have been closed so far.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnthropicTransport for ScriptedAnthropic {
    async fn create(&self, request: &AnthropicRequest) -> Result<AnthropicResponse> {
        lock(&self.requests).push(request.clone());
        lock(&self.responses)
            .pop_front()
            .ok_or_else(|| exhausted("anthropic response"))
    }

    async fn stream(&self, request: &AnthropicRequest) -> Result<MessageStream> {
        let mut request = request.clone();
        request.stream = Some(true);
        lock(&self.requests).push(request);
        let items = lock(&self.streams)
            .pop_front()
            .ok_or_else(|| exhausted("anthropic stream"))?;
        let closes = self.closes.clone();
        Ok(MessageStream::with_close_hook(
            Box::pin(futures_util::stream::iter(items)),
            move || {
                closes.fetch_add(1, Ordering::SeqCst);
            },
        ))
    }
}

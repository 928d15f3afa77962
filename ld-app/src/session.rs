//! In-memory conversation for the interactive chat demos.
//!
//! The model is stateless, so every turn resends the whole history.

use crate::config::AppConfig;
use anyhow::Result;
use futures_util::StreamExt;
use ld_llm::{
    ChatMessage, CompletionOptions, LlmClient, create_completion, create_streaming_completion,
};
use std::io::Write;

pub struct Session {
    system_prompt: String,
    history: Vec<ChatMessage>,
}

impl Session {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        let system_prompt = system_prompt.into();
        Self {
            history: vec![ChatMessage::system(system_prompt.clone())],
            system_prompt,
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Drop every turn, keeping the system prompt.
    pub fn reset(&mut self) {
        self.history.clear();
        self.history.push(ChatMessage::system(self.system_prompt.clone()));
    }

    /// Send one user turn and record the reply.
    ///
    /// With `stream` set, fragments are written to `out` as they arrive. A
    /// failed turn leaves the history as it was before the call.
    pub async fn send<W: Write>(
        &mut self,
        client: &LlmClient,
        cfg: &AppConfig,
        input: &str,
        options: &CompletionOptions,
        stream: bool,
        out: &mut W,
    ) -> Result<String> {
        self.history.push(ChatMessage::user(input));
        let reply = if stream {
            self.stream_reply(client, cfg, options, out).await
        } else {
            create_completion(client, cfg.provider, &cfg.model, &self.history, options)
                .await
                .map_err(anyhow::Error::from)
        };

        match reply {
            Ok(text) => {
                self.history.push(ChatMessage::assistant(text.clone()));
                Ok(text)
            }
            Err(e) => {
                self.history.pop();
                Err(e)
            }
        }
    }

    async fn stream_reply<W: Write>(
        &self,
        client: &LlmClient,
        cfg: &AppConfig,
        options: &CompletionOptions,
        out: &mut W,
    ) -> Result<String> {
        let mut fragments =
            create_streaming_completion(client, cfg.provider, &cfg.model, &self.history, options)
                .await?;
        let mut text = String::new();
        while let Some(fragment) = fragments.next().await {
            let fragment = fragment?;
            write!(out, "{fragment}")?;
            out.flush()?;
            text.push_str(&fragment);
        }
        Ok(text)
    }
}

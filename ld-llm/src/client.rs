use crate::anthropic::{AnthropicHttp, AnthropicTransport};
use crate::config::{
    ANTHROPIC_API_KEY_VAR, ANTHROPIC_KEYS_URL, LlmConfig, OPENAI_API_KEY_VAR, OPENAI_KEYS_URL,
};
use crate::error::{LlmError, Result};
use crate::openai::{OpenAiHttp, OpenAiTransport};
use crate::provider::{Provider, select_provider};
use std::fmt;
use std::sync::Arc;

/// Authenticated handle bound to one provider.
///
/// Owned by whoever asked for it; nothing is cached between calls.
#[derive(Clone)]
pub enum LlmClient {
    OpenAI(Arc<dyn OpenAiTransport>),
    Anthropic(Arc<dyn AnthropicTransport>),
}

impl LlmClient {
    pub fn openai(transport: impl OpenAiTransport + 'static) -> Self {
        Self::OpenAI(Arc::new(transport))
    }

    pub fn anthropic(transport: impl AnthropicTransport + 'static) -> Self {
        Self::Anthropic(Arc::new(transport))
    }

    pub fn provider(&self) -> Provider {
        match self {
            Self::OpenAI(_) => Provider::OpenAI,
            Self::Anthropic(_) => Provider::Anthropic,
        }
    }
}

impl fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LlmClient").field(&self.provider()).finish()
    }
}

/// Build a client for `provider`, or for the selected provider when `None`.
///
/// Only reads configuration; no request is sent.
#[tracing::instrument(level = "debug", skip(config))]
pub fn get_client(config: &LlmConfig, provider: Option<Provider>) -> Result<LlmClient> {
    let provider = match provider {
        Some(p) => p,
        None => select_provider(config, None)?,
    };

    match provider {
        Provider::OpenAI => {
            let key = config
                .openai_api_key
                .as_deref()
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| LlmError::missing_credential(OPENAI_API_KEY_VAR, OPENAI_KEYS_URL))?;
            Ok(LlmClient::openai(OpenAiHttp::new(
                http_client(),
                key,
                config.openai_base_url.as_deref(),
            )))
        }
        Provider::Anthropic => {
            let key = config
                .anthropic_api_key
                .as_deref()
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| {
                    LlmError::missing_credential(ANTHROPIC_API_KEY_VAR, ANTHROPIC_KEYS_URL)
                })?;
            Ok(LlmClient::anthropic(AnthropicHttp::new(
                http_client(),
                key,
                config.anthropic_base_url.as_deref(),
            )))
        }
    }
}

fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(60))
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(%e, "reqwest client build failed; falling back to default client");
            reqwest::Client::new()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_anthropic_key_is_named() {
        let config = LlmConfig::default()
            .with_provider("anthropic")
            .with_openai_key("sk-openai");
        let err = get_client(&config, None).expect_err("missing key");
        assert!(err.is_configuration());
        let msg = err.to_string();
        assert!(msg.contains("ANTHROPIC_API_KEY"), "{msg}");
        assert!(!msg.contains("OPENAI_API_KEY"), "{msg}");
    }

    #[test]
    fn missing_openai_key_is_named_for_explicit_provider() {
        let config = LlmConfig::default().with_anthropic_key("sk-ant");
        let err = get_client(&config, Some(Provider::OpenAI)).expect_err("missing key");
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn client_follows_selection_when_provider_omitted() {
        let config = LlmConfig::default()
            .with_openai_key("sk-openai")
            .with_anthropic_key("sk-ant");
        let client = get_client(&config, None).expect("client");
        assert_eq!(client.provider(), Provider::Anthropic);

        let client = get_client(&config, Some(Provider::OpenAI)).expect("client");
        assert_eq!(client.provider(), Provider::OpenAI);
    }

    #[test]
    fn whitespace_only_key_counts_as_missing() {
        let config = LlmConfig::default()
            .with_openai_key("sk-openai")
            .with_anthropic_key("   ");
        let client = get_client(&config, None).expect("client");
        assert_eq!(client.provider(), Provider::OpenAI);

        let err = get_client(&config, Some(Provider::Anthropic)).expect_err("blank key");
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn selection_errors_surface_from_get_client() {
        let err = get_client(&LlmConfig::default(), None).expect_err("no keys");
        assert!(err.is_configuration());
    }
}

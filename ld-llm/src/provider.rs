use crate::config::{ANTHROPIC_KEYS_URL, LLM_PROVIDER_VAR, LlmConfig, OPENAI_KEYS_URL};
use crate::error::{LlmError, Result};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    OpenAI,
    Anthropic,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Anthropic => "anthropic",
        }
    }

    /// Model the demos use when none is given on the command line.
    pub fn default_model(self) -> &'static str {
        match self {
            Self::OpenAI => "gpt-4o-mini",
            Self::Anthropic => "claude-haiku-4-5",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            other => Err(LlmError::Configuration(format!(
                "invalid provider: {other:?}. Must be 'openai' or 'anthropic'"
            ))),
        }
    }
}

/// Resolve which provider to talk to.
///
/// Precedence: caller override, then `LLM_PROVIDER`, then whichever
/// credential is present. With both credentials present Anthropic wins.
#[tracing::instrument(level = "debug", skip(config))]
pub fn select_provider(config: &LlmConfig, override_: Option<&str>) -> Result<Provider> {
    if let Some(name) = override_ {
        let provider = name.parse()?;
        tracing::debug!(%provider, "provider from caller override");
        return Ok(provider);
    }

    if let Some(name) = config.provider.as_deref().filter(|s| !s.trim().is_empty()) {
        let provider = name.parse::<Provider>().map_err(|_| {
            LlmError::Configuration(format!(
                "invalid {LLM_PROVIDER_VAR}: {name:?}. Must be 'openai' or 'anthropic'"
            ))
        })?;
        tracing::debug!(%provider, "provider from LLM_PROVIDER");
        return Ok(provider);
    }

    let provider = match (config.has_openai_key(), config.has_anthropic_key()) {
        (_, true) => Provider::Anthropic,
        (true, false) => Provider::OpenAI,
        (false, false) => {
            return Err(LlmError::Configuration(format!(
                "No API keys found. Please set either ANTHROPIC_API_KEY or OPENAI_API_KEY \
                 in your .env file.\nGet keys from:\n- OpenAI: {OPENAI_KEYS_URL}\n- Anthropic: {ANTHROPIC_KEYS_URL}"
            )));
        }
    };
    tracing::debug!(%provider, "provider from available credentials");
    Ok(provider)
}

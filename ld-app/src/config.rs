//! Runtime settings for the demo binary.
//!
//! Environment (and `.env`) supplies credentials; the command line may pin
//! the provider and model.

use anyhow::Result;
use ld_llm::{LlmClient, LlmConfig, Provider, get_client, select_provider};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub provider: Provider,
    pub model: String,
}

impl AppConfig {
    pub fn resolve(
        llm: LlmConfig,
        provider_override: Option<&str>,
        model: Option<String>,
    ) -> Result<Self> {
        let provider = select_provider(&llm, provider_override)?;
        let model = model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| provider.default_model().to_string());
        Ok(Self {
            llm,
            provider,
            model,
        })
    }

    pub fn client(&self) -> Result<LlmClient> {
        Ok(get_client(&self.llm, Some(self.provider))?)
    }
}

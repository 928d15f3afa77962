//! Explicit adapter configuration.
//!
//! Provider selection and client construction take a `&LlmConfig` instead of
//! reading the process environment, so tests can build one by hand.

pub const LLM_PROVIDER_VAR: &str = "LLM_PROVIDER";
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const ANTHROPIC_API_KEY_VAR: &str = "ANTHROPIC_API_KEY";
pub const OPENAI_BASE_URL_VAR: &str = "OPENAI_BASE_URL";
pub const ANTHROPIC_BASE_URL_VAR: &str = "ANTHROPIC_BASE_URL";

pub const OPENAI_KEYS_URL: &str = "https://platform.openai.com/api-keys";
pub const ANTHROPIC_KEYS_URL: &str = "https://console.anthropic.com/settings/keys";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LlmConfig {
    /// Explicit provider name, validated at selection time.
    pub provider: Option<String>,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub anthropic_base_url: Option<String>,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).and_then(non_empty);
        Self {
            provider: get(LLM_PROVIDER_VAR),
            openai_api_key: get(OPENAI_API_KEY_VAR),
            anthropic_api_key: get(ANTHROPIC_API_KEY_VAR),
            openai_base_url: get(OPENAI_BASE_URL_VAR),
            anthropic_base_url: get(ANTHROPIC_BASE_URL_VAR),
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_openai_key(mut self, key: impl Into<String>) -> Self {
        self.openai_api_key = Some(key.into());
        self
    }

    pub fn with_anthropic_key(mut self, key: impl Into<String>) -> Self {
        self.anthropic_api_key = Some(key.into());
        self
    }

    pub fn with_openai_base_url(mut self, url: impl Into<String>) -> Self {
        self.openai_base_url = Some(url.into());
        self
    }

    pub fn with_anthropic_base_url(mut self, url: impl Into<String>) -> Self {
        self.anthropic_base_url = Some(url.into());
        self
    }

    pub(crate) fn has_openai_key(&self) -> bool {
        self.openai_api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    pub(crate) fn has_anthropic_key(&self) -> bool {
        self.anthropic_api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }
}

fn non_empty(v: String) -> Option<String> {
    if v.trim().is_empty() { None } else { Some(v) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn lookup_treats_empty_values_as_unset() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (LLM_PROVIDER_VAR, ""),
            (OPENAI_API_KEY_VAR, "sk-test"),
            (ANTHROPIC_API_KEY_VAR, "   "),
        ]);
        let cfg = LlmConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.provider, None);
        assert_eq!(cfg.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(cfg.anthropic_api_key, None);
        assert!(cfg.has_openai_key());
        assert!(!cfg.has_anthropic_key());
    }

    #[test]
    fn lookup_reads_base_url_overrides() {
        let cfg = LlmConfig::from_lookup(|k| match k {
            OPENAI_BASE_URL_VAR => Some("http://127.0.0.1:9000/v1".to_string()),
            _ => None,
        });
        assert_eq!(
            cfg.openai_base_url.as_deref(),
            Some("http://127.0.0.1:9000/v1")
        );
        assert_eq!(cfg.anthropic_base_url, None);
    }
}

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LlmError>;

#[derive(Debug, Error)]
pub enum LlmError {
    /// Missing or invalid provider selection, credential, or provider/client pairing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A neutral request that cannot be expressed in the provider's wire shape.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The provider answered with a non-success status.
    #[error("{provider} returned status={status} body={body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    /// The provider reported an error inside an otherwise successful stream.
    #[error("{provider} stream error: {message}")]
    Api {
        provider: &'static str,
        message: String,
    },

    /// Network-level failure surfaced by reqwest, passed through untouched.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response format: {0}")]
    ResponseFormat(String),

    #[error("stream parse error: {0}")]
    StreamParse(String),
}

impl LlmError {
    pub(crate) fn missing_credential(var: &str, url: &str) -> Self {
        Self::Configuration(format!("{var} not found. Get one from: {url}"))
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(e: serde_json::Error) -> Self {
        Self::ResponseFormat(e.to_string())
    }
}

//! Model configuration for chat-completion calls.

use crate::error_handler::{ConfigError, Result};

/// Configuration for one chat-completion endpoint.
///
/// # Fields
///
/// - `model`: The model identifier sent in the request body.
/// - `endpoint`: Base URL of the inference service; `/v1/chat/completions`
///   is appended by the client.
/// - `api_key`: Optional bearer token for authenticated endpoints.
/// - `timeout_secs`: Optional per-request timeout in seconds.
#[derive(Debug, Clone)]
pub struct LlmModelConfig {
    /// Model identifier string (e.g., `"gpt-4o-mini"`).
    pub model: String,

    /// Inference endpoint base URL.
    pub endpoint: String,

    /// Optional API key for authentication.
    pub api_key: Option<String>,

    /// Optional request timeout (in seconds).
    pub timeout_secs: Option<u64>,
}

impl LlmModelConfig {
    /// Builds a config from environment variables.
    ///
    /// Reads `LLM_ENDPOINT` and `LLM_MODEL` (required), `LLM_API_KEY` and
    /// `LLM_TIMEOUT_SECS` (optional).
    ///
    /// # Errors
    /// - [`ConfigError::MissingVar`] when a required variable is absent/empty.
    /// - [`ConfigError::InvalidNumber`] when `LLM_TIMEOUT_SECS` is not a `u64`.
    pub fn from_env() -> Result<Self> {
        let endpoint = crate::error_handler::must_env("LLM_ENDPOINT")?;
        let model = crate::error_handler::must_env("LLM_MODEL")?;
        let api_key = std::env::var("LLM_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let timeout_secs = match std::env::var("LLM_TIMEOUT_SECS") {
            Ok(v) if !v.trim().is_empty() => {
                Some(v.parse::<u64>().map_err(|_| ConfigError::InvalidNumber {
                    var: "LLM_TIMEOUT_SECS",
                    reason: "expected u64",
                })?)
            }
            _ => None,
        };

        Ok(Self {
            model,
            endpoint,
            api_key,
            timeout_secs,
        })
    }
}

//! Chat-completion service for an OpenAI-shaped endpoint.
//!
//! Minimal, non-streaming client around one REST call:
//! - POST {endpoint}/v1/chat/completions
//!
//! Constructor validation:
//! - `cfg.model` must be non-empty
//! - `cfg.endpoint` must start with http:// or https://
//!
//! Retry policy (bounded, linear backoff, no jitter):
//! - at most [`MAX_ATTEMPTS`] attempts total
//! - HTTP 429 → wait `attempt * 30s` and retry
//! - HTTP 413 → fail fast (oversized payloads are not transient)
//! - any other non-2xx or a transport failure → wait `attempt * 10s` and retry
//!
//! Errors are normalized via the unified types in `error_handler`.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::LlmModelConfig;
use crate::error_handler::{AiLlmError, ConfigError, Result, make_snippet, validate_http_endpoint};
use crate::retry::{Attempt, run_with_retry};

/// Total attempts per completion call (first try included).
pub const MAX_ATTEMPTS: u32 = 3;

/// Base backoff for HTTP 429, scaled by the attempt number.
pub const RATE_LIMIT_BACKOFF_SECS: u64 = 30;

/// Base backoff for other transient failures, scaled by the attempt number.
pub const ERROR_BACKOFF_SECS: u64 = 10;

/// How a single HTTP status steers the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 2xx; stop and parse the body.
    Success,
    /// Permanent failure; no further attempts.
    FailFast,
    /// Transient failure; wait this long before the next attempt.
    Transient(Duration),
}

/// Maps an HTTP status and the 1-based attempt number onto a retry decision.
pub fn classify_status(status: u16, attempt: u32) -> StatusClass {
    match status {
        200..=299 => StatusClass::Success,
        413 => StatusClass::FailFast,
        429 => StatusClass::Transient(Duration::from_secs(
            u64::from(attempt) * RATE_LIMIT_BACKOFF_SECS,
        )),
        _ => StatusClass::Transient(Duration::from_secs(u64::from(attempt) * ERROR_BACKOFF_SECS)),
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// The reply contract is `choices[0].message.content`; further choices are
/// ignored and a content-less first choice counts as malformed.
fn extract_content(parsed: ChatCompletionResponse) -> Option<String> {
    parsed.choices.into_iter().next()?.message.content
}

/// Thin client for a chat-completion endpoint.
///
/// Constructed from a complete [`LlmModelConfig`]. Internally keeps a
/// preconfigured `reqwest::Client` (timeout and default headers).
#[derive(Debug)]
pub struct ChatService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_chat: String,
}

impl ChatService {
    /// Creates a new [`ChatService`] from the given config.
    ///
    /// # Errors
    /// - [`AiLlmError::Config`] with `EmptyModel` if the model name is empty
    /// - [`AiLlmError::Config`] with `InvalidFormat` if the endpoint scheme is invalid
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self> {
        if cfg.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel.into());
        }
        validate_http_endpoint("LLM_ENDPOINT", cfg.endpoint.trim())?;

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(120));

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        if let Some(key) = &cfg.api_key {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {key}")).map_err(|_| {
                    ConfigError::InvalidFormat {
                        var: "LLM_API_KEY",
                        reason: "not a valid header value",
                    }
                })?,
            );
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let url_chat = format!(
            "{}/v1/chat/completions",
            cfg.endpoint.trim().trim_end_matches('/')
        );

        info!(
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = cfg.timeout_secs.unwrap_or(120),
            "ChatService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_chat,
        })
    }

    /// Performs a non-streaming chat completion with the retry policy above.
    ///
    /// The prompt becomes a single `user` message; the reply is
    /// `choices[0].message.content` as plain text.
    ///
    /// # Errors
    /// - [`AiLlmError::PayloadTooLarge`] for HTTP 413 (never retried)
    /// - [`AiLlmError::Malformed`] for non-JSON or missing-field bodies
    /// - [`AiLlmError::RetriesExhausted`] after [`MAX_ATTEMPTS`] failures
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let started = Instant::now();

        let out = run_with_retry(MAX_ATTEMPTS, |attempt| self.attempt_once(attempt, prompt)).await;

        match &out {
            Ok(reply) => info!(
                model = %self.cfg.model,
                reply_len = reply.len(),
                latency_ms = started.elapsed().as_millis(),
                "chat completion completed"
            ),
            Err(e) => error!(
                model = %self.cfg.model,
                latency_ms = started.elapsed().as_millis(),
                "chat completion failed: {e}"
            ),
        }
        out
    }

    async fn attempt_once(&self, attempt: u32, prompt: &str) -> Attempt<String> {
        let body = ChatCompletionRequest {
            model: &self.cfg.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        debug!(
            attempt,
            model = %self.cfg.model,
            prompt_len = prompt.len(),
            "POST {}", self.url_chat
        );

        let resp = match self.client.post(&self.url_chat).json(&body).send().await {
            Ok(r) => r,
            // Transport failures (DNS/connect/reset/timeout) get the generic
            // transient backoff, same as an unknown HTTP status.
            Err(e) => {
                return Attempt::RetryAfter {
                    delay: Duration::from_secs(u64::from(attempt) * ERROR_BACKOFF_SECS),
                    error: e.into(),
                };
            }
        };

        let status = resp.status().as_u16();
        match classify_status(status, attempt) {
            StatusClass::Success => match resp.json::<ChatCompletionResponse>().await {
                Ok(parsed) => match extract_content(parsed) {
                    Some(content) => Attempt::Done(content),
                    None => Attempt::FailFast(AiLlmError::Malformed(
                        "expected `choices[0].message.content`".to_string(),
                    )),
                },
                Err(e) => Attempt::FailFast(AiLlmError::Malformed(format!("serde error: {e}"))),
            },
            StatusClass::FailFast => Attempt::FailFast(AiLlmError::PayloadTooLarge),
            StatusClass::Transient(delay) => {
                let error = if status == 429 {
                    AiLlmError::RateLimited
                } else {
                    let snippet = make_snippet(&resp.text().await.unwrap_or_default());
                    AiLlmError::HttpStatus {
                        status,
                        url: self.url_chat.clone(),
                        snippet,
                    }
                };
                Attempt::RetryAfter { delay, error }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_too_large_is_never_retried() {
        for attempt in 1..=MAX_ATTEMPTS {
            assert_eq!(classify_status(413, attempt), StatusClass::FailFast);
        }
    }

    #[test]
    fn rate_limit_backoff_scales_with_attempt() {
        assert_eq!(
            classify_status(429, 1),
            StatusClass::Transient(Duration::from_secs(30))
        );
        assert_eq!(
            classify_status(429, 2),
            StatusClass::Transient(Duration::from_secs(60))
        );
    }

    #[test]
    fn other_errors_use_shorter_backoff() {
        assert_eq!(
            classify_status(500, 1),
            StatusClass::Transient(Duration::from_secs(10))
        );
        assert_eq!(
            classify_status(404, 3),
            StatusClass::Transient(Duration::from_secs(30))
        );
    }

    #[test]
    fn success_statuses_stop_the_loop() {
        assert_eq!(classify_status(200, 1), StatusClass::Success);
        assert_eq!(classify_status(201, 2), StatusClass::Success);
    }

    #[test]
    fn only_the_first_choice_carries_the_reply() {
        let parsed = ChatCompletionResponse {
            choices: vec![
                ChatChoice {
                    message: ChatChoiceMessage { content: None },
                },
                ChatChoice {
                    message: ChatChoiceMessage {
                        content: Some("ignored".to_string()),
                    },
                },
            ],
        };
        assert_eq!(extract_content(parsed), None);

        let parsed = ChatCompletionResponse {
            choices: vec![ChatChoice {
                message: ChatChoiceMessage {
                    content: Some("reply".to_string()),
                },
            }],
        };
        assert_eq!(extract_content(parsed), Some("reply".to_string()));
    }

    #[test]
    fn rejects_bad_endpoint_and_empty_model() {
        let bad = LlmModelConfig {
            model: "m".into(),
            endpoint: "ftp://nope".into(),
            api_key: None,
            timeout_secs: None,
        };
        assert!(ChatService::new(bad).is_err());

        let empty = LlmModelConfig {
            model: "  ".into(),
            endpoint: "https://ok".into(),
            api_key: None,
            timeout_secs: None,
        };
        assert!(ChatService::new(empty).is_err());
    }
}

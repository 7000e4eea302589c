//! Shared LLM client used by the bump-review pipeline.
//!
//! Scope is intentionally small:
//! - One provider shape: an OpenAI-style `/v1/chat/completions` endpoint.
//! - Unified error type ([`AiLlmError`]) for config, transport, and protocol
//!   failures.
//! - A generic bounded-retry utility with linear backoff, driven by a status
//!   classification so the policy stays testable without a network.
//!
//! No streaming, no embeddings, no provider routing; callers that need a
//! different backend add a new service module rather than growing this one.

pub mod config;
pub mod error_handler;
pub mod retry;
pub mod service;

pub use config::LlmModelConfig;
pub use error_handler::{AiLlmError, ConfigError, Result};
pub use service::ChatService;

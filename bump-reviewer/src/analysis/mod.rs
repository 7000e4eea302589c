//! AI analysis: prompt assembly and verdict interpretation.
//!
//! The inference call itself lives in `ai-llm-service`; this module owns the
//! deterministic text around it — building the prompt from diff artifacts and
//! turning the free-text reply (or its absence) into a closed [`Verdict`].

pub mod prompt;
pub mod verdict;

pub use prompt::{FileSection, build_analysis_prompt};
pub use verdict::{Verdict, fallback_verdict, parse_reply};

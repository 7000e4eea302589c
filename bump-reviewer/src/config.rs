//! Env-driven run configuration.
//!
//! Everything the pipeline needs arrives through the CI job environment:
//! commit refs, the PR coordinates, and the inference endpoint settings.
//! The GitHub token itself is consumed by the `gh` CLI directly
//! (`GH_TOKEN`/`GITHUB_TOKEN`), so it is deliberately not held here.

use std::path::PathBuf;

use ai_llm_service::LlmModelConfig;

use crate::errors::{BumpResult, ConfigError};

/// Immutable configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Base commit of the PR (state before the bot's bump).
    pub base_sha: String,
    /// Head commit of the PR (state with the bump applied).
    pub head_sha: String,
    /// Repository slug, `owner/name`.
    pub repo: String,
    /// Pull request number the verdict is attached to.
    pub pr_number: u64,
    /// Root of the checked-out repository (defaults to the current directory).
    pub repo_root: PathBuf,
    /// Scratch directory root for per-run artifacts.
    pub workdir_root: PathBuf,
    /// Inference endpoint settings.
    pub llm: LlmModelConfig,
}

impl RunConfig {
    /// Builds the config from environment variables.
    ///
    /// Required: `BUMP_BASE_SHA`, `BUMP_HEAD_SHA`, `GITHUB_REPOSITORY`,
    /// `PR_NUMBER`, plus the `LLM_*` variables read by
    /// [`LlmModelConfig::from_env`]. Optional: `BUMP_REPO_ROOT` (defaults to
    /// `.`) and `BUMP_WORKDIR` (defaults to `bump-analysis`).
    ///
    /// # Errors
    /// Typed config errors for missing/invalid variables, reported before any
    /// pipeline stage runs.
    pub fn from_env() -> BumpResult<Self> {
        let base_sha = must_env("BUMP_BASE_SHA")?;
        let head_sha = must_env("BUMP_HEAD_SHA")?;
        let repo = must_env("GITHUB_REPOSITORY")?;
        let pr_number = must_env("PR_NUMBER")?
            .parse::<u64>()
            .map_err(|_| ConfigError::Invalid {
                var: "PR_NUMBER",
                reason: "expected a positive integer",
            })?;
        let repo_root = std::env::var("BUMP_REPO_ROOT")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let workdir_root = std::env::var("BUMP_WORKDIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("bump-analysis"));

        let llm = LlmModelConfig::from_env()?;

        Ok(Self {
            base_sha,
            head_sha,
            repo,
            pr_number,
            repo_root,
            workdir_root,
            llm,
        })
    }
}

fn must_env(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingVar(name)),
    }
}

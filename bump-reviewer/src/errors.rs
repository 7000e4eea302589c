//! Crate-wide error hierarchy for bump-reviewer.
//!
//! Goals:
//! - Single root `Error` for all public functions.
//! - Fatal pipeline conditions (no chart changed, no version bump) are
//!   distinct variants so the binary can exit non-zero with a clear line.
//! - No dynamic dispatch, ergonomic `?` via `From` impls.

use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type BumpResult<T> = Result<T, Error>;

/// Root error type for the bump-reviewer crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Bump detection failures (git metadata, Chart.yaml parsing).
    #[error(transparent)]
    Context(#[from] ContextError),

    /// Chart retrieval/extraction failures.
    #[error(transparent)]
    Chart(#[from] ChartError),

    /// External tool invocation failures.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// PR comment / label delivery failures.
    #[error(transparent)]
    Publish(#[from] PublishError),

    /// Configuration problems (missing env vars, bad PR number, etc.).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Inference client failure that was not absorbed by fallback labeling.
    #[error(transparent)]
    Llm(#[from] ai_llm_service::AiLlmError),

    /// Filesystem failure in the working directory tree.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing/serialization failure.
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Input validation errors.
    #[error("validation error: {0}")]
    Validation(String),
}

/// Errors while resolving the run context from git metadata.
#[derive(Debug, Error)]
pub enum ContextError {
    /// The diff between base and head touched no chart manifest. Fatal.
    #[error("no chart directory changed between base and head")]
    NoChartChanged,

    /// Chart manifest changed, but no dependency version differs. Fatal;
    /// should never happen given the upstream bot's behavior.
    #[error("no dependency version change found in chart '{chart}'")]
    NoVersionBump { chart: String },

    /// Chart.yaml could not be read at the given revision/path.
    #[error("chart manifest unavailable: {0}")]
    ManifestUnavailable(String),

    /// The changed dependency declares no repository, so the old version
    /// cannot be fetched.
    #[error("dependency '{0}' declares no repository")]
    MissingRepository(String),
}

/// Errors while retrieving or unpacking chart archives.
#[derive(Debug, Error)]
pub enum ChartError {
    /// The bot-fetched new-chart tarball is not where the convention says.
    #[error("new chart archive not found at {0}")]
    ArchiveMissing(String),

    /// `helm pull` of the old chart version failed (network/auth).
    /// Recoverable: the caller decides whether to continue without it.
    #[error("failed to pull {dependency} {version}: {detail}")]
    PullFailed {
        dependency: String,
        version: String,
        detail: String,
    },

    /// The extracted archive does not contain the expected chart directory.
    #[error("unexpected archive layout: {0}")]
    BadArchive(String),
}

/// Errors from spawning or running external tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The binary could not be started at all (missing from the CI image).
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool ran and exited non-zero where zero was required.
    #[error("{program} exited with status {status}: {stderr}")]
    NonZero {
        program: String,
        status: i32,
        stderr: String,
    },
}

/// Errors while delivering the report or labels to the PR.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to post PR comment: {0}")]
    Comment(String),

    #[error("failed to apply label '{label}': {detail}")]
    Label { label: String, detail: String },
}

/// Configuration and setup errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("invalid value in {var}: {reason}")]
    Invalid {
        var: &'static str,
        reason: &'static str,
    },
}

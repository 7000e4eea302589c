//! Subprocess seam for external tools.
//!
//! Every shell-out in the pipeline goes through [`CommandRunner`], so tests
//! can substitute scripted fakes for `git`/`helm`/`dyff`/`gh` without touching
//! a real toolchain. Plain `async fn` in the trait, generic dispatch at call
//! sites; no `async-trait`, no `Box<dyn ...>`.

use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::errors::{BumpResult, ToolError};

/// A fully described invocation of one external binary. Every tool runs in
/// the process cwd; paths are passed as absolute arguments instead.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Program name as found on `PATH`.
    pub program: String,
    /// Arguments, already split.
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Captured result of one invocation. The exit status is carried as data;
/// interpreting non-zero as an error is up to the caller, since several tools
/// (dyff, gh) use non-zero statuses as signals rather than failures.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// Converts a non-zero exit into a typed error, for call sites where the
    /// tool has no meaningful non-zero signal.
    pub fn require_success(self, program: &str) -> BumpResult<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(ToolError::NonZero {
                program: program.to_string(),
                status: self.status,
                stderr: self.stderr.trim().to_string(),
            }
            .into())
        }
    }
}

/// Narrow execution interface implemented by [`ProcessRunner`] in production
/// and by scripted fakes in tests.
pub trait CommandRunner {
    /// Runs the command to completion, capturing stdout/stderr.
    ///
    /// `Err` is reserved for spawn-level failures (binary missing); a tool
    /// that runs and exits non-zero is an `Ok` with a non-zero status.
    async fn run(&self, spec: CommandSpec) -> BumpResult<CommandOutput>;
}

/// Production runner backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    async fn run(&self, spec: CommandSpec) -> BumpResult<CommandOutput> {
        debug!(program = %spec.program, args = ?spec.args, "exec");

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args).stdin(Stdio::null());

        let out = cmd.output().await.map_err(|e| ToolError::Spawn {
            program: spec.program.clone(),
            source: e,
        })?;

        Ok(CommandOutput {
            status: out.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        })
    }
}

//! Structural YAML diffing via `dyff`.

use std::path::Path;

use crate::errors::{BumpResult, ToolError};
use crate::exec::{CommandRunner, CommandSpec};

#[derive(Debug, Clone, Copy)]
pub struct DyffCli<'r, R> {
    runner: &'r R,
}

impl<'r, R: CommandRunner> DyffCli<'r, R> {
    pub fn new(runner: &'r R) -> Self {
        Self { runner }
    }

    /// Structural diff of two YAML documents.
    ///
    /// Returns the human-readable diff text, or an empty string when the
    /// documents are structurally identical. With `--set-exit-code` dyff
    /// exits 0 for "no differences" and 1 for "differences found"; anything
    /// else is a real tool failure.
    pub async fn between(&self, old: &Path, new: &Path) -> BumpResult<String> {
        let old = old.to_string_lossy();
        let new = new.to_string_lossy();
        let out = self
            .runner
            .run(CommandSpec::new(
                "dyff",
                &[
                    "between",
                    "--omit-header",
                    "--set-exit-code",
                    &old,
                    &new,
                ],
            ))
            .await?;

        match out.status {
            0 => Ok(String::new()),
            1 => Ok(out.stdout),
            s => Err(ToolError::NonZero {
                program: "dyff".to_string(),
                status: s,
                stderr: out.stderr.trim().to_string(),
            }
            .into()),
        }
    }
}

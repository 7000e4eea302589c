//! GitHub operations via the `gh` CLI.
//!
//! Auth is delegated to the CLI (`GH_TOKEN`/`GITHUB_TOKEN` in the job env).
//! Exit statuses are surfaced as data; ensure-style semantics (tolerating
//! already-satisfied preconditions) live in the publish layer.

use std::path::Path;

use crate::errors::BumpResult;
use crate::exec::{CommandOutput, CommandRunner, CommandSpec};

#[derive(Debug, Clone, Copy)]
pub struct GhCli<'r, R> {
    runner: &'r R,
}

impl<'r, R: CommandRunner> GhCli<'r, R> {
    pub fn new(runner: &'r R) -> Self {
        Self { runner }
    }

    /// Creates a repository label. "Already exists" is the dominant outcome,
    /// so callers treat any failure as best-effort.
    pub async fn create_label(
        &self,
        repo: &str,
        name: &str,
        color: &str,
        description: &str,
    ) -> BumpResult<CommandOutput> {
        self.runner
            .run(CommandSpec::new(
                "gh",
                &[
                    "label",
                    "create",
                    name,
                    "--repo",
                    repo,
                    "--color",
                    color,
                    "--description",
                    description,
                ],
            ))
            .await
    }

    /// Adds a label to a pull request.
    pub async fn add_label(
        &self,
        repo: &str,
        pr_number: u64,
        label: &str,
    ) -> BumpResult<CommandOutput> {
        let pr = pr_number.to_string();
        self.runner
            .run(CommandSpec::new(
                "gh",
                &["pr", "edit", &pr, "--repo", repo, "--add-label", label],
            ))
            .await
    }

    /// Removes a label from a pull request.
    pub async fn remove_label(
        &self,
        repo: &str,
        pr_number: u64,
        label: &str,
    ) -> BumpResult<CommandOutput> {
        let pr = pr_number.to_string();
        self.runner
            .run(CommandSpec::new(
                "gh",
                &["pr", "edit", &pr, "--repo", repo, "--remove-label", label],
            ))
            .await
    }

    /// Posts a new PR comment from a file. Always a new comment; the
    /// pipeline has no update-in-place semantics.
    pub async fn comment_from_file(
        &self,
        repo: &str,
        pr_number: u64,
        body_file: &Path,
    ) -> BumpResult<CommandOutput> {
        let pr = pr_number.to_string();
        let body = body_file.to_string_lossy();
        self.runner
            .run(CommandSpec::new(
                "gh",
                &[
                    "pr",
                    "comment",
                    &pr,
                    "--repo",
                    repo,
                    "--body-file",
                    &body,
                ],
            ))
            .await
    }
}

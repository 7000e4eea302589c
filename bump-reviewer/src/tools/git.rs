//! Git metadata access (`git diff`, `git show`).

use crate::errors::BumpResult;
use crate::exec::{CommandRunner, CommandSpec};

#[derive(Debug, Clone, Copy)]
pub struct GitCli<'r, R> {
    runner: &'r R,
}

impl<'r, R: CommandRunner> GitCli<'r, R> {
    pub fn new(runner: &'r R) -> Self {
        Self { runner }
    }

    /// Paths changed between two commits (`git diff --name-only base head`).
    pub async fn changed_files(&self, base: &str, head: &str) -> BumpResult<Vec<String>> {
        let out = self
            .runner
            .run(CommandSpec::new(
                "git",
                &["diff", "--name-only", base, head],
            ))
            .await?
            .require_success("git")?;

        Ok(out
            .stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// File content at a revision (`git show <rev>:<path>`).
    pub async fn show_file(&self, rev: &str, path: &str) -> BumpResult<String> {
        let spec = format!("{rev}:{path}");
        let out = self
            .runner
            .run(CommandSpec::new("git", &["show", &spec]))
            .await?
            .require_success("git")?;
        Ok(out.stdout)
    }
}

//! Helm operations: pulling published chart versions and rendering templates.

use std::path::Path;

use crate::errors::BumpResult;
use crate::exec::{CommandOutput, CommandRunner, CommandSpec};

#[derive(Debug, Clone, Copy)]
pub struct HelmCli<'r, R> {
    runner: &'r R,
}

impl<'r, R: CommandRunner> HelmCli<'r, R> {
    pub fn new(runner: &'r R) -> Self {
        Self { runner }
    }

    /// Pulls a chart version from a classic repository index and untars it
    /// into `dest`. The exit status is returned as data: a failed pull is a
    /// recoverable condition for the caller, not a pipeline abort.
    pub async fn pull_classic(
        &self,
        chart: &str,
        repo_url: &str,
        version: &str,
        dest: &Path,
    ) -> BumpResult<CommandOutput> {
        let dest = dest.to_string_lossy();
        self.runner
            .run(CommandSpec::new(
                "helm",
                &[
                    "pull", chart, "--repo", repo_url, "--version", version, "--untar",
                    "--untardir", &dest,
                ],
            ))
            .await
    }

    /// Pulls a chart version from an OCI registry and untars it into `dest`.
    pub async fn pull_oci(
        &self,
        oci_ref: &str,
        version: &str,
        dest: &Path,
    ) -> BumpResult<CommandOutput> {
        let dest = dest.to_string_lossy();
        self.runner
            .run(CommandSpec::new(
                "helm",
                &[
                    "pull", oci_ref, "--version", version, "--untar", "--untardir", &dest,
                ],
            ))
            .await
    }

    /// Renders chart templates with one values overlay. Non-zero exits are
    /// returned as data so the caller can keep the stderr as a validation
    /// diagnostic and continue with the next overlay.
    pub async fn template(
        &self,
        release: &str,
        chart_dir: &Path,
        values_file: &Path,
    ) -> BumpResult<CommandOutput> {
        let chart = chart_dir.to_string_lossy();
        let values = values_file.to_string_lossy();
        self.runner
            .run(CommandSpec::new(
                "helm",
                &["template", release, &chart, "-f", &values],
            ))
            .await
    }
}

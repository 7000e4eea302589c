//! Run context: which chart, which dependency, which versions.
//!
//! Built once from git metadata at the start of the run and passed by
//! reference through every stage; nothing downstream mutates it.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::errors::{BumpResult, ContextError};
use crate::exec::CommandRunner;
use crate::tools::GitCli;

/// Charts live under a fixed two-level path keyed by chart name.
const CHARTS_ROOT: &str = "charts";

/// Immutable context for one bump-review run.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Parent chart name (`charts/<name>`).
    pub chart_name: String,
    /// Parent chart directory in the checked-out worktree.
    pub chart_dir: PathBuf,
    /// The bumped sub-chart dependency.
    pub dependency: String,
    /// Version before the bump.
    pub old_version: String,
    /// Version after the bump.
    pub new_version: String,
    /// Declared repository of the dependency (OCI or classic index URL).
    pub repository: String,
    /// Per-run scratch directory.
    pub workdir: PathBuf,
}

impl RunContext {
    pub fn new_templates_dir(&self) -> PathBuf {
        self.workdir.join("new_templates")
    }
    pub fn old_templates_dir(&self) -> PathBuf {
        self.workdir.join("old_templates")
    }
    pub fn diff_outputs_dir(&self) -> PathBuf {
        self.workdir.join("diff_outputs")
    }
}

/// `Chart.yaml` as far as this pipeline cares about it.
#[derive(Debug, Deserialize)]
pub struct ChartManifest {
    #[serde(default)]
    pub dependencies: Vec<ChartDependency>,
}

/// One entry of a chart's `dependencies:` list.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartDependency {
    pub name: String,
    pub version: String,
    pub repository: Option<String>,
}

/// Resolves the run context from PR git metadata.
///
/// Diffs the commit range for a changed `charts/<name>/Chart.yaml`, then
/// compares the manifest's dependency list between base and head to find the
/// bumped entry.
///
/// # Errors
/// - [`ContextError::NoChartChanged`] when the range touches no chart manifest.
/// - [`ContextError::NoVersionBump`] when no dependency version differs.
/// - [`ContextError::MissingRepository`] when the bumped entry has no repository.
pub async fn detect<R: CommandRunner>(
    runner: &R,
    base_sha: &str,
    head_sha: &str,
    repo_root: &Path,
    workdir_root: &Path,
) -> BumpResult<RunContext> {
    let git = GitCli::new(runner);

    let changed = git.changed_files(base_sha, head_sha).await?;
    let manifest_path = changed
        .iter()
        .find_map(|p| chart_name_of_manifest(p).map(|name| (name, p.clone())))
        .ok_or(ContextError::NoChartChanged)?;
    let (chart_name, manifest_rel) = manifest_path;
    debug!(chart = %chart_name, path = %manifest_rel, "chart manifest changed");

    let base_manifest: ChartManifest =
        serde_yaml::from_str(&git.show_file(base_sha, &manifest_rel).await?)?;
    let head_raw = std::fs::read_to_string(repo_root.join(&manifest_rel))
        .map_err(|e| ContextError::ManifestUnavailable(format!("{manifest_rel}: {e}")))?;
    let head_manifest: ChartManifest = serde_yaml::from_str(&head_raw)?;

    let (dependency, old_version, new_version, repository) =
        find_bumped_dependency(&base_manifest, &head_manifest)
            .ok_or_else(|| ContextError::NoVersionBump {
                chart: chart_name.clone(),
            })?;

    let repository = repository.ok_or_else(|| ContextError::MissingRepository(dependency.clone()))?;

    let workdir = workdir_root.join(&chart_name);
    for sub in ["new_templates", "old_templates", "diff_outputs"] {
        std::fs::create_dir_all(workdir.join(sub))?;
    }

    Ok(RunContext {
        chart_dir: repo_root.join(CHARTS_ROOT).join(&chart_name),
        chart_name,
        dependency,
        old_version,
        new_version,
        repository,
        workdir,
    })
}

/// Extracts the chart name from a `charts/<name>/Chart.yaml` path.
fn chart_name_of_manifest(path: &str) -> Option<String> {
    let mut parts = path.split('/');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(CHARTS_ROOT), Some(name), Some("Chart.yaml"), None) => Some(name.to_string()),
        _ => None,
    }
}

/// Finds the dependency whose pinned version differs between base and head.
fn find_bumped_dependency(
    base: &ChartManifest,
    head: &ChartManifest,
) -> Option<(String, String, String, Option<String>)> {
    for new_dep in &head.dependencies {
        if let Some(old_dep) = base.dependencies.iter().find(|d| d.name == new_dep.name) {
            if old_dep.version != new_dep.version {
                return Some((
                    new_dep.name.clone(),
                    old_dep.version.clone(),
                    new_dep.version.clone(),
                    new_dep.repository.clone(),
                ));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(yaml: &str) -> ChartManifest {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn manifest_path_must_match_convention() {
        assert_eq!(
            chart_name_of_manifest("charts/app/Chart.yaml"),
            Some("app".to_string())
        );
        assert_eq!(chart_name_of_manifest("charts/app/values.yaml"), None);
        assert_eq!(chart_name_of_manifest("charts/a/b/Chart.yaml"), None);
        assert_eq!(chart_name_of_manifest("other/app/Chart.yaml"), None);
    }

    #[test]
    fn detects_the_bumped_dependency() {
        let base = manifest(
            "dependencies:\n  - name: redis\n    version: 1.2.3\n    repository: https://charts.example.com\n  - name: postgres\n    version: 9.0.0\n    repository: https://charts.example.com\n",
        );
        let head = manifest(
            "dependencies:\n  - name: redis\n    version: 1.2.4\n    repository: https://charts.example.com\n  - name: postgres\n    version: 9.0.0\n    repository: https://charts.example.com\n",
        );

        let (name, old, new, repo) = find_bumped_dependency(&base, &head).unwrap();
        assert_eq!(name, "redis");
        assert_eq!(old, "1.2.3");
        assert_eq!(new, "1.2.4");
        assert_eq!(repo.as_deref(), Some("https://charts.example.com"));
    }

    #[test]
    fn identical_dependency_lists_yield_nothing() {
        let base = manifest("dependencies:\n  - name: redis\n    version: 1.2.3\n");
        let head = manifest("dependencies:\n  - name: redis\n    version: 1.2.3\n");
        assert!(find_bumped_dependency(&base, &head).is_none());
    }
}

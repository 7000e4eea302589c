//! Template rendering and validation capture.
//!
//! Each custom values overlay is rendered against a chart version with
//! `helm template`. A failed render never aborts the batch: the stderr text
//! is kept as a validation diagnostic and feeds the report, the AI prompt,
//! and fallback labeling.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::BumpResult;
use crate::exec::CommandRunner;
use crate::tools::HelmCli;
use crate::values;

/// Result of rendering one values overlay against one chart version.
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    /// The overlay that was rendered.
    pub values_file: PathBuf,
    /// Rendered manifest path; `None` when rendering failed.
    pub manifest: Option<PathBuf>,
    /// Validation diagnostic text; empty when the render was clean.
    pub diagnostic: String,
}

impl RenderOutcome {
    pub fn is_clean(&self) -> bool {
        self.diagnostic.is_empty()
    }
}

/// Renders every overlay against one chart version, writing manifests under
/// `out_dir`. Continues past per-file failures.
pub async fn render_all<R: CommandRunner>(
    runner: &R,
    release: &str,
    chart_dir: &Path,
    values_files: &[PathBuf],
    out_dir: &Path,
) -> BumpResult<Vec<RenderOutcome>> {
    let helm = HelmCli::new(runner);
    let mut outcomes = Vec::with_capacity(values_files.len());

    for file in values_files {
        let out = helm.template(release, chart_dir, file).await?;
        let outcome = if out.success() {
            let manifest = out_dir.join(format!("{}.yaml", values::slug(file)));
            std::fs::write(&manifest, &out.stdout)?;
            RenderOutcome {
                values_file: file.clone(),
                manifest: Some(manifest),
                diagnostic: String::new(),
            }
        } else {
            debug!(
                file = %file.display(),
                chart = %chart_dir.display(),
                "render failed; diagnostic recorded"
            );
            RenderOutcome {
                values_file: file.clone(),
                manifest: None,
                diagnostic: out.stderr.trim().to_string(),
            }
        };
        outcomes.push(outcome);
    }

    Ok(outcomes)
}

//! Structural diffs between the old and new chart versions.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::BumpResult;
use crate::exec::CommandRunner;
use crate::render::RenderOutcome;
use crate::tools::DyffCli;
use crate::values;

/// Fixed note used when one side of a comparison is unavailable. Counts as a
/// difference for gating purposes: an incomparable pair must not short-circuit
/// the run as safe.
pub const COMPARISON_UNAVAILABLE: &str = "(comparison unavailable: one side failed to materialize)";

/// One manifest comparison, keyed by the overlay it came from.
#[derive(Debug, Clone)]
pub struct ManifestDiff {
    pub values_file: PathBuf,
    /// Diff text; empty means structurally identical.
    pub text: String,
}

impl ManifestDiff {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Diffs the default values of the two chart versions, writing the output to
/// `diff_outputs/default_values.diff`. `None` for the old side yields the
/// fixed unavailability note.
pub async fn diff_default_values<R: CommandRunner>(
    runner: &R,
    old_values: Option<&Path>,
    new_values: &Path,
    diff_outputs: &Path,
) -> BumpResult<String> {
    let text = match old_values {
        Some(old) => DyffCli::new(runner).between(old, new_values).await?,
        None => COMPARISON_UNAVAILABLE.to_string(),
    };
    std::fs::write(diff_outputs.join("default_values.diff"), &text)?;
    debug!(len = text.len(), "defaults diff computed");
    Ok(text)
}

/// Diffs rendered manifests pairwise per overlay. Pairs where either render
/// failed produce the unavailability note instead of a dyff run.
pub async fn diff_manifests<R: CommandRunner>(
    runner: &R,
    old_renders: &[RenderOutcome],
    new_renders: &[RenderOutcome],
    diff_outputs: &Path,
) -> BumpResult<Vec<ManifestDiff>> {
    let dyff = DyffCli::new(runner);
    let mut diffs = Vec::with_capacity(new_renders.len());

    for new in new_renders {
        let old_manifest = old_renders
            .iter()
            .find(|o| o.values_file == new.values_file)
            .and_then(|o| o.manifest.as_deref());

        let text = match (old_manifest, new.manifest.as_deref()) {
            (Some(old), Some(new_path)) => dyff.between(old, new_path).await?,
            _ => COMPARISON_UNAVAILABLE.to_string(),
        };

        let out_path = diff_outputs.join(format!("{}.diff", values::slug(&new.values_file)));
        std::fs::write(&out_path, &text)?;

        diffs.push(ManifestDiff {
            values_file: new.values_file.clone(),
            text,
        });
    }

    Ok(diffs)
}

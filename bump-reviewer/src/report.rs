//! Markdown report assembly.
//!
//! One document per run, posted as a single PR comment: version transition,
//! per-overlay collapsible sections, the chart-defaults diff, and either the
//! AI analysis text or a fixed unavailability notice with the fallback
//! verdict.

use crate::analysis::{FileSection, Verdict};
use crate::context::RunContext;

/// How the analysis section of the report is filled in.
#[derive(Debug, Clone)]
pub enum AnalysisSection<'a> {
    /// The diff gate short-circuited; no analysis was requested.
    Skipped,
    /// The model replied; embed its report verbatim.
    Text(&'a str),
    /// The call failed or the reply was unusable; note the fallback.
    Unavailable { fallback: Verdict },
}

/// Builds the full report for the normal path.
pub fn build_report(
    ctx: &RunContext,
    defaults_diff: &str,
    files: &[FileSection],
    analysis: &AnalysisSection<'_>,
) -> String {
    let mut s = String::new();
    s.push_str(&format!(
        "## Dependency bump: `{}` {} → {}\n\n",
        ctx.dependency, ctx.old_version, ctx.new_version
    ));
    s.push_str(&format!(
        "Chart `{}` — automated analysis of the `{}` sub-chart update.\n",
        ctx.chart_name, ctx.dependency
    ));

    s.push_str("\n<details>\n<summary>Default values diff</summary>\n\n```diff\n");
    s.push_str(if defaults_diff.trim().is_empty() {
        "(no differences)"
    } else {
        defaults_diff
    });
    s.push_str("\n```\n\n</details>\n");

    for f in files {
        s.push_str(&format!(
            "\n<details>\n<summary>Overlay `{}`</summary>\n\n",
            f.name
        ));
        if f.diagnostic.is_empty() {
            s.push_str("Validation: ✅ rendered cleanly\n");
        } else {
            s.push_str("Validation: ❌ errors\n\n```\n");
            s.push_str(&f.diagnostic);
            s.push_str("\n```\n");
        }
        if f.manifest_diff.trim().is_empty() {
            s.push_str("\nManifest diff: no differences\n");
        } else {
            s.push_str("\nManifest diff:\n\n```diff\n");
            s.push_str(&f.manifest_diff);
            s.push_str("\n```\n");
        }
        s.push_str("\n</details>\n");
    }

    s.push_str("\n## Analysis\n\n");
    match analysis {
        AnalysisSection::Skipped => {
            s.push_str("**SAFE TO MERGE** — no differences in default values or rendered manifests; AI analysis skipped.\n");
        }
        AnalysisSection::Text(text) => {
            s.push_str(text);
            s.push('\n');
        }
        AnalysisSection::Unavailable { fallback } => {
            s.push_str(&format!(
                "_AI analysis unavailable._ Fallback verdict based on validation results: `{}`.\n",
                fallback.label()
            ));
        }
    }
    s
}

/// Minimal report for the diff-gate short-circuit.
pub fn build_safe_report(ctx: &RunContext) -> String {
    build_report(ctx, "", &[], &AnalysisSection::Skipped)
}

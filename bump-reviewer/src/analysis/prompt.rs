//! Prompt assembly for the bump analysis.
//!
//! Deterministic text: fixed preamble, interpolated versions, embedded diff
//! artifacts, per-overlay excerpts, and closing formatting instructions that
//! pin the reply to one of three literal `LABEL:` lines.

use crate::context::RunContext;

/// Per-overlay material for the prompt and the report.
#[derive(Debug, Clone)]
pub struct FileSection {
    /// Overlay file name (not the full path).
    pub name: String,
    /// Filtered sub-tree for the bumped dependency; `None` when the overlay
    /// has no such section.
    pub subtree: Option<String>,
    /// Validation diagnostic from rendering the new chart; empty when clean.
    pub diagnostic: String,
    /// Structural diff of the rendered manifests; empty when identical.
    pub manifest_diff: String,
}

/// Builds the analysis prompt.
pub fn build_analysis_prompt(
    ctx: &RunContext,
    defaults_diff: &str,
    files: &[FileSection],
) -> String {
    let mut s = String::new();
    s.push_str("You are a Helm chart upgrade reviewer.\n");
    s.push_str(&format!(
        "The dependency `{}` of chart `{}` was bumped from {} to {} by an automated update bot.\n",
        ctx.dependency, ctx.chart_name, ctx.old_version, ctx.new_version
    ));
    s.push_str("Decide whether this bump breaks any of the configuration overlays below.\n");

    s.push_str("\n# Rules\n");
    s.push_str("- A change is breaking when a previously valid overlay stops rendering or changes its deployed behavior in an incompatible way (renamed/removed values, changed defaults that overlays rely on, removed resources).\n");
    s.push_str("- Version-only or cosmetic changes (labels, checksums, image tags following the bump) are safe.\n");
    s.push_str("- When the evidence is insufficient to decide, say so rather than guessing.\n");

    s.push_str("\n# Default values diff (old vs new chart)\n```diff\n");
    s.push_str(if defaults_diff.trim().is_empty() {
        "(no differences)"
    } else {
        defaults_diff
    });
    s.push_str("\n```\n");

    for f in files {
        s.push_str(&format!("\n# Overlay `{}`\n", f.name));
        match &f.subtree {
            Some(tree) => {
                s.push_str(&format!(
                    "Configuration for `{}` in this overlay:\n```yaml\n",
                    ctx.dependency
                ));
                s.push_str(tree);
                s.push_str("```\n");
            }
            None => {
                s.push_str(&format!(
                    "This overlay contains no `{}` section and is not relevant to the bump.\n",
                    ctx.dependency
                ));
            }
        }
        if !f.diagnostic.is_empty() {
            s.push_str("Validation errors when rendering the new chart with this overlay:\n```\n");
            s.push_str(&f.diagnostic);
            s.push_str("\n```\n");
        }
        if !f.manifest_diff.is_empty() {
            s.push_str("Rendered manifest diff (old vs new chart):\n```diff\n");
            s.push_str(&f.manifest_diff);
            s.push_str("\n```\n");
        }
    }

    s.push_str("\n# Response format\n");
    s.push_str("Write a short markdown report: a one-paragraph summary, then a bullet list of findings per overlay.\n");
    s.push_str("End the report with exactly one of these lines, alone on the final line:\n");
    s.push_str("LABEL: breaking-changes\n");
    s.push_str("LABEL: ready-to-merge\n");
    s.push_str("LABEL: needs-review\n");
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn ctx() -> RunContext {
        RunContext {
            chart_name: "app".into(),
            chart_dir: PathBuf::from("charts/app"),
            dependency: "redis".into(),
            old_version: "1.2.3".into(),
            new_version: "1.2.4".into(),
            repository: "https://charts.example.com".into(),
            workdir: PathBuf::from("work/app"),
        }
    }

    #[test]
    fn irrelevant_overlays_are_marked_not_omitted() {
        let files = vec![FileSection {
            name: "values-dev.yaml".into(),
            subtree: None,
            diagnostic: String::new(),
            manifest_diff: String::new(),
        }];

        let prompt = build_analysis_prompt(&ctx(), "", &files);
        assert!(prompt.contains("values-dev.yaml"));
        assert!(prompt.contains("not relevant to the bump"));
    }

    #[test]
    fn prompt_interpolates_versions_and_embeds_diffs() {
        let files = vec![FileSection {
            name: "values-prod.yaml".into(),
            subtree: Some("redis:\n  replicas: 3\n".into()),
            diagnostic: "error: unknown field".into(),
            manifest_diff: "spec.replicas\n  ± value change\n".into(),
        }];

        let prompt = build_analysis_prompt(&ctx(), "image.tag\n  ± value change\n", &files);
        assert!(prompt.contains("from 1.2.3 to 1.2.4"));
        assert!(prompt.contains("replicas: 3"));
        assert!(prompt.contains("unknown field"));
        assert!(prompt.contains("LABEL: breaking-changes"));
        assert!(prompt.ends_with("LABEL: needs-review\n"));
    }
}

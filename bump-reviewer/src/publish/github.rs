//! GitHub delivery via the `gh` CLI, as ensure-style operations.

use std::path::Path;

use tracing::debug;

use crate::analysis::Verdict;
use crate::errors::{BumpResult, PublishError};
use crate::exec::CommandRunner;
use crate::tools::GhCli;

/// Repository label definitions: name, color, description.
const LABEL_DEFS: [(&str, &str, &str); 3] = [
    (
        "breaking-changes",
        "D93F0B",
        "Dependency bump breaks existing configuration",
    ),
    (
        "ready-to-merge",
        "0E8A16",
        "Dependency bump verified safe to merge",
    ),
    (
        "needs-review",
        "FBCA04",
        "Dependency bump needs human review",
    ),
];

/// Best-effort creation of the three managed labels. "Already exists" is the
/// dominant outcome, so failures are only logged.
pub async fn ensure_labels_exist<R: CommandRunner>(runner: &R, repo: &str) {
    let gh = GhCli::new(runner);
    for (name, color, description) in LABEL_DEFS {
        match gh.create_label(repo, name, color, description).await {
            Ok(out) if !out.success() => {
                debug!(label = name, stderr = %out.stderr.trim(), "label create skipped");
            }
            Err(e) => debug!(label = name, "label create failed: {e}"),
            Ok(_) => {}
        }
    }
}

/// Removes a label from the PR, tolerating its absence.
pub async fn ensure_label_absent<R: CommandRunner>(
    runner: &R,
    repo: &str,
    pr_number: u64,
    label: &str,
) {
    let gh = GhCli::new(runner);
    match gh.remove_label(repo, pr_number, label).await {
        Ok(out) if !out.success() => {
            debug!(label, stderr = %out.stderr.trim(), "label remove skipped");
        }
        Err(e) => debug!(label, "label remove failed: {e}"),
        Ok(_) => {}
    }
}

/// Adds a label to the PR. Unlike removal this must succeed: it carries the
/// verdict.
pub async fn ensure_label_present<R: CommandRunner>(
    runner: &R,
    repo: &str,
    pr_number: u64,
    label: &str,
) -> BumpResult<()> {
    let gh = GhCli::new(runner);
    let out = gh.add_label(repo, pr_number, label).await?;
    if !out.success() {
        return Err(PublishError::Label {
            label: label.to_string(),
            detail: out.stderr.trim().to_string(),
        }
        .into());
    }
    Ok(())
}

/// Posts the report file as a new PR comment.
pub async fn post_comment<R: CommandRunner>(
    runner: &R,
    repo: &str,
    pr_number: u64,
    body_file: &Path,
) -> BumpResult<()> {
    let gh = GhCli::new(runner);
    let out = gh.comment_from_file(repo, pr_number, body_file).await?;
    if !out.success() {
        return Err(PublishError::Comment(out.stderr.trim().to_string()).into());
    }
    Ok(())
}

// Compile-time check that the managed label set and the verdict labels stay
// in sync.
const _: () = {
    assert!(LABEL_DEFS.len() == Verdict::all_labels().len());
};

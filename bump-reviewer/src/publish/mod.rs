//! Delivery: the verdict label and the report comment.
//!
//! Label application keeps the at-most-one invariant by removing all three
//! managed labels before adding the chosen one. The sequence is not atomic
//! against the hosting API; a concurrent run on the same PR could interleave.
//! Removal is an ensure-operation: a label that is already absent is fine.

pub mod github;

use std::path::Path;

use tracing::info;

use crate::analysis::Verdict;
use crate::errors::BumpResult;
use crate::exec::CommandRunner;

/// Applies the verdict label to the PR (remove-all, then add-one).
pub async fn apply_verdict<R: CommandRunner>(
    runner: &R,
    repo: &str,
    pr_number: u64,
    verdict: Verdict,
) -> BumpResult<()> {
    github::ensure_labels_exist(runner, repo).await;

    for label in Verdict::all_labels() {
        github::ensure_label_absent(runner, repo, pr_number, label).await;
    }
    github::ensure_label_present(runner, repo, pr_number, verdict.label()).await?;

    info!(label = verdict.label(), pr = pr_number, "verdict label applied");
    Ok(())
}

/// Posts the report as a new PR comment.
pub async fn post_report<R: CommandRunner>(
    runner: &R,
    repo: &str,
    pr_number: u64,
    report_file: &Path,
) -> BumpResult<()> {
    github::post_comment(runner, repo, pr_number, report_file).await?;
    info!(pr = pr_number, "report comment posted");
    Ok(())
}

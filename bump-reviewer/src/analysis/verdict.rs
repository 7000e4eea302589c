//! Verdict extraction from the model reply, with a deterministic fallback.

/// Closed decision space for a dependency bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The bump invalidates existing overlays; block the merge.
    Breaking,
    /// The bump is safe; merge away.
    Safe,
    /// A human should look.
    NeedsReview,
}

impl Verdict {
    /// The PR label carrying this verdict.
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Breaking => "breaking-changes",
            Verdict::Safe => "ready-to-merge",
            Verdict::NeedsReview => "needs-review",
        }
    }

    /// All labels the pipeline manages; removed before one is applied so at
    /// most one is ever attached.
    pub const fn all_labels() -> [&'static str; 3] {
        ["breaking-changes", "ready-to-merge", "needs-review"]
    }
}

/// Interprets the model's free-text reply.
///
/// Case-insensitive substring scan in priority order: breaking-changes,
/// then ready-to-merge, else needs-review for any non-empty reply. A reply
/// that mentions breaking changes anywhere is treated as breaking no matter
/// what else it says. Empty replies yield `None`.
pub fn parse_reply(reply: &str) -> Option<Verdict> {
    if reply.trim().is_empty() {
        return None;
    }

    let lower = reply.to_lowercase();
    if lower.contains("breaking-changes") {
        Some(Verdict::Breaking)
    } else if lower.contains("ready-to-merge") {
        Some(Verdict::Safe)
    } else {
        Some(Verdict::NeedsReview)
    }
}

/// Deterministic fallback when the inference call failed or the reply was
/// unusable: clean new-chart renders mean the bump is mergeable, anything
/// else needs eyes.
pub fn fallback_verdict(diagnostics_all_empty: bool) -> Verdict {
    if diagnostics_all_empty {
        Verdict::Safe
    } else {
        Verdict::NeedsReview
    }
}

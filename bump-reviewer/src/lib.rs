//! Public entry for the dependency-bump review pipeline.
//!
//! Single high-level function to analyze one Helm chart dependency bump and
//! deliver a verdict to the PR.
//!
//! 1) **Step 1 — Context & detection**
//!    - Diff base..head for a changed `charts/<name>/Chart.yaml`
//!    - Compare dependency lists to find the bumped entry + versions
//!
//! 2) **Step 2 — Chart retrieval**
//!    - Unpack the bot-fetched new chart archive
//!    - `helm pull` the old version (OCI or classic repo); failure here is
//!      recoverable and only disables the old-side comparison
//!
//! 3) **Step 3 — Rendering**
//!    - `helm template` each `values-*.yaml` overlay against both versions,
//!      keeping stderr as validation diagnostics without aborting the batch
//!
//! 4) **Step 4 — Structural diffs + gate**
//!    - `dyff between` on default values and on each rendered-manifest pair
//!    - All empty ⇒ safe label, minimal comment, `skip_ai=true`, done
//!
//! 5) **Step 5 — AI analysis**
//!    - Deterministic prompt from the diff artifacts
//!    - Bounded-retry chat completion; the reply (or its absence) becomes a
//!      closed [`analysis::Verdict`] via parse or deterministic fallback
//!
//! 6) **Step 6 — Delivery**
//!    - Markdown report as one new PR comment; remove-all-then-add-one label
//!      application; CI outputs for later stages
//!
//! The pipeline is strictly sequential and uses `tracing` for step logging.
//! Dispatch over external tools goes through the [`exec::CommandRunner`]
//! seam; no `async-trait`, no `Box<dyn ...>`.

pub mod analysis;
pub mod chart;
pub mod config;
pub mod context;
pub mod diff;
pub mod errors;
pub mod exec;
pub mod outputs;
pub mod publish;
pub mod render;
pub mod report;
pub mod tools;
pub mod values;

use std::path::Path;
use std::time::Instant;

use ai_llm_service::ChatService;
use tracing::{debug, info, warn};

use analysis::{FileSection, Verdict};
use config::RunConfig;
use errors::BumpResult;
use exec::CommandRunner;
use report::AnalysisSection;

/// Final outcome of one pipeline run.
#[derive(Debug, Clone, Copy)]
pub struct RunOutcome {
    /// The verdict delivered to the PR.
    pub verdict: Verdict,
    /// True when the diff gate short-circuited before any inference call.
    pub skipped_ai: bool,
}

/// Runs the whole pipeline for one PR.
///
/// Fatal errors (no chart changed, no version bump, toolchain missing)
/// propagate to the caller; everything downstream of the diff gate converges
/// to a verdict plus a posted comment, so AI unavailability never fails the
/// job.
pub async fn run_bump_review<R: CommandRunner>(
    runner: &R,
    cfg: &RunConfig,
) -> BumpResult<RunOutcome> {
    // ---------------------------
    // Step 1: context & detection
    // ---------------------------
    let t0 = Instant::now();
    debug!("step1: detect bumped dependency from git metadata");
    let ctx = context::detect(
        runner,
        &cfg.base_sha,
        &cfg.head_sha,
        &cfg.repo_root,
        &cfg.workdir_root,
    )
    .await?;
    info!(
        chart = %ctx.chart_name,
        dependency = %ctx.dependency,
        old = %ctx.old_version,
        new = %ctx.new_version,
        "step1: bump detected ({} ms)",
        t0.elapsed().as_millis()
    );

    let mut ci = outputs::CiOutputs::new();
    ci.set("chart", ctx.chart_name.as_str());
    ci.set("dependency", ctx.dependency.as_str());
    ci.set("old_version", ctx.old_version.as_str());
    ci.set("new_version", ctx.new_version.as_str());

    // ------------------------
    // Step 2: chart retrieval
    // ------------------------
    let t2 = Instant::now();
    debug!("step2: unpack new chart, pull old chart");
    let new_chart = chart::extract_new_chart(&ctx)?;
    let old_chart = chart::fetch_old_chart(runner, &ctx).await?;
    debug!(
        old_available = old_chart.is_some(),
        "step2: done ({} ms)",
        t2.elapsed().as_millis()
    );

    // ------------------
    // Step 3: rendering
    // ------------------
    let t3 = Instant::now();
    debug!("step3: render overlays against both chart versions");
    let overlay_files = values::list_values_files(&ctx.chart_dir)?;
    let new_renders = render::render_all(
        runner,
        &ctx.chart_name,
        &new_chart,
        &overlay_files,
        &ctx.new_templates_dir(),
    )
    .await?;
    let old_renders = match &old_chart {
        Some(old_dir) => {
            // Overlays are re-listed at each use by design; nothing else
            // mutates the tree within one job.
            let files = values::list_values_files(&ctx.chart_dir)?;
            render::render_all(
                runner,
                &ctx.chart_name,
                old_dir,
                &files,
                &ctx.old_templates_dir(),
            )
            .await?
        }
        None => Vec::new(),
    };
    debug!(
        overlays = new_renders.len(),
        "step3: done ({} ms)",
        t3.elapsed().as_millis()
    );

    // ---------------------------
    // Step 4: structural diffing
    // ---------------------------
    let t4 = Instant::now();
    debug!("step4: structural diffs (defaults + manifests)");
    let old_values = old_chart.as_deref().map(chart::default_values_path);
    let defaults_diff = diff::diff_default_values(
        runner,
        old_values.as_deref(),
        &chart::default_values_path(&new_chart),
        &ctx.diff_outputs_dir(),
    )
    .await?;
    let manifest_diffs =
        diff::diff_manifests(runner, &old_renders, &new_renders, &ctx.diff_outputs_dir()).await?;
    debug!(
        defaults_changed = !defaults_diff.is_empty(),
        manifests_changed = manifest_diffs.iter().filter(|d| !d.is_empty()).count(),
        "step4: done ({} ms)",
        t4.elapsed().as_millis()
    );

    let sections = build_sections(&ctx, &new_renders, &manifest_diffs)?;
    for s in &sections {
        // Same slugging as the diff/manifest artifacts, so output keys and
        // artifact names stay in step for unusual file names.
        let key = values::slug(Path::new(&s.name));
        ci.set_flag(format!("has_diff_{key}"), !s.manifest_diff.is_empty());
        ci.set_flag(
            format!("has_validation_errors_{key}"),
            !s.diagnostic.is_empty(),
        );
    }

    // -----------------
    // Step 4b: the gate
    // -----------------
    if defaults_diff.is_empty() && manifest_diffs.iter().all(|d| d.is_empty()) {
        info!("step4: no differences anywhere; short-circuiting as safe");
        let report_path = ctx.workdir.join("report.md");
        std::fs::write(&report_path, report::build_safe_report(&ctx))?;
        publish::post_report(runner, &cfg.repo, cfg.pr_number, &report_path).await?;
        publish::apply_verdict(runner, &cfg.repo, cfg.pr_number, Verdict::Safe).await?;
        ci.set_flag("skip_ai", true);
        ci.set_flag("breaking_changes", false);
        ci.write()?;
        return Ok(RunOutcome {
            verdict: Verdict::Safe,
            skipped_ai: true,
        });
    }

    // ---------------------
    // Step 5: AI analysis
    // ---------------------
    let t5 = Instant::now();
    debug!("step5: prompt + inference call");
    let prompt = analysis::build_analysis_prompt(&ctx, &defaults_diff, &sections);
    std::fs::write(ctx.workdir.join("ai_prompt.txt"), &prompt)?;

    let diagnostics_all_empty = new_renders.iter().all(render::RenderOutcome::is_clean);
    let chat = ChatService::new(cfg.llm.clone())?;
    let (verdict, analysis_section, reply_text);
    match chat.complete(&prompt).await {
        Ok(reply) => {
            std::fs::write(ctx.workdir.join("ai_response.txt"), &reply)?;
            match analysis::parse_reply(&reply) {
                Some(v) => {
                    verdict = v;
                    reply_text = reply;
                    analysis_section = AnalysisSection::Text(&reply_text);
                }
                None => {
                    warn!("step5: empty reply; using fallback verdict");
                    verdict = analysis::fallback_verdict(diagnostics_all_empty);
                    analysis_section = AnalysisSection::Unavailable { fallback: verdict };
                }
            }
        }
        Err(e) => {
            warn!("step5: inference call failed ({e}); using fallback verdict");
            verdict = analysis::fallback_verdict(diagnostics_all_empty);
            analysis_section = AnalysisSection::Unavailable { fallback: verdict };
        }
    }
    debug!(
        verdict = verdict.label(),
        "step5: done ({} ms)",
        t5.elapsed().as_millis()
    );

    // ------------------
    // Step 6: delivery
    // ------------------
    let t6 = Instant::now();
    debug!("step6: report + labels + outputs");
    let report_text = report::build_report(&ctx, &defaults_diff, &sections, &analysis_section);
    let report_path = ctx.workdir.join("report.md");
    std::fs::write(&report_path, report_text)?;

    publish::post_report(runner, &cfg.repo, cfg.pr_number, &report_path).await?;
    publish::apply_verdict(runner, &cfg.repo, cfg.pr_number, verdict).await?;

    ci.set_flag("skip_ai", false);
    ci.set_flag("breaking_changes", verdict == Verdict::Breaking);
    ci.write()?;
    info!(
        verdict = verdict.label(),
        "step6: done ({} ms); pipeline total {} ms",
        t6.elapsed().as_millis(),
        t0.elapsed().as_millis()
    );

    Ok(RunOutcome {
        verdict,
        skipped_ai: false,
    })
}

/// Joins per-overlay material for the prompt and the report. Overlays are
/// re-read here so the filtered sub-trees reflect the files as they are now.
fn build_sections(
    ctx: &context::RunContext,
    new_renders: &[render::RenderOutcome],
    manifest_diffs: &[diff::ManifestDiff],
) -> BumpResult<Vec<FileSection>> {
    let mut sections = Vec::with_capacity(new_renders.len());
    for r in new_renders {
        let name = r
            .values_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let subtree = values::filter_subtree(&r.values_file, &ctx.dependency)?;
        let manifest_diff = manifest_diffs
            .iter()
            .find(|d| d.values_file == r.values_file)
            .map(|d| d.text.clone())
            .unwrap_or_default();
        sections.push(FileSection {
            name,
            subtree,
            diagnostic: r.diagnostic.clone(),
            manifest_diff,
        });
    }
    Ok(sections)
}

//! Chart retrieval: unpack the bot-fetched new version, pull the old one.

use std::fs::File;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;
use tracing::{debug, warn};

use crate::context::RunContext;
use crate::errors::{BumpResult, ChartError};
use crate::exec::CommandRunner;
use crate::tools::HelmCli;

/// Extracts the new dependency chart from the archive the update bot already
/// fetched into the parent chart's `charts/` directory.
///
/// Convention: `charts/<chart>/charts/<dep>-<new_version>.tgz`, containing a
/// single top-level `<dep>/` directory. Returns the extracted chart dir.
pub fn extract_new_chart(ctx: &RunContext) -> BumpResult<PathBuf> {
    let archive_path = ctx
        .chart_dir
        .join("charts")
        .join(format!("{}-{}.tgz", ctx.dependency, ctx.new_version));
    if !archive_path.is_file() {
        return Err(ChartError::ArchiveMissing(archive_path.display().to_string()).into());
    }

    let dest = ctx.workdir.join("new_chart");
    std::fs::create_dir_all(&dest)?;

    let gz = GzDecoder::new(File::open(&archive_path)?);
    let mut archive = Archive::new(gz);
    archive.unpack(&dest)?;

    let chart_dir = dest.join(&ctx.dependency);
    if !chart_dir.is_dir() {
        return Err(ChartError::BadArchive(format!(
            "no '{}' directory inside {}",
            ctx.dependency,
            archive_path.display()
        ))
        .into());
    }

    debug!(chart = %chart_dir.display(), "new chart extracted");
    Ok(chart_dir)
}

/// Pulls the previous dependency version from its declared repository.
///
/// OCI references go through `helm pull oci://...`; everything else is a
/// classic repository index. A failed pull is recoverable: the run continues
/// without an old-side comparison, so this returns `Ok(None)` and logs the
/// reason instead of aborting.
pub async fn fetch_old_chart<R: CommandRunner>(
    runner: &R,
    ctx: &RunContext,
) -> BumpResult<Option<PathBuf>> {
    let helm = HelmCli::new(runner);
    let dest = ctx.workdir.join("old_chart");
    std::fs::create_dir_all(&dest)?;

    let out = if ctx.repository.starts_with("oci://") {
        let oci_ref = format!(
            "{}/{}",
            ctx.repository.trim_end_matches('/'),
            ctx.dependency
        );
        helm.pull_oci(&oci_ref, &ctx.old_version, &dest).await?
    } else {
        helm.pull_classic(&ctx.dependency, &ctx.repository, &ctx.old_version, &dest)
            .await?
    };

    if !out.success() {
        let err = ChartError::PullFailed {
            dependency: ctx.dependency.clone(),
            version: ctx.old_version.clone(),
            detail: out.stderr.trim().to_string(),
        };
        warn!("continuing without old chart: {err}");
        return Ok(None);
    }

    let chart_dir = dest.join(&ctx.dependency);
    if !chart_dir.is_dir() {
        warn!(
            "helm pull succeeded but '{}' is missing; continuing without old chart",
            chart_dir.display()
        );
        return Ok(None);
    }

    debug!(chart = %chart_dir.display(), "old chart pulled");
    Ok(Some(chart_dir))
}

/// Default values file of an extracted chart directory.
pub fn default_values_path(chart_dir: &Path) -> PathBuf {
    chart_dir.join("values.yaml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RunContext;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    fn ctx_in(root: &Path) -> RunContext {
        RunContext {
            chart_name: "app".into(),
            chart_dir: root.join("charts/app"),
            dependency: "redis".into(),
            old_version: "1.2.3".into(),
            new_version: "1.2.4".into(),
            repository: "https://charts.example.com".into(),
            workdir: root.join("work/app"),
        }
    }

    fn write_chart_tgz(path: &Path, chart: &str, values: &str) {
        let file = File::create(path).unwrap();
        let gz = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(gz);

        let values_path = format!("{chart}/values.yaml");
        let mut header = tar::Header::new_gnu();
        header.set_size(values.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, values_path, values.as_bytes())
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap().flush().unwrap();
    }

    #[test]
    fn extracts_the_conventional_archive() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = ctx_in(tmp.path());
        let archive_dir = ctx.chart_dir.join("charts");
        std::fs::create_dir_all(&archive_dir).unwrap();
        std::fs::create_dir_all(&ctx.workdir).unwrap();
        write_chart_tgz(
            &archive_dir.join("redis-1.2.4.tgz"),
            "redis",
            "image:\n  tag: 1.2.4\n",
        );

        let chart_dir = extract_new_chart(&ctx).unwrap();
        let values = std::fs::read_to_string(default_values_path(&chart_dir)).unwrap();
        assert!(values.contains("tag: 1.2.4"));
    }

    #[test]
    fn missing_archive_is_a_typed_error() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = ctx_in(tmp.path());
        std::fs::create_dir_all(&ctx.workdir).unwrap();
        let err = extract_new_chart(&ctx).unwrap_err();
        assert!(err.to_string().contains("redis-1.2.4.tgz"));
    }
}

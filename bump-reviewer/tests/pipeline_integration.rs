//! End-to-end pipeline tests over a scripted toolchain.
//!
//! The external binaries (`git`, `helm`, `dyff`, `gh`) are replaced by a
//! scripted [`CommandRunner`] fake; the inference endpoint, where needed, by
//! a minimal local HTTP responder. No real toolchain is required.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ai_llm_service::LlmModelConfig;
use bump_reviewer::analysis::Verdict;
use bump_reviewer::config::RunConfig;
use bump_reviewer::exec::{CommandOutput, CommandRunner, CommandSpec};
use bump_reviewer::{errors::BumpResult, run_bump_review};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write as _;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

const BASE_MANIFEST: &str = "dependencies:\n  - name: redis\n    version: 1.2.3\n    repository: https://charts.example.com\n";
const HEAD_MANIFEST: &str = "dependencies:\n  - name: redis\n    version: 1.2.4\n    repository: https://charts.example.com\n";

/// Scripted replacement for the whole external toolchain.
struct FakeRunner {
    changed_paths: String,
    base_manifest: String,
    helm_pull_ok: bool,
    old_values_yaml: String,
    /// Empty means "no differences" (dyff exit 0); non-empty is the diff text.
    dyff_diff: String,
    template_stdout: String,
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl FakeRunner {
    fn new() -> Self {
        Self {
            changed_paths: "charts/app/Chart.yaml\n".to_string(),
            base_manifest: BASE_MANIFEST.to_string(),
            helm_pull_ok: true,
            old_values_yaml: "image:\n  tag: 1.2.3\n".to_string(),
            dyff_diff: String::new(),
            template_stdout: "kind: Deployment\n".to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }

    fn calls_matching(&self, program: &str, arg0: &str) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|(p, a)| p == program && a.first().map(String::as_str) == Some(arg0))
            .map(|(_, a)| a)
            .collect()
    }
}

fn ok(stdout: &str) -> BumpResult<CommandOutput> {
    Ok(CommandOutput {
        status: 0,
        stdout: stdout.to_string(),
        stderr: String::new(),
    })
}

impl CommandRunner for FakeRunner {
    async fn run(&self, spec: CommandSpec) -> BumpResult<CommandOutput> {
        self.calls
            .lock()
            .unwrap()
            .push((spec.program.clone(), spec.args.clone()));

        let first = spec.args.first().map(String::as_str).unwrap_or_default();
        match (spec.program.as_str(), first) {
            ("git", "diff") => ok(&self.changed_paths),
            ("git", "show") => ok(&self.base_manifest),
            ("helm", "pull") => {
                if !self.helm_pull_ok {
                    return Ok(CommandOutput {
                        status: 1,
                        stdout: String::new(),
                        stderr: "Error: chart not found".to_string(),
                    });
                }
                // Emulate `--untar --untardir <dest>`: materialize the chart.
                let dest = spec
                    .args
                    .windows(2)
                    .find(|w| w[0] == "--untardir")
                    .map(|w| PathBuf::from(&w[1]))
                    .expect("helm pull without --untardir");
                std::fs::create_dir_all(dest.join("redis")).unwrap();
                std::fs::write(dest.join("redis/values.yaml"), &self.old_values_yaml).unwrap();
                ok("")
            }
            ("helm", "template") => ok(&self.template_stdout),
            ("dyff", "between") => {
                if self.dyff_diff.is_empty() {
                    ok("")
                } else {
                    Ok(CommandOutput {
                        status: 1,
                        stdout: self.dyff_diff.clone(),
                        stderr: String::new(),
                    })
                }
            }
            ("gh", _) => ok(""),
            other => panic!("unexpected tool invocation: {other:?} {:?}", spec.args),
        }
    }
}

/// Lays out the fixture repo: parent chart manifest, overlay, and the
/// bot-fetched new chart archive.
fn write_fixture_repo(root: &Path, new_values_yaml: &str, overlay_yaml: &str) {
    let chart_dir = root.join("charts/app");
    std::fs::create_dir_all(chart_dir.join("charts")).unwrap();
    std::fs::write(chart_dir.join("Chart.yaml"), HEAD_MANIFEST).unwrap();
    std::fs::write(chart_dir.join("values-prod.yaml"), overlay_yaml).unwrap();

    let file = std::fs::File::create(chart_dir.join("charts/redis-1.2.4.tgz")).unwrap();
    let gz = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(gz);
    let mut header = tar::Header::new_gnu();
    header.set_size(new_values_yaml.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder
        .append_data(&mut header, "redis/values.yaml", new_values_yaml.as_bytes())
        .unwrap();
    builder
        .into_inner()
        .unwrap()
        .finish()
        .unwrap()
        .flush()
        .unwrap();
}

fn config_for(root: &Path, endpoint: &str) -> RunConfig {
    RunConfig {
        base_sha: "base000".to_string(),
        head_sha: "head111".to_string(),
        repo: "acme/platform".to_string(),
        pr_number: 42,
        repo_root: root.to_path_buf(),
        workdir_root: root.join("bump-analysis"),
        llm: LlmModelConfig {
            model: "test-model".to_string(),
            endpoint: endpoint.to_string(),
            api_key: None,
            timeout_secs: Some(5),
        },
    }
}

/// Minimal HTTP responder standing in for the chat endpoint.
async fn spawn_endpoint(status_line: &'static str, body: String) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        loop {
            let Ok((mut sock, _)) = listener.accept().await else {
                break;
            };
            let body = body.clone();
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 4096];
                loop {
                    let n = sock.read(&mut chunk).await.unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                    if request_complete(&buf) {
                        break;
                    }
                }
                let resp = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body
                );
                let _ = sock.write_all(resp.as_bytes()).await;
                let _ = sock.shutdown().await;
            });
        }
    });
    endpoint
}

async fn spawn_chat_endpoint(body: String) -> String {
    spawn_endpoint("200 OK", body).await
}

fn request_complete(buf: &[u8]) -> bool {
    let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
        return false;
    };
    let headers = String::from_utf8_lossy(&buf[..pos]);
    let content_length = headers
        .lines()
        .find_map(|l| {
            let (name, value) = l.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())?
        })
        .unwrap_or(0);
    buf.len() >= pos + 4 + content_length
}

#[tokio::test]
async fn identical_versions_short_circuit_without_ai() {
    let tmp = tempfile::tempdir().unwrap();
    write_fixture_repo(
        tmp.path(),
        "image:\n  tag: 1.2.3\n",
        "redis:\n  replicas: 3\n",
    );

    let runner = FakeRunner::new();
    // Endpoint is unreachable on purpose: the gate must never get there.
    let cfg = config_for(tmp.path(), "http://127.0.0.1:1");

    let outcome = run_bump_review(&runner, &cfg).await.unwrap();
    assert!(outcome.skipped_ai);
    assert_eq!(outcome.verdict, Verdict::Safe);

    let comments = runner.calls_matching("gh", "pr");
    let comment_calls: Vec<_> = comments
        .iter()
        .filter(|a| a.get(1).map(String::as_str) == Some("comment"))
        .collect();
    assert_eq!(comment_calls.len(), 1, "exactly one PR comment");

    let report = std::fs::read_to_string(tmp.path().join("bump-analysis/app/report.md")).unwrap();
    assert!(report.contains("SAFE TO MERGE"));

    let add_labels: Vec<_> = comments
        .iter()
        .filter_map(|a| {
            a.windows(2)
                .find(|w| w[0] == "--add-label")
                .map(|w| w[1].clone())
        })
        .collect();
    assert_eq!(add_labels, vec!["ready-to-merge"]);
}

#[tokio::test]
async fn breaking_reply_drives_the_breaking_label() {
    let tmp = tempfile::tempdir().unwrap();
    write_fixture_repo(
        tmp.path(),
        "image:\n  tag: 1.2.4\nauth:\n  enabled: true\n",
        "redis:\n  replicas: 3\n",
    );

    let reply = "The `auth.enabled` default changed and overlays relying on \
                 anonymous access will break.\n\nLABEL: breaking-changes";
    let body = serde_json::json!({
        "choices": [{"message": {"content": reply}}]
    })
    .to_string();
    let endpoint = spawn_chat_endpoint(body).await;

    let mut runner = FakeRunner::new();
    runner.dyff_diff = "auth.enabled\n  ± value change\n    - false\n    + true\n".to_string();
    let cfg = config_for(tmp.path(), &endpoint);

    let outcome = run_bump_review(&runner, &cfg).await.unwrap();
    assert!(!outcome.skipped_ai);
    assert_eq!(outcome.verdict, Verdict::Breaking);

    // All three managed labels are removed before the one verdict label is
    // added, keeping the at-most-one invariant.
    let gh_edits = runner.calls_matching("gh", "pr");
    let removed: Vec<_> = gh_edits
        .iter()
        .filter_map(|a| {
            a.windows(2)
                .find(|w| w[0] == "--remove-label")
                .map(|w| w[1].clone())
        })
        .collect();
    let added: Vec<_> = gh_edits
        .iter()
        .filter_map(|a| {
            a.windows(2)
                .find(|w| w[0] == "--add-label")
                .map(|w| w[1].clone())
        })
        .collect();
    assert_eq!(removed.len(), 3);
    assert_eq!(added, vec!["breaking-changes"]);

    let report = std::fs::read_to_string(tmp.path().join("bump-analysis/app/report.md")).unwrap();
    assert!(report.contains("auth.enabled"));

    let prompt = std::fs::read_to_string(tmp.path().join("bump-analysis/app/ai_prompt.txt")).unwrap();
    assert!(prompt.contains("from 1.2.3 to 1.2.4"));
}

#[tokio::test]
async fn failed_old_chart_pull_does_not_short_circuit() {
    let tmp = tempfile::tempdir().unwrap();
    write_fixture_repo(
        tmp.path(),
        "image:\n  tag: 1.2.4\n",
        "redis:\n  replicas: 3\n",
    );

    let reply = "Could not compare against the previous version.\n\nLABEL: needs-review";
    let body = serde_json::json!({
        "choices": [{"message": {"content": reply}}]
    })
    .to_string();
    let endpoint = spawn_chat_endpoint(body).await;

    let mut runner = FakeRunner::new();
    runner.helm_pull_ok = false;
    let cfg = config_for(tmp.path(), &endpoint);

    let outcome = run_bump_review(&runner, &cfg).await.unwrap();
    // With no old side to compare, the run must reach analysis rather than
    // declaring the bump safe.
    assert!(!outcome.skipped_ai);
    assert_eq!(outcome.verdict, Verdict::NeedsReview);
}

#[tokio::test]
async fn rejected_inference_call_falls_back_to_the_validation_verdict() {
    let tmp = tempfile::tempdir().unwrap();
    write_fixture_repo(
        tmp.path(),
        "image:\n  tag: 1.2.4\n",
        "redis:\n  replicas: 3\n",
    );

    // HTTP 413 fails fast, so the run reaches delivery without backoff waits.
    let endpoint = spawn_endpoint("413 Payload Too Large", String::new()).await;

    let mut runner = FakeRunner::new();
    runner.dyff_diff = "image.tag\n  ± value change\n".to_string();
    let cfg = config_for(tmp.path(), &endpoint);

    let outcome = run_bump_review(&runner, &cfg).await.unwrap();
    assert!(!outcome.skipped_ai);
    // Renders were clean, so the deterministic fallback is the safe verdict.
    assert_eq!(outcome.verdict, Verdict::Safe);

    let added: Vec<_> = runner
        .calls_matching("gh", "pr")
        .iter()
        .filter_map(|a| {
            a.windows(2)
                .find(|w| w[0] == "--add-label")
                .map(|w| w[1].clone())
        })
        .collect();
    assert_eq!(added, vec!["ready-to-merge"]);

    let report = std::fs::read_to_string(tmp.path().join("bump-analysis/app/report.md")).unwrap();
    assert!(report.contains("AI analysis unavailable"));
    assert!(report.contains("ready-to-merge"));
}

#[tokio::test]
async fn overlay_without_dependency_section_is_marked_irrelevant() {
    let tmp = tempfile::tempdir().unwrap();
    write_fixture_repo(
        tmp.path(),
        "image:\n  tag: 1.2.4\n",
        "postgres:\n  storage: 10Gi\n",
    );

    let body = serde_json::json!({
        "choices": [{"message": {"content": "Nothing references redis.\n\nLABEL: ready-to-merge"}}]
    })
    .to_string();
    let endpoint = spawn_chat_endpoint(body).await;

    let mut runner = FakeRunner::new();
    runner.dyff_diff = "image.tag\n  ± value change\n".to_string();
    let cfg = config_for(tmp.path(), &endpoint);

    let outcome = run_bump_review(&runner, &cfg).await.unwrap();
    assert_eq!(outcome.verdict, Verdict::Safe);

    let prompt = std::fs::read_to_string(tmp.path().join("bump-analysis/app/ai_prompt.txt")).unwrap();
    assert!(prompt.contains("values-prod.yaml"));
    assert!(prompt.contains("not relevant to the bump"));
}

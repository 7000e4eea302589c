use std::error::Error;
use std::process::ExitCode;

use bump_reviewer::config::RunConfig;
use bump_reviewer::exec::ProcessRunner;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    // Load environment variables from .env file for local runs.
    // In CI everything arrives through the job environment, so a missing
    // file is not an error.
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,bump_reviewer=info"))
        .unwrap();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let cfg = RunConfig::from_env()?;
    let runner = ProcessRunner;

    match bump_reviewer::run_bump_review(&runner, &cfg).await {
        Ok(outcome) => {
            tracing::info!(
                verdict = outcome.verdict.label(),
                skipped_ai = outcome.skipped_ai,
                "bump review finished"
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::error!("bump review failed: {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}

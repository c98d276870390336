use anyhow::{Context, Result};
use grader::{ExecutionHarness, HarnessConfig, Submission};
use tokio::io::AsyncReadExt;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("grader=info".parse()?),
        )
        .init();

    let config = HarnessConfig::from_env()?;
    let harness = ExecutionHarness::new(config.clone())?;
    info!(
        "Loaded languages: {} (scratch root {:?})",
        harness.toolchains().supported_languages().join(", "),
        config.scratch_root
    );

    let submission_json = match std::env::args().nth(1) {
        Some(path) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read submission file {}", path))?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("Failed to read submission from stdin")?;
            buf
        }
    };

    let submission: Submission =
        serde_json::from_str(&submission_json).context("Failed to parse submission")?;

    let verdict = harness.execute(submission).await;
    println!("{}", serde_json::to_string_pretty(&verdict)?);

    Ok(())
}

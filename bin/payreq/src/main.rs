//! payreq deploys the PaymentRequest contract with the configured token and reports its address.

mod cli;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use cli::Cli;
use payreq_deploy::{
    DeploymentDriver, DeploymentFailure, DeploymentResult, HardhatArtifacts, JsonRpcChainClient,
    Settings, config, report,
};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Variables from .env never override the ones already set.
    let dotenv_path = dotenv::dotenv().ok();

    let cli = Cli::parse();

    // Initialize the logger. Logs go to stderr, stdout carries the report.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .with_writer(std::io::stderr)
        .init();

    if let Some(path) = dotenv_path {
        tracing::debug!(path = %path.display(), "Loaded environment file");
    }

    let settings = cli.apply(Settings::load(&cli.config)?);

    let outcome = run(&cli, &settings).await;

    let record = report::report(&outcome, cli.format, &mut std::io::stdout().lock())
        .context("Failed to write the deployment report")?;

    if let Some(path) = &settings.record {
        record
            .save(path)
            .with_context(|| format!("Failed to save deployment record to {}", path.display()))?;
    }

    Ok(ExitCode::from(record.exit_code()))
}

async fn run(cli: &Cli, settings: &Settings) -> Result<DeploymentResult, DeploymentFailure> {
    let request = config::resolve(&cli.raw_config())?;

    let token = request
        .args()
        .first()
        .map(ToString::to_string)
        .unwrap_or_default();
    println!("Deploying {} with token: {}", request.contract(), token);

    tracing::info!(
        contract = request.contract(),
        network = %request.network(),
        rpc_url = %settings.rpc_url,
        artifacts_dir = %settings.artifacts_dir.display(),
        "Starting deployment..."
    );

    let client = JsonRpcChainClient::new(settings.rpc_url.clone(), settings.sender)
        .map_err(|e| DeploymentFailure::Submission {
            cause: format!("failed to create the RPC client: {}", e),
        })?;
    let driver = DeploymentDriver::new(HardhatArtifacts::new(&settings.artifacts_dir), client)
        .with_confirmation_policy(settings.confirmation);

    driver.deploy_until(&request, interrupted()).await
}

/// Completes on Ctrl-C. Stops the confirmation wait, never the broadcast transaction.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C, cancellation disabled");
        std::future::pending::<()>().await;
    }
    tracing::warn!("Interrupted, no longer waiting for confirmation");
}

mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use numerx_core::{
    collect_inputs, validate_config, NumerxClient, PipelineConfig, PusherConfig, SanitizedConfig,
    UploadPipeline,
};

use cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logging is not up yet; the level depends on the loaded config.
    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // Logs go to stderr; stdout carries only the failure report.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_log_level(&config).into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(config).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

/// Filter used when `RUST_LOG` is not set.
fn default_log_level(config: &PusherConfig) -> &'static str {
    if config.verbose {
        "debug"
    } else {
        "info"
    }
}

async fn run(config: PusherConfig) -> Result<()> {
    validate_config(&config)?;

    debug!("Provided: {:?}", SanitizedConfig::from(&config));
    info!(kind = %config.kind, base_url = %config.base_url, "Configuration loaded");

    let files = collect_inputs(config.input.file.as_deref(), config.input.dir.as_deref())
        .await
        .context("Failed to enumerate input files")?;
    info!(count = files.len(), "Files to process");

    let client = NumerxClient::new(&config).context("Failed to create NumerX client")?;
    let pipeline = UploadPipeline::new(Arc::new(client), config.kind, PipelineConfig::from(&config));

    let report = pipeline.run(files).await?;
    println!("{}", report);

    Ok(())
}

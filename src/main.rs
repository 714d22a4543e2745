mod cli;
mod config;
mod download;
mod error;
mod filename;
mod filter;
mod models;
mod pipeline;
mod redux;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    cli::Cli,
    config::{AppConfig, CONFIG_HELP},
    pipeline::{ItemOutcome, ItemReport, Pipeline},
    redux::ReduxClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Logging ──────────────────────────────────────────────────────────────
    let default_filter = if cli.debug {
        "redux_dl=debug"
    } else {
        "redux_dl=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    // ── Config ───────────────────────────────────────────────────────────────
    let config_path = cli
        .config_file
        .clone()
        .unwrap_or_else(config::default_config_path);
    let mut config = match AppConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{CONFIG_HELP}\n");
            return Err(e).with_context(|| format!("loading {}", config_path.display()));
        }
    };
    cli.apply_overrides(&mut config);

    // ── Pipeline ─────────────────────────────────────────────────────────────
    let client = ReduxClient::new(&config)?;
    let pipeline = Pipeline::new(client, &config, !cli.quiet);
    let mode = cli.run_mode(&config);

    let report = pipeline
        .run_with(&cli.search_mode(), &cli.criteria(), &mode, print_item)
        .await?;

    info!(
        "{} programme(s): {} downloaded, {} skipped, {} failed download(s), {} unusable",
        report.items.len(),
        report.downloaded(),
        report.skipped(),
        report.download_failures(),
        report.lookup_failures(),
    );

    if report.lookup_failures() > 0 {
        anyhow::bail!(
            "{} programme(s) had unusable metadata",
            report.lookup_failures()
        );
    }

    Ok(())
}

/// Describe and plan output goes to stdout; everything else is logged.
fn print_item(item: &ItemReport) {
    match &item.outcome {
        ItemOutcome::Described(line) => println!("{line}"),
        ItemOutcome::Planned { uri, filename } => {
            println!("Media URL: {uri}");
            println!("Filename:   {filename}");
            println!();
        }
        ItemOutcome::Downloaded { path, bytes } => {
            info!("Done: {} ({bytes} bytes)", path.display());
        }
        ItemOutcome::Skipped { kind } => {
            debug!("{} skipped ({kind})", item.diskref);
        }
        ItemOutcome::Failed(e) => {
            debug!("{} failed: {e}", item.diskref);
        }
    }
}

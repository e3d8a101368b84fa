mod cli;
mod config;
mod progress;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use engine_logging::{engine_info, engine_warn, LogDestination};
use log::LevelFilter;
use tokio_util::sync::CancellationToken;
use wiki_engine::Scraper;

use crate::cli::Cli;
use crate::progress::LogProgress;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = config::resolve(&cli)?;
    engine_info!(
        "Using endpoint {} and output directory {:?}",
        config.api.endpoint,
        config.output_dir
    );

    let scraper = Scraper::from_config(&config)
        .context("failed to set up harvester")?
        .with_sink(Arc::new(LogProgress::new(config.target_count)))
        .with_cancellation(shutdown_token());

    let report = scraper.run(config.target_count).await;
    println!("{report}");
    Ok(())
}

fn init_logging(cli: &Cli) {
    let level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let destination = match &cli.log_file {
        Some(path) => LogDestination::Both(path.clone()),
        None => LogDestination::Terminal,
    };
    engine_logging::initialize(destination, level);
}

/// Cancelled on Ctrl-C so the run stops taking new titles and drains cleanly.
fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            engine_warn!("Interrupt received; finishing in-flight articles");
            trigger.cancel();
        }
    });
    token
}

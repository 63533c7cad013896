//! Standalone image worker.
//!
//! Drains the shared queue against the same store as the service. Any number
//! of these may run; the processing lock lets exactly one work at a time and
//! the others take over when it stops.
//!
//! # Usage
//!
//! ```bash
//! # Run until Ctrl+C / SIGTERM
//! cargo run --bin image-worker
//!
//! # Run a single cycle and exit (useful from cron)
//! cargo run --bin image-worker -- --once
//! ```
//!
//! Set `IMAGE_WORKER_EMBEDDED=false` on the service when running workers
//! this way.

use anyhow::Result;
use clap::Parser;
use tokio::sync::watch;

use image_pipeline::application::services::CycleOutcome;
use image_pipeline::{bootstrap, config, logging, server};

/// Background image worker.
#[derive(Parser)]
#[command(name = "image-worker")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Process at most one job, then exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = config::load_from_env()?;
    logging::init(&config.log_level, &config.log_format);
    config.print_summary();

    let pipeline = bootstrap::build_pipeline(&config).await?;
    let worker = pipeline.worker();

    if cli.once {
        match worker.run_cycle().await? {
            CycleOutcome::LockBusy => tracing::info!("Another worker holds the lock"),
            CycleOutcome::QueueEmpty => tracing::info!("Queue empty"),
            CycleOutcome::Skipped { word } => {
                tracing::info!(word = %word, "Skipped, already cached")
            }
            CycleOutcome::Processed { word, outcome } => {
                tracing::info!(word = %word, outcome = outcome.as_str(), "Processed")
            }
        }
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(async move { worker.run(shutdown_rx).await });

    server::shutdown_signal().await;
    let _ = shutdown_tx.send(true);
    handle.await?;

    Ok(())
}

//! CLI administration tool for the image pipeline.
//!
//! Inspects and manipulates the shared store directly, without going
//! through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Queue depth, quota and worker lock
//! cargo run --bin admin -- status
//!
//! # Cache inspection and eviction
//! cargo run --bin admin -- cache stats
//! cargo run --bin admin -- cache get kuća --output kuca.jpg
//! cargo run --bin admin -- cache clear pas
//! cargo run --bin admin -- cache clear --all
//!
//! # Queue a word, or pre-warm the whole vocabulary
//! cargo run --bin admin -- enqueue pas --translation dog --priority
//! cargo run --bin admin -- populate
//!
//! # Connectivity and setup
//! cargo run --bin admin -- store check
//! cargo run --bin admin -- token generate
//! ```
//!
//! # Environment Variables
//!
//! - `REDIS_URL` (required for everything except `token generate`)
//! - `DATABASE_URL` (optional): enables user vocabulary for `populate`
//!
//! # Features
//!
//! - **Queue & Quota**: Lane depths, requests this hour, lock state
//! - **Cache Tools**: Stats, single-entry inspection, eviction
//! - **Population**: One-off populator run honouring the populator lock
//! - **Interactive Prompts**: Confirmation before destructive operations
//! - **Colored Output**: Terminal-friendly formatting using `colored` crate

use image_pipeline::application::Pipeline;
use image_pipeline::application::services::rate_limiter::UNKNOWN_COUNT;
use image_pipeline::bootstrap;
use image_pipeline::config::{self, Config};
use image_pipeline::domain::entities::{CacheEntry, EnqueueOutcome, sources};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use std::path::PathBuf;

/// CLI tool for managing the image pipeline.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Show queue depth, quota use and worker lock state
    Status,

    /// Inspect or evict cached images
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Queue a word for image acquisition
    Enqueue {
        /// Word to fetch an image for
        word: String,

        /// English gloss used to build search queries
        #[arg(short, long)]
        translation: Option<String>,

        /// Place the job in the priority lane
        #[arg(short, long)]
        priority: bool,
    },

    /// Run one populator cycle over all vocabulary sources
    Populate,

    /// Backing store operations
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },

    /// Admin token helpers
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
}

/// Cache subcommands.
#[derive(Subcommand)]
enum CacheAction {
    /// Show entry count, size and success/failure split
    Stats,

    /// Show the cached outcome for a word
    Get {
        word: String,

        /// Write the image bytes to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Evict one word, or everything with --all
    Clear {
        /// Word to evict
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        word: Option<String>,

        /// Evict every cached outcome
        #[arg(long)]
        all: bool,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Store subcommands.
#[derive(Subcommand)]
enum StoreAction {
    /// Check store connectivity
    Check,
}

/// Token subcommands.
#[derive(Subcommand)]
enum TokenAction {
    /// Print a random value suitable for ADMIN_TOKEN
    Generate,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Commands::Token {
        action: TokenAction::Generate,
    } = cli.command
    {
        return generate_token();
    }

    let config = config::load_from_env()?;
    let pipeline = connect(&config).await?;

    match cli.command {
        Commands::Status => handle_status(&pipeline).await?,
        Commands::Cache { action } => handle_cache_action(action, &pipeline).await?,
        Commands::Enqueue {
            word,
            translation,
            priority,
        } => handle_enqueue(&pipeline, &word, translation.as_deref(), priority).await?,
        Commands::Populate => handle_populate(&pipeline).await?,
        Commands::Store { action } => handle_store_action(action, &pipeline).await?,
        Commands::Token { .. } => unreachable!("handled before connecting"),
    }

    Ok(())
}

/// Builds the pipeline against the shared store.
///
/// An in-memory store would only show this process's empty state, so a
/// Redis URL is required.
async fn connect(config: &Config) -> Result<Pipeline> {
    config
        .redis_url
        .as_ref()
        .context("REDIS_URL (or REDIS_HOST) must be set to inspect the shared store")?;

    bootstrap::build_pipeline(config).await
}

/// Displays queue depth, quota and lock state.
///
/// # Output Format
///
/// ```text
/// 📊 Pipeline Status
///
///   Priority lane:     1
///   Normal lane:       97
///   Requests (hour):   12 / 25  (resets in 1804s)
///   Worker lock:       HELD
/// ```
async fn handle_status(pipeline: &Pipeline) -> Result<()> {
    println!("{}", "📊 Pipeline Status".bright_blue().bold());
    println!();

    let status = pipeline
        .admin()
        .queue_status()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read status: {}", e))?;

    let used = if status.requests_this_hour == UNKNOWN_COUNT {
        "unknown".red()
    } else if status.requests_this_hour >= status.max_per_hour {
        status.requests_this_hour.to_string().red().bold()
    } else {
        status.requests_this_hour.to_string().bright_green().bold()
    };

    println!(
        "  Priority lane:     {}",
        status.priority_len.to_string().bright_white().bold()
    );
    println!(
        "  Normal lane:       {}",
        status.normal_len.to_string().bright_white().bold()
    );
    println!(
        "  Requests (hour):   {} / {}  {}",
        used,
        status.max_per_hour,
        format!("(resets in {}s)", status.seconds_until_reset).bright_black()
    );
    println!(
        "  Worker lock:       {}",
        if status.is_lock_held {
            "HELD".yellow()
        } else {
            "FREE".green()
        }
    );
    println!();

    Ok(())
}

/// Dispatches cache commands.
async fn handle_cache_action(action: CacheAction, pipeline: &Pipeline) -> Result<()> {
    match action {
        CacheAction::Stats => cache_stats(pipeline).await,
        CacheAction::Get { word, output } => cache_get(pipeline, &word, output).await,
        CacheAction::Clear { word, all, yes } => {
            cache_clear(pipeline, if all { None } else { word }, yes).await
        }
    }
}

async fn cache_stats(pipeline: &Pipeline) -> Result<()> {
    println!("{}", "🗄  Cache Statistics".bright_blue().bold());
    println!();

    let stats = pipeline
        .admin()
        .cache_stats()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read cache stats: {}", e))?;

    println!(
        "  Entries:          {}",
        stats.count.to_string().bright_white().bold()
    );
    println!(
        "  Estimated size:   {}",
        format_bytes(stats.estimated_size_bytes).bright_white()
    );
    println!(
        "  Success (est.):   {}",
        stats.success_count.to_string().bright_green()
    );
    println!(
        "  Failure (est.):   {}",
        stats.failure_count.to_string().red()
    );
    println!();

    Ok(())
}

/// Shows a single cache entry and optionally saves its image.
async fn cache_get(pipeline: &Pipeline, word: &str, output: Option<PathBuf>) -> Result<()> {
    let entry = pipeline
        .cache()
        .get(word)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read cache: {}", e))?;

    let Some(entry) = entry else {
        println!("{}", format!("  No cache entry for '{}'", word).yellow());
        let queued = pipeline
            .queue()
            .is_queued(word)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read queue: {}", e))?;
        if queued {
            println!("  {}", "Waiting in queue".bright_black());
        }
        return Ok(());
    };

    match entry {
        CacheEntry::Success {
            word,
            image,
            cached_at,
        } => {
            println!("  Word:          {}", word.cyan());
            println!("  Status:        {}", "SUCCESS".green().bold());
            println!("  Cached at:     {}", cached_at.format("%Y-%m-%d %H:%M"));
            println!("  Query:         {}", image.search_query);
            println!(
                "  Image:         {}x{} {} ({})",
                image.width,
                image.height,
                image.content_type,
                format_bytes(image.size_bytes as u64)
            );
            if let Some(photographer) = &image.photographer {
                println!("  Photographer:  {}", photographer);
            }
            if let Some(description) = &image.description {
                println!("  Description:   {}", description.bright_black());
            }

            if let Some(path) = output {
                tokio::fs::write(&path, &image.image_data)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!();
                println!("{}", format!("✅ Saved to {}", path.display()).green());
            }
        }
        CacheEntry::Failure {
            word,
            reason,
            failed_at,
        } => {
            println!("  Word:          {}", word.cyan());
            println!("  Status:        {}", "FAILURE".red().bold());
            println!("  Failed at:     {}", failed_at.format("%Y-%m-%d %H:%M"));
            println!("  Reason:        {}", reason);
        }
    }
    println!();

    Ok(())
}

/// Evicts one entry or the whole cache.
///
/// Clearing everything requires confirmation (default: No) unless `--yes`.
async fn cache_clear(pipeline: &Pipeline, word: Option<String>, skip_confirm: bool) -> Result<()> {
    if word.is_none() && !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Evict every cached image? Words will be fetched again.")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let removed = pipeline
        .admin()
        .clear_cache(word.as_deref())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to clear cache: {}", e))?;

    println!(
        "{}",
        format!("✅ Removed {} entr{}", removed, if removed == 1 { "y" } else { "ies" })
            .green()
            .bold()
    );

    Ok(())
}

async fn handle_enqueue(
    pipeline: &Pipeline,
    word: &str,
    translation: Option<&str>,
    priority: bool,
) -> Result<()> {
    let outcome = pipeline
        .queue()
        .enqueue(word, translation, sources::ADMIN, priority)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to enqueue: {}", e))?;

    match outcome {
        EnqueueOutcome::Enqueued => println!(
            "{}",
            format!(
                "✅ Queued '{}' ({} lane)",
                word,
                if priority { "priority" } else { "normal" }
            )
            .green()
        ),
        EnqueueOutcome::Duplicate => println!(
            "{}",
            format!("⚠️  '{}' is already cached or queued", word).yellow()
        ),
    }

    Ok(())
}

/// Runs one populator cycle and prints its report.
async fn handle_populate(pipeline: &Pipeline) -> Result<()> {
    println!("{}", "🌱 Populating image queue...".bright_blue());

    let report = pipeline
        .populator()
        .run_cycle()
        .await
        .map_err(|e| anyhow::anyhow!("Populator failed: {}", e))?;

    if report.lock_busy {
        println!(
            "{}",
            "⚠️  Another populator is running, nothing done".yellow()
        );
        return Ok(());
    }

    println!(
        "  Added:       {}",
        report.added.to_string().bright_green().bold()
    );
    println!(
        "  Duplicates:  {}",
        report.duplicates.to_string().bright_black()
    );
    println!();

    Ok(())
}

async fn handle_store_action(action: StoreAction, pipeline: &Pipeline) -> Result<()> {
    match action {
        StoreAction::Check => {
            println!("{}", "🔍 Checking store connection...".bright_blue());

            if !pipeline.store().health_check().await {
                anyhow::bail!("Store did not answer PING");
            }

            println!("{}", "✅ Store connection OK".green().bold());
        }
    }

    Ok(())
}

/// Prints a random 32-byte hex token.
fn generate_token() -> Result<()> {
    let mut bytes = [0u8; 32];
    getrandom::fill(&mut bytes).map_err(|e| anyhow::anyhow!("OS random source failed: {}", e))?;
    let token = hex::encode(bytes);

    println!("{}", "✨ Generated admin token".green());
    println!();
    println!("  ADMIN_TOKEN={}", token.bright_yellow().bold());
    println!();
    println!("{}", "Example:".bright_white());
    println!(
        "  curl -H \"Authorization: Bearer {}\" http://localhost:3000/api/images/status",
        token.bright_yellow()
    );
    println!();

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    let b = bytes as f64;
    if b >= KIB * KIB {
        format!("{:.1} MiB", b / (KIB * KIB))
    } else if b >= KIB {
        format!("{:.1} KiB", b / KIB)
    } else {
        format!("{} B", bytes)
    }
}

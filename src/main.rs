//! Newsrake main entry point
//!
//! This is the command-line interface for the newsrake crawl job service.

use anyhow::Context;
use clap::Parser;
use newsrake::config::load_config_with_hash;
use newsrake::jobs::{run_next_job, run_worker, AppContext, TASK_CRAWL_ARTICLES};
use newsrake::status::map_status;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Newsrake: a budget-aware news crawl job service
///
/// Newsrake submits article crawls as background jobs, bounds their output
/// by a content budget, answers status queries while they run, and cleans
/// up their artifacts after the retention window.
#[derive(Parser, Debug)]
#[command(name = "newsrake")]
#[command(version)]
#[command(about = "A budget-aware news crawl job service", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Submit a crawl job and print its id
    #[arg(long, conflicts_with_all = ["status", "worker", "dry_run"])]
    submit: bool,

    /// Query the status of a job
    #[arg(long, value_name = "JOB_ID", conflicts_with_all = ["worker", "dry_run"])]
    status: Option<String>,

    /// Run the worker loop
    #[arg(long, conflicts_with = "dry_run")]
    worker: bool,

    /// Override the content budget for this submission
    #[arg(long, value_name = "CHARS")]
    max_chars: Option<u64>,

    /// Validate config and show what would run, without running it
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let ctx = AppContext::initialize(config).context("failed to initialize")?;

    if cli.submit {
        handle_submit(&ctx, cli.max_chars)?;
    } else if let Some(job_id) = cli.status {
        handle_status(&ctx, &job_id)?;
    } else if cli.worker {
        run_worker(&ctx).await?;
    } else {
        handle_one_shot(&ctx, cli.max_chars).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("newsrake=info,warn"),
            1 => EnvFilter::new("newsrake=debug,info"),
            2 => EnvFilter::new("newsrake=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles --submit: enqueue a crawl job and print `{"job_id": ...}`
fn handle_submit(ctx: &AppContext, max_chars: Option<u64>) -> anyhow::Result<()> {
    let job_id = ctx
        .registry
        .dispatch(&ctx.tracker, TASK_CRAWL_ARTICLES, max_chars)?;
    println!("{}", serde_json::json!({ "job_id": job_id }));
    Ok(())
}

/// Handles --status: print the mapped response body
///
/// The process exits non-zero for 404 and 500 so scripts can poll without
/// parsing the body.
fn handle_status(ctx: &AppContext, job_id: &str) -> anyhow::Result<()> {
    let snapshot = ctx.tracker.status(job_id)?;
    let response = map_status(job_id, &snapshot);

    println!("{}", serde_json::to_string_pretty(&response)?);

    if response.code >= 400 {
        std::process::exit(1);
    }
    Ok(())
}

/// Handles the default mode: submit one job and run it to completion inline
async fn handle_one_shot(ctx: &AppContext, max_chars: Option<u64>) -> anyhow::Result<()> {
    let job_id = ctx
        .registry
        .dispatch(&ctx.tracker, TASK_CRAWL_ARTICLES, max_chars)?;
    tracing::info!("Running job {} inline", job_id);

    run_next_job(ctx)
        .await?
        .ok_or_else(|| anyhow::anyhow!("submitted job was not claimable"))?;

    let snapshot = ctx.tracker.status(&job_id)?;
    let response = map_status(&job_id, &snapshot);
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// Handles --dry-run: validate config and show what would run
fn handle_dry_run(config: &newsrake::config::Config) {
    println!("=== Newsrake Dry Run ===\n");

    println!("Broker:");
    println!("  Database: {}", config.broker.database_path);
    println!("  Retention: {}s", config.broker.retention_secs);
    println!("  Poll interval: {}ms", config.broker.poll_interval_ms);

    println!("\nCrawl:");
    println!("  Base URL: {}", config.crawl.base_url);
    println!("  Content selector: {}", config.crawl.content_selector);
    match config.crawl.budget_max_chars {
        Some(max) => println!("  Budget: {} chars ({:?} policy)", max, config.crawl.budget_policy),
        None => println!("  Budget: unlimited"),
    }
    println!("  Fetch timeout: {}s", config.crawl.fetch_timeout_secs);
    println!("  User agent: {}", config.crawl.user_agent);

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    match &config.output.site_label {
        Some(label) => println!("  Site label: {}", label),
        None => println!("  Site label: (derived from base URL)"),
    }

    println!("\n✓ Configuration is valid");
}

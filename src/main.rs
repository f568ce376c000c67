//! Discprice main entry point
//!
//! Command-line interface for the multi-store price crawler: run the HTTP
//! trigger server, crawl a single store in the foreground, or inspect the
//! registry and the recorded data.

use anyhow::Context;
use clap::{Parser, Subcommand};
use discprice::adapter::{builtin_stores, find_store};
use discprice::config::{load_config, Config};
use discprice::crawler::{build_http_client, Crawler, TracingObserver};
use discprice::storage::{open_storage, Storage};
use discprice::DiscPriceError;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Discprice: a multi-store disc golf price crawler
#[derive(Parser, Debug)]
#[command(name = "discprice")]
#[command(version)]
#[command(about = "Multi-store disc golf price crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP trigger server
    Serve,

    /// Crawl one store to completion in the foreground
    Crawl {
        /// Store slug, e.g. "prodisc"
        slug: String,

        /// Fetch and extract but persist no products or prices
        #[arg(long)]
        dry_run: bool,

        /// Stop after N entries per sitemap
        #[arg(long, value_name = "N")]
        max_count: Option<usize>,
    },

    /// List registered store adapters
    Stores,

    /// Show per-store crawl statistics from the database
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    match cli.command {
        Command::Serve => discprice::server::serve(&config).await?,
        Command::Crawl {
            slug,
            dry_run,
            max_count,
        } => handle_crawl(&config, &slug, dry_run, max_count).await?,
        Command::Stores => handle_stores(),
        Command::Stats => handle_stats(&config)?,
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("discprice=info,warn"),
            1 => EnvFilter::new("discprice=debug,info"),
            2 => EnvFilter::new("discprice=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Handles the crawl subcommand: one store, foreground, sequential
async fn handle_crawl(
    config: &Config,
    slug: &str,
    dry_run: bool,
    max_count: Option<usize>,
) -> anyhow::Result<()> {
    let mut adapter =
        find_store(slug).ok_or_else(|| DiscPriceError::UnknownStore(slug.to_string()))?;
    if max_count.is_some() {
        adapter.debug.max_count = max_count;
    }

    let storage = open_storage(Path::new(&config.database.path))?;
    let client = build_http_client(&config.http)?;

    let mut crawler = Crawler::new(
        adapter,
        Arc::new(Mutex::new(storage)),
        client,
        Arc::new(TracingObserver),
    )
    .with_dry_run(dry_run);

    let store = crawler.prepare().await?;
    tracing::info!(slug = %store.slug, sitemap_url = %store.sitemap_url, "store registered");

    let summary = crawler.run(store).await;
    println!(
        "{}: {} entries processed in {:.1?}{}",
        slug,
        summary.entries_processed,
        summary.elapsed,
        if dry_run { " (dry run)" } else { "" }
    );

    Ok(())
}

/// Handles the stores subcommand: prints the adapter registry
fn handle_stores() {
    println!("Registered stores:\n");
    for adapter in builtin_stores() {
        let sitemaps = match &adapter.sitemaps {
            Some(list) => format!("{} sitemaps", list.len()),
            None if adapter.sitemap_index.is_some() => "via sitemap index".to_string(),
            None => "1 sitemap".to_string(),
        };
        println!("  {:<16} {:<24} {}", adapter.slug, adapter.name, sitemaps);
    }
}

/// Handles the stats subcommand: per-store counts and last run status
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let storage = open_storage(Path::new(&config.database.path))?;

    println!("Database: {}\n", config.database.path);

    let stores = storage.list_stores()?;
    if stores.is_empty() {
        println!("No stores recorded yet.");
        return Ok(());
    }

    for store in stores {
        let products = storage.count_products(store.id)?;
        let observations = storage.count_observations(store.id)?;
        let last_run = match storage.latest_run(&store.slug)? {
            Some(run) => format!(
                "last run {} ({} entries)",
                run.status.to_db_string(),
                run.entries_processed
            ),
            None => "no runs".to_string(),
        };

        println!(
            "  {:<16} {:>6} products {:>8} observations   {}",
            store.slug, products, observations, last_run
        );
    }

    Ok(())
}

//! Sumi-Tide main entry point
//!
//! This is the command-line interface for the Sumi-Tide crawler.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use sumi_tide::config::{load_config, validate, Config};
use sumi_tide::crawler::{Crawler, HttpDownloader};
use sumi_tide::output::{log_statistics, write_downloaded, CrawlStatistics};
use tracing_subscriber::EnvFilter;

/// Sumi-Tide: a bounded-concurrency breadth-first site crawler
///
/// Downloads every page reachable from URL within DEPTH levels and prints
/// each downloaded address on its own line.
#[derive(Parser, Debug)]
#[command(name = "sumi-tide")]
#[command(version)]
#[command(about = "A bounded-concurrency breadth-first site crawler", long_about = None)]
struct Cli {
    /// Address to start crawling from
    #[arg(value_name = "URL")]
    url: String,

    /// Number of levels to visit, the start page being level 1 [default: 1]
    #[arg(value_name = "DEPTH")]
    depth: Option<u32>,

    /// Maximum number of simultaneous downloads [default: 1]
    #[arg(value_name = "DOWNLOADS")]
    downloads: Option<usize>,

    /// Maximum number of simultaneous link extractions [default: 1]
    #[arg(value_name = "EXTRACTORS")]
    extractors: Option<usize>,

    /// Maximum number of simultaneous downloads per host [default: 1]
    #[arg(value_name = "PER_HOST")]
    per_host: Option<usize>,

    /// Path to a TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Applies positional overrides on top of the loaded configuration
    fn apply(&self, config: &mut Config) {
        if let Some(depth) = self.depth {
            config.crawler.depth = depth;
        }
        if let Some(downloads) = self.downloads {
            config.crawler.downloaders = downloads;
        }
        if let Some(extractors) = self.extractors {
            config.crawler.extractors = extractors;
        }
        if let Some(per_host) = self.per_host {
            config.crawler.per_host = per_host;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("failed to load {}", path.display()))?
        }
        None => Config::default(),
    };
    cli.apply(&mut config);
    validate(&config).context("invalid crawler settings")?;

    let downloader = HttpDownloader::new(&config.user_agent, &config.http)?;
    let crawler = Arc::new(Crawler::new(Arc::new(downloader), &config.crawler)?);

    // Ctrl-C drains the pools; the crawl then returns what it has so far.
    {
        let crawler = Arc::clone(&crawler);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, shutting down");
                crawler.shutdown().await;
            }
        });
    }

    tracing::info!(
        "Crawling {} (depth {}, {} downloaders, {} extractors, {} per host)",
        cli.url,
        config.crawler.depth,
        config.crawler.downloaders,
        config.crawler.extractors,
        config.crawler.per_host
    );

    let result = crawler.crawl(&cli.url, config.crawler.depth).await;
    crawler.shutdown().await;
    let result = result.context("crawl failed")?;

    let stdout = std::io::stdout();
    write_downloaded(&result, &mut stdout.lock())?;

    let stats = CrawlStatistics::from_result(&result);
    log_statistics(&stats, &result);

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_tide=info,warn"),
            1 => EnvFilter::new("sumi_tide=debug,info"),
            2 => EnvFilter::new("sumi_tide=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

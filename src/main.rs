//! Targeted Crawler main entry point
//!
//! This is the command-line interface for the targeted crawler.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Read;
use std::path::{Path, PathBuf};
use targeted_crawler::config::{load_config_with_hash, Config};
use targeted_crawler::crawler::{parse_input, segment, Coordinator};
use targeted_crawler::output::print_summary;
use targeted_crawler::url::extract_domain;
use tracing_subscriber::EnvFilter;

/// Targeted Crawler: a polite fetch-and-extract pipeline
///
/// Fetches every URL in a list, respecting robots.txt and per-domain rate
/// limits, extracts one field from each page and appends `url<TAB>field`
/// lines to an output file.
#[derive(Parser, Debug)]
#[command(name = "targeted-crawler")]
#[command(version)]
#[command(about = "A polite concurrent fetch-and-extract pipeline", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// File with one URL per line, or `-` for stdin
    #[arg(value_name = "URLS")]
    urls: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and input and show the work split without crawling
    #[arg(long)]
    dry_run: bool,

    /// Override the number of fetch workers
    #[arg(long, value_name = "N")]
    fetch_workers: Option<usize>,

    /// Override the number of extraction workers
    #[arg(long, value_name = "N")]
    extraction_workers: Option<usize>,

    /// Override the output file
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    apply_overrides(&mut config, &cli);
    targeted_crawler::config::validate(&config).context("invalid command-line override")?;

    let input = read_input(&cli.urls)?;

    if cli.dry_run {
        handle_dry_run(&config, &input);
        return Ok(());
    }

    handle_crawl(config, config_hash, &input).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("targeted_crawler=info,warn"),
            1 => EnvFilter::new("targeted_crawler=debug,info"),
            2 => EnvFilter::new("targeted_crawler=trace,debug"),
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

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(n) = cli.fetch_workers {
        config.pipeline.fetch_workers = n;
    }
    if let Some(n) = cli.extraction_workers {
        config.pipeline.extraction_workers = n;
    }
    if let Some(path) = &cli.output {
        config.output.path = path.clone();
    }
}

/// Reads the URL list from a file, or stdin when the path is `-`
fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("failed to read URLs from stdin")?;
        Ok(input)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read URLs from {}", path.display()))
    }
}

/// Handles the --dry-run mode: validates input and shows how it would be split
fn handle_dry_run(config: &Config, input: &str) {
    println!("=== Targeted Crawler Dry Run ===\n");

    println!("Pipeline:");
    println!("  Fetch workers: {}", config.pipeline.fetch_workers);
    println!("  Extraction workers: {}", config.pipeline.extraction_workers);
    if config.pipeline.queue_capacity == 0 {
        println!("  Queue capacity: unbounded");
    } else {
        println!("  Queue capacity: {}", config.pipeline.queue_capacity);
    }
    println!("  Termination: {:?}", config.pipeline.termination);

    println!("\nTiming:");
    println!("  Rate limit delay: {}s", config.timing.rate_limit_delay);
    println!("  Fetch timeout: {}s", config.timing.fetch_timeout);
    println!(
        "  Extraction idle timeout: {}s",
        config.timing.extraction_idle_timeout
    );
    println!(
        "  Respect robots.txt Crawl-delay: {}",
        config.timing.respect_crawl_delay
    );

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nExtraction:");
    println!("  Selector: {}", config.extraction.selector);
    println!("  Sentinel: {}", config.extraction.sentinel);

    println!("\nOutput:");
    println!("  Records: {}", config.output.path.display());
    if let Some(report) = &config.output.report_path {
        println!("  Report: {}", report.display());
    }

    let parsed = parse_input(input);
    let segments = segment(&parsed.urls, config.pipeline.fetch_workers);

    println!(
        "\nInput: {} unique URLs ({} duplicates, {} invalid lines)",
        parsed.urls.len(),
        parsed.duplicates,
        parsed.invalid
    );
    for (id, urls) in segments.iter().enumerate() {
        println!("  Fetch worker {} ({} URLs):", id, urls.len());
        for url in urls {
            let domain = extract_domain(url).unwrap_or_default();
            println!("    * {} [{}]", url, domain);
        }
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would fetch {} URLs", parsed.urls.len());
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: String, input: &str) -> Result<()> {
    let output = config.output.path.clone();
    let coordinator = Coordinator::new(config)
        .context("failed to set up the crawl")?
        .with_config_hash(config_hash);

    match coordinator.run(input).await {
        Ok(summary) => {
            print_summary(&summary);
            tracing::info!("Crawl completed, records appended to {}", output.display());
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e).context("crawl aborted")
        }
    }
}
